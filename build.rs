use std::path::{Path, PathBuf};
use std::process::Command;

fn main() {
    let commit = git(&["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT_HASH={commit}");

    if let Some(git_dir) = git(&["rev-parse", "--git-dir"]).map(PathBuf::from) {
        let git_dir = if git_dir.is_absolute() {
            git_dir
        } else {
            Path::new(&std::env::var("CARGO_MANIFEST_DIR").unwrap_or_default()).join(git_dir)
        };
        rerun_on_head_move(&git_dir);
    }
}

/// Trimmed stdout of a successful, non-empty git invocation.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn rerun_on_head_move(git_dir: &Path) {
    let head = git_dir.join("HEAD");
    println!("cargo:rerun-if-changed={}", head.display());

    // Worktrees keep refs in the shared common dir.
    let common_dir = std::fs::read_to_string(git_dir.join("commondir"))
        .ok()
        .map(|dir| git_dir.join(dir.trim()))
        .unwrap_or_else(|| git_dir.to_path_buf());
    println!(
        "cargo:rerun-if-changed={}",
        common_dir.join("packed-refs").display()
    );

    if let Some(reference) = std::fs::read_to_string(&head)
        .ok()
        .and_then(|contents| contents.trim().strip_prefix("ref: ").map(str::to_string))
    {
        println!(
            "cargo:rerun-if-changed={}",
            common_dir.join(reference).display()
        );
    }
}
