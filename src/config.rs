use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock, ZonedClock};

/// Display/output formatting configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// If set, amounts are rounded to this many decimal places when rendered.
    ///
    /// Presentation only; stored amounts and totals are never rounded.
    pub currency_decimals: Option<u32>,

    /// Render amounts with thousands separators.
    pub currency_grouping: bool,

    /// Optional currency symbol (e.g. "$", "₹") prefixed to rendered amounts.
    pub currency_symbol: Option<String>,

    /// When true and `currency_decimals` is set, always show exactly that many
    /// decimal places.
    pub currency_fixed_decimals: bool,
}

impl DisplayConfig {
    pub fn symbol(&self) -> &str {
        self.currency_symbol.as_deref().unwrap_or("$")
    }
}

/// Which wall clock decides "today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZoneSetting {
    Local,
    Named(Tz),
}

impl TimeZoneSetting {
    /// Accepts an IANA name, `UTC`, or `local` (also the default when unset).
    pub fn parse(value: Option<&str>) -> Result<Self> {
        let Some(value) = value else {
            return Ok(TimeZoneSetting::Local);
        };
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("local") {
            return Ok(TimeZoneSetting::Local);
        }
        if trimmed.eq_ignore_ascii_case("utc") {
            return Ok(TimeZoneSetting::Named(chrono_tz::UTC));
        }
        let tz: Tz = trimmed.parse().with_context(|| {
            format!("Invalid timezone '{trimmed}' (expected IANA name, e.g. Asia/Kolkata)")
        })?;
        Ok(TimeZoneSetting::Named(tz))
    }

    pub fn name(&self) -> String {
        match self {
            TimeZoneSetting::Local => "local".to_string(),
            TimeZoneSetting::Named(tz) => tz.name().to_string(),
        }
    }

    pub fn clock(&self) -> Box<dyn Clock> {
        match self {
            TimeZoneSetting::Local => Box::new(SystemClock),
            TimeZoneSetting::Named(tz) => Box::new(ZonedClock::new(*tz)),
        }
    }
}

/// Application configuration as written in `expensebook.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    /// IANA timezone name or "local".
    pub timezone: Option<String>,

    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load config from a file, or return default config if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Resolve the data directory path.
    ///
    /// A relative `data_dir` is joined onto `config_dir`; an unset one is
    /// `config_dir` itself.
    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Loaded configuration with resolved paths and a parsed timezone.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub timezone: TimeZoneSetting,
    pub display: DisplayConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./expensebook.toml` if it exists in current directory
/// 2. `~/.local/share/expensebook/expensebook.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("expensebook.toml");
    if local_config.exists() {
        return local_config;
    }

    match dirs::data_dir() {
        Some(data_dir) => data_dir.join("expensebook").join("expensebook.toml"),
        None => local_config,
    }
}

impl ResolvedConfig {
    fn from_config(config: Config, config_dir: &Path) -> Result<Self> {
        Ok(Self {
            data_dir: config.resolve_data_dir(config_dir),
            timezone: TimeZoneSetting::parse(config.timezone.as_deref())?,
            display: config.display,
        })
    }

    /// Load and resolve config from a file path.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        Self::from_config(Config::load(&config_path)?, config_dir)
    }

    /// Load config, falling back to defaults when the file doesn't exist.
    ///
    /// Without a file, the directory it would live in becomes the data
    /// directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };
        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Self::from_config(Config::default(), config_dir)
    }

    pub fn clock(&self) -> Box<dyn Clock> {
        self.timezone.clock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_default_data_dir_is_config_dir() {
        let config = Config::default();
        let config_dir = Path::new("/home/user/expenses");
        assert_eq!(
            config.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/expenses")
        );
    }

    #[test]
    fn test_relative_and_absolute_data_dir() {
        let config_dir = Path::new("/home/user/expenses");
        let relative = Config {
            data_dir: Some(PathBuf::from("data")),
            ..Default::default()
        };
        assert_eq!(
            relative.resolve_data_dir(config_dir),
            PathBuf::from("/home/user/expenses/data")
        );

        let absolute = Config {
            data_dir: Some(PathBuf::from("/var/expensebook")),
            ..Default::default()
        };
        assert_eq!(
            absolute.resolve_data_dir(config_dir),
            PathBuf::from("/var/expensebook")
        );
    }

    #[test]
    fn test_load_empty_config() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        std::fs::File::create(&config_path)?;

        let config = Config::load(&config_path)?;
        assert_eq!(config.data_dir, None);
        assert_eq!(config.timezone, None);
        assert_eq!(config.display, DisplayConfig::default());
        Ok(())
    }

    #[test]
    fn test_load_timezone_and_display() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");

        let mut file = std::fs::File::create(&config_path)?;
        writeln!(file, "timezone = \"Asia/Kolkata\"")?;
        writeln!(file, "[display]")?;
        writeln!(file, "currency_decimals = 2")?;
        writeln!(file, "currency_symbol = \"₹\"")?;
        writeln!(file, "currency_fixed_decimals = true")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        assert_eq!(
            resolved.timezone,
            TimeZoneSetting::Named(chrono_tz::Asia::Kolkata)
        );
        assert_eq!(resolved.display.currency_decimals, Some(2));
        assert_eq!(resolved.display.symbol(), "₹");
        assert!(!resolved.display.currency_grouping);
        Ok(())
    }

    #[test]
    fn test_invalid_timezone_is_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        std::fs::write(&config_path, "timezone = \"Mars/Olympus\"\n")?;

        let err = ResolvedConfig::load(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid timezone"));
        Ok(())
    }

    #[test]
    fn test_timezone_parse_variants() -> Result<()> {
        assert_eq!(TimeZoneSetting::parse(None)?, TimeZoneSetting::Local);
        assert_eq!(TimeZoneSetting::parse(Some(" Local "))?, TimeZoneSetting::Local);
        assert_eq!(
            TimeZoneSetting::parse(Some("utc"))?,
            TimeZoneSetting::Named(chrono_tz::UTC)
        );
        assert_eq!(TimeZoneSetting::Named(chrono_tz::UTC).name(), "UTC");
        Ok(())
    }

    #[test]
    fn test_resolved_config_load_or_default_missing_file() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");

        let resolved = ResolvedConfig::load_or_default(&config_path)?;
        assert_eq!(resolved.data_dir, dir.path());
        assert_eq!(resolved.timezone, TimeZoneSetting::Local);
        assert_eq!(resolved.display.symbol(), "$");
        Ok(())
    }

    #[test]
    fn test_resolved_config_resolves_relative_data_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let config_path = dir.path().join("expensebook.toml");
        std::fs::write(&config_path, "data_dir = \"./data\"\n")?;

        let resolved = ResolvedConfig::load(&config_path)?;
        assert_eq!(resolved.data_dir, dir.path().canonicalize()?.join("data"));
        Ok(())
    }
}
