use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::{watch, MappedMutexGuard, Mutex, MutexGuard};

use crate::models::{Expense, ExpenseCategory, ExpenseId};

use super::records::ExpenseRecords;
use super::{CategoryAggregate, DailyAggregate, ExpenseStore};

/// Whether `file` is empty or its last byte is a newline.
async fn ends_with_newline(file: &mut fs::File) -> Result<bool> {
    let len = file
        .metadata()
        .await
        .context("Failed to stat expense journal")?
        .len();
    if len == 0 {
        return Ok(true);
    }
    file.seek(std::io::SeekFrom::End(-1))
        .await
        .context("Failed to seek expense journal")?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)
        .await
        .context("Failed to read expense journal")?;
    Ok(last[0] == b'\n')
}

/// One line of the expense journal.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum JournalEntry {
    Upsert { expense: Expense },
    Delete { id: ExpenseId },
    Clear,
}

/// JSON-lines file storage.
///
/// Directory structure:
/// ```text
/// data/
///   expenses.jsonl
/// ```
///
/// The journal is append-only; replaying it in order (last write wins per id)
/// yields the current record set. It is replayed once, on first access, and
/// kept in memory afterwards.
pub struct JsonFileStorage {
    base_path: PathBuf,
    records: Mutex<Option<ExpenseRecords>>,
    revision: watch::Sender<u64>,
}

impl JsonFileStorage {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            base_path: base_path.as_ref().to_path_buf(),
            records: Mutex::new(None),
            revision,
        }
    }

    pub fn journal_file(&self) -> PathBuf {
        self.base_path.join("expenses.jsonl")
    }

    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create directory")?;
        }
        Ok(())
    }

    async fn read_journal(&self, path: &Path) -> Result<Vec<JournalEntry>> {
        let file = match fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e).context("Failed to open expense journal"),
        };

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut entries = Vec::new();
        let mut line_no = 0usize;

        while let Some(line) = lines.next_line().await.context("Failed to read line")? {
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEntry>(&line) {
                Ok(entry) => entries.push(entry),
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        line = line_no,
                        error = %err,
                        "Skipping unreadable journal entry"
                    );
                }
            }
        }

        Ok(entries)
    }

    async fn append_journal(&self, entry: &JournalEntry) -> Result<()> {
        let path = self.journal_file();
        self.ensure_dir(&path).await?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)
            .await
            .context("Failed to open expense journal for append")?;

        let mut line = String::new();
        // A torn final line must not swallow the next entry.
        if !ends_with_newline(&mut file).await? {
            line.push('\n');
        }
        line.push_str(&serde_json::to_string(entry).context("Failed to serialize entry")?);
        line.push('\n');
        file.write_all(line.as_bytes())
            .await
            .context("Failed to append to expense journal")?;
        file.flush().await?;
        Ok(())
    }

    async fn replay(&self) -> Result<ExpenseRecords> {
        let mut records = ExpenseRecords::default();
        for entry in self.read_journal(&self.journal_file()).await? {
            match entry {
                JournalEntry::Upsert { expense } => {
                    records.upsert(expense)?;
                }
                JournalEntry::Delete { id } => {
                    records.remove(id);
                }
                JournalEntry::Clear => records.clear(),
            }
        }
        tracing::debug!(records = records.len(), "Replayed expense journal");
        Ok(records)
    }

    /// Locks the record set, replaying the journal on first use.
    async fn records(&self) -> Result<MappedMutexGuard<'_, ExpenseRecords>> {
        let mut guard = self.records.lock().await;
        if guard.is_none() {
            *guard = Some(self.replay().await?);
        }
        Ok(MutexGuard::map(guard, |slot| {
            slot.get_or_insert_with(ExpenseRecords::default)
        }))
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[async_trait::async_trait]
impl ExpenseStore for JsonFileStorage {
    async fn insert(&self, expense: &Expense) -> Result<ExpenseId> {
        let mut records = self.records().await?;
        let mut expense = expense.clone();
        if expense.id.is_unsaved() {
            expense.id = records.next_id()?;
        }
        self.append_journal(&JournalEntry::Upsert {
            expense: expense.clone(),
        })
        .await?;
        let id = records.upsert(expense)?.id;
        drop(records);
        self.notify();
        Ok(id)
    }

    async fn update(&self, expense: &Expense) -> Result<bool> {
        let mut records = self.records().await?;
        if expense.id.is_unsaved() || !records.contains(expense.id) {
            return Ok(false);
        }
        self.append_journal(&JournalEntry::Upsert {
            expense: expense.clone(),
        })
        .await?;
        records.upsert(expense.clone())?;
        drop(records);
        self.notify();
        Ok(true)
    }

    async fn delete(&self, id: ExpenseId) -> Result<bool> {
        let mut records = self.records().await?;
        if !records.contains(id) {
            return Ok(false);
        }
        self.append_journal(&JournalEntry::Delete { id }).await?;
        records.remove(id);
        drop(records);
        self.notify();
        Ok(true)
    }

    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>> {
        Ok(self.records().await?.get(id))
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records().await?;
        self.append_journal(&JournalEntry::Clear).await?;
        records.clear();
        drop(records);
        self.notify();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Expense>> {
        Ok(self.records().await?.select(|_| true))
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Expense>> {
        Ok(self.records().await?.select_range(date, date))
    }

    async fn list_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>> {
        Ok(self.records().await?.select_range(start, end))
    }

    async fn list_by_category(&self, category: ExpenseCategory) -> Result<Vec<Expense>> {
        Ok(self.records().await?.select(|e| e.category == category))
    }

    async fn list_by_date_and_category(
        &self,
        date: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>> {
        self.list_by_date_range_and_category(date, date, category)
            .await
    }

    async fn list_by_date_range_and_category(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>> {
        Ok(self.records().await?.select(|e| {
            let date = e.date();
            e.category == category && start <= date && date <= end
        }))
    }

    async fn total_amount_by_date(&self, date: NaiveDate) -> Result<Decimal> {
        self.records().await?.total(date, date)
    }

    async fn count_by_date(&self, date: NaiveDate) -> Result<usize> {
        Ok(self.records().await?.count(date, date))
    }

    async fn total_amount_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        self.records().await?.total(start, end)
    }

    async fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        Ok(self.records().await?.count(start, end))
    }

    async fn category_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryAggregate>> {
        self.records().await?.category_totals(start, end)
    }

    async fn daily_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        self.records().await?.daily_totals(start, end)
    }

    async fn find_duplicate(
        &self,
        title: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<Option<Expense>> {
        Ok(self.records().await?.find_duplicate(title, amount, date))
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
