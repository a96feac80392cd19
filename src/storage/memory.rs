//! In-memory storage implementation for testing and embedding.

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::{watch, Mutex};

use crate::models::{Expense, ExpenseCategory, ExpenseId};

use super::records::ExpenseRecords;
use super::{CategoryAggregate, DailyAggregate, ExpenseStore};

/// In-memory expense store.
pub struct MemoryStorage {
    records: Mutex<ExpenseRecords>,
    revision: watch::Sender<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            records: Mutex::new(ExpenseRecords::default()),
            revision,
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ExpenseStore for MemoryStorage {
    async fn insert(&self, expense: &Expense) -> Result<ExpenseId> {
        let stored = self.records.lock().await.upsert(expense.clone())?;
        self.notify();
        Ok(stored.id)
    }

    async fn update(&self, expense: &Expense) -> Result<bool> {
        let mut records = self.records.lock().await;
        if expense.id.is_unsaved() || !records.contains(expense.id) {
            return Ok(false);
        }
        records.upsert(expense.clone())?;
        drop(records);
        self.notify();
        Ok(true)
    }

    async fn delete(&self, id: ExpenseId) -> Result<bool> {
        let removed = self.records.lock().await.remove(id);
        if removed {
            self.notify();
        }
        Ok(removed)
    }

    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>> {
        Ok(self.records.lock().await.get(id))
    }

    async fn clear(&self) -> Result<()> {
        self.records.lock().await.clear();
        self.notify();
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Expense>> {
        Ok(self.records.lock().await.select(|_| true))
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Expense>> {
        Ok(self.records.lock().await.select_range(date, date))
    }

    async fn list_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>> {
        Ok(self.records.lock().await.select_range(start, end))
    }

    async fn list_by_category(&self, category: ExpenseCategory) -> Result<Vec<Expense>> {
        Ok(self
            .records
            .lock()
            .await
            .select(|e| e.category == category))
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
        Ok(self.records.lock().await.select(|e| {
            let date = e.date();
            e.category == category && start <= date && date <= end
        }))
    }

    async fn total_amount_by_date(&self, date: NaiveDate) -> Result<Decimal> {
        self.records.lock().await.total(date, date)
    }

    async fn count_by_date(&self, date: NaiveDate) -> Result<usize> {
        Ok(self.records.lock().await.count(date, date))
    }

    async fn total_amount_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        self.records.lock().await.total(start, end)
    }

    async fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        Ok(self.records.lock().await.count(start, end))
    }

    async fn category_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryAggregate>> {
        self.records.lock().await.category_totals(start, end)
    }

    async fn daily_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        self.records.lock().await.daily_totals(start, end)
    }

    async fn find_duplicate(
        &self,
        title: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<Option<Expense>> {
        Ok(self.records.lock().await.find_duplicate(title, amount, date))
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }
}
