mod json_file;
mod memory;
mod records;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use tokio::sync::watch;

use crate::models::{Expense, ExpenseCategory, ExpenseId};

/// Summed amount and count of one category within a date range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryAggregate {
    pub category: ExpenseCategory,
    pub total: Decimal,
    pub count: usize,
}

/// Summed amount and count of one calendar date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total: Decimal,
    pub count: usize,
}

/// Queryable collection of expense records.
///
/// Every list query returns records newest-first (by `created_at`, later
/// inserts first on ties). Date predicates compare the calendar date of
/// `created_at` and ranges are inclusive on both ends. Implementations must
/// apply each write atomically.
#[async_trait::async_trait]
pub trait ExpenseStore: Send + Sync {
    /// Persists `expense` and returns its id. An unsaved id gets the next
    /// free id; an explicit id replaces any record stored under it.
    async fn insert(&self, expense: &Expense) -> Result<ExpenseId>;
    /// Replaces the record with the same id. Returns false if there is none.
    async fn update(&self, expense: &Expense) -> Result<bool>;
    async fn delete(&self, id: ExpenseId) -> Result<bool>;
    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>>;
    async fn clear(&self) -> Result<()>;

    async fn list_all(&self) -> Result<Vec<Expense>>;
    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Expense>>;
    async fn list_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>>;
    async fn list_by_category(&self, category: ExpenseCategory) -> Result<Vec<Expense>>;
    async fn list_by_date_and_category(
        &self,
        date: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>>;
    async fn list_by_date_range_and_category(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>>;

    async fn total_amount_by_date(&self, date: NaiveDate) -> Result<Decimal>;
    async fn count_by_date(&self, date: NaiveDate) -> Result<usize>;
    async fn total_amount_by_date_range(&self, start: NaiveDate, end: NaiveDate)
        -> Result<Decimal>;
    async fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize>;

    /// Per-category sums, in the order each category is first seen scanning
    /// the range newest-first.
    async fn category_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryAggregate>>;
    /// Per-date sums, ascending by date. Dates without expenses are absent.
    async fn daily_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>>;

    /// Newest record with exactly this title, numerically equal amount and
    /// calendar date.
    async fn find_duplicate(
        &self,
        title: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<Option<Expense>>;

    /// Change notifications: the value is a revision counter bumped after
    /// every successful write.
    fn subscribe(&self) -> watch::Receiver<u64>;
}
