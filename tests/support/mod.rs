#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use expensebook::clock::FixedClock;
use expensebook::models::{Expense, ExpenseCategory, ExpenseId};
use expensebook::storage::{CategoryAggregate, DailyAggregate, ExpenseStore, MemoryStorage};
use rust_decimal::Decimal;
use tokio::sync::watch;

pub fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
}

/// An expense entered at noon on `date`.
pub fn expense_on(date: NaiveDate, title: &str, amount: i64, category: ExpenseCategory) -> Expense {
    Expense::new_with_clock(&FixedClock::at_date(date), title, Decimal::from(amount), category)
}

/// Memory-backed store that can be switched into a failing state.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStorage,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ExpenseStore for FlakyStore {
    async fn insert(&self, expense: &Expense) -> Result<ExpenseId> {
        self.check()?;
        self.inner.insert(expense).await
    }

    async fn update(&self, expense: &Expense) -> Result<bool> {
        self.check()?;
        self.inner.update(expense).await
    }

    async fn delete(&self, id: ExpenseId) -> Result<bool> {
        self.check()?;
        self.inner.delete(id).await
    }

    async fn get(&self, id: ExpenseId) -> Result<Option<Expense>> {
        self.check()?;
        self.inner.get(id).await
    }

    async fn clear(&self) -> Result<()> {
        self.check()?;
        self.inner.clear().await
    }

    async fn list_all(&self) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner.list_all().await
    }

    async fn list_by_date(&self, date: NaiveDate) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner.list_by_date(date).await
    }

    async fn list_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner.list_by_date_range(start, end).await
    }

    async fn list_by_category(&self, category: ExpenseCategory) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner.list_by_category(category).await
    }

    async fn list_by_date_and_category(
        &self,
        date: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner.list_by_date_and_category(date, category).await
    }

    async fn list_by_date_range_and_category(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        category: ExpenseCategory,
    ) -> Result<Vec<Expense>> {
        self.check()?;
        self.inner
            .list_by_date_range_and_category(start, end, category)
            .await
    }

    async fn total_amount_by_date(&self, date: NaiveDate) -> Result<Decimal> {
        self.check()?;
        self.inner.total_amount_by_date(date).await
    }

    async fn count_by_date(&self, date: NaiveDate) -> Result<usize> {
        self.check()?;
        self.inner.count_by_date(date).await
    }

    async fn total_amount_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        self.check()?;
        self.inner.total_amount_by_date_range(start, end).await
    }

    async fn count_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<usize> {
        self.check()?;
        self.inner.count_by_date_range(start, end).await
    }

    async fn category_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryAggregate>> {
        self.check()?;
        self.inner.category_totals_by_date_range(start, end).await
    }

    async fn daily_totals_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        self.check()?;
        self.inner.daily_totals_by_date_range(start, end).await
    }

    async fn find_duplicate(
        &self,
        title: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Result<Option<Expense>> {
        self.check()?;
        self.inner.find_duplicate(title, amount, date).await
    }

    fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.subscribe()
    }
}
