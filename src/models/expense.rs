use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};

use super::{ExpenseCategory, ExpenseId};

/// A single recorded expense.
///
/// `created_at` is local wall-clock time; its calendar date is the date the
/// expense counts towards in filters and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default)]
    pub id: ExpenseId,
    pub title: String,
    pub amount: Decimal,
    pub category: ExpenseCategory,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Opaque path or URI of an attached receipt image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Expense {
    pub fn new(title: impl Into<String>, amount: Decimal, category: ExpenseCategory) -> Self {
        Self::new_with_clock(&SystemClock, title, amount, category)
    }

    pub fn new_with_clock(
        clock: &dyn Clock,
        title: impl Into<String>,
        amount: Decimal,
        category: ExpenseCategory,
    ) -> Self {
        let now = clock.now();
        Self {
            id: ExpenseId::UNSAVED,
            title: title.into(),
            amount,
            category,
            notes: None,
            receipt_image: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Calendar date the expense counts towards.
    pub fn date(&self) -> NaiveDate {
        self.created_at.date()
    }

    pub fn with_id(mut self, id: ExpenseId) -> Self {
        self.id = id;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        let notes = notes.into();
        self.notes = if notes.trim().is_empty() {
            None
        } else {
            Some(notes)
        };
        self
    }

    pub fn with_receipt_image(mut self, reference: impl Into<String>) -> Self {
        self.receipt_image = Some(reference.into());
        self
    }

    /// Sets both timestamps, as a freshly entered expense has them equal.
    pub fn with_created_at(mut self, created_at: NaiveDateTime) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    /// Moves the expense to `date`, keeping its time of day.
    pub fn with_date(self, date: NaiveDate) -> Self {
        let time = self.created_at.time();
        self.with_created_at(date.and_time(time))
    }
}

/// Adds `amount` to a running total, failing instead of overflowing.
pub fn add_amount(total: Decimal, amount: Decimal) -> Result<Decimal> {
    total
        .checked_add(amount)
        .context("Amount total overflowed")
}

/// Exact sum of `amounts`.
pub fn sum_amounts(amounts: impl IntoIterator<Item = Decimal>) -> Result<Decimal> {
    amounts.into_iter().try_fold(Decimal::ZERO, add_amount)
}
