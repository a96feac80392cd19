use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::Clock;
use crate::storage::ExpenseStore;

/// Total spent and number of expenses on a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TodaySummary {
    pub date: NaiveDate,
    pub total_amount: Decimal,
    pub count: usize,
}

impl TodaySummary {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_amount: Decimal::ZERO,
            count: 0,
        }
    }
}

pub async fn today_summary(storage: &dyn ExpenseStore, clock: &dyn Clock) -> Result<TodaySummary> {
    let date = clock.today();
    let total_amount = storage.total_amount_by_date(date).await?;
    let count = storage.count_by_date(date).await?;
    Ok(TodaySummary {
        date,
        total_amount,
        count,
    })
}

/// Holds the last known summary for a dashboard-style display.
///
/// Refreshing never fails: a store error is logged and the previous values
/// stay in place.
#[derive(Debug, Clone)]
pub struct TodaySummaryTracker {
    current: TodaySummary,
}

impl TodaySummaryTracker {
    pub fn new(clock: &dyn Clock) -> Self {
        Self {
            current: TodaySummary::empty(clock.today()),
        }
    }

    pub fn current(&self) -> TodaySummary {
        self.current
    }

    pub async fn refresh(&mut self, storage: &dyn ExpenseStore, clock: &dyn Clock) -> TodaySummary {
        match today_summary(storage, clock).await {
            Ok(summary) => self.current = summary,
            Err(err) => {
                tracing::warn!(error = %err, "Failed to refresh today's summary; keeping previous values");
            }
        }
        self.current
    }
}
