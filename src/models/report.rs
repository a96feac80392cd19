use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ExpenseCategory;

/// The window a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportPeriod {
    Today,
    #[serde(rename = "last_7_days")]
    Last7Days,
    #[serde(rename = "last_30_days")]
    Last30Days,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl ReportPeriod {
    /// Inclusive date range of the period, with named periods ending on `today`.
    pub fn date_range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            ReportPeriod::Today => (today, today),
            ReportPeriod::Last7Days => (today - Duration::days(6), today),
            ReportPeriod::Last30Days => (today - Duration::days(29), today),
            ReportPeriod::Custom { start, end } => (start, end),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportPeriod::Today => "Today",
            ReportPeriod::Last7Days => "Last 7 Days",
            ReportPeriod::Last30Days => "Last 30 Days",
            ReportPeriod::Custom { .. } => "Custom",
        }
    }

    /// Short identifier used in export titles and file names.
    pub fn slug(self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Last7Days => "last_7_days",
            ReportPeriod::Last30Days => "last_30_days",
            ReportPeriod::Custom { .. } => "custom_period",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub amount: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub count: usize,
    /// Share of the report total in percent, unrounded.
    pub percentage: Decimal,
}

/// Aggregates over an inclusive date range, before a period is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseAggregation {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_totals: Vec<DailyTotal>,
    pub category_totals: Vec<CategoryTotal>,
    pub total_amount: Decimal,
    pub total_count: usize,
}

impl ExpenseAggregation {
    pub fn empty(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            daily_totals: Vec::new(),
            category_totals: Vec::new(),
            total_amount: Decimal::ZERO,
            total_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseReport {
    pub period: ReportPeriod,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_totals: Vec<DailyTotal>,
    pub category_totals: Vec<CategoryTotal>,
    pub total_amount: Decimal,
    pub total_count: usize,
}
