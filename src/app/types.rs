use anyhow::Result;
use serde::Serialize;

use crate::config::DisplayConfig;
use crate::format::{format_amount, format_amount_value, format_percentage};
use crate::models::{Expense, ExpenseReport, GroupBy, ReportPeriod};

use super::list::{ExpenseGroup, GroupKey, GroupedExpenses};
use super::summary::TodaySummary;

/// JSON output for a single expense
#[derive(Debug, Serialize)]
pub struct ExpenseOutput {
    pub id: u64,
    pub title: String,
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_display: Option<String>,
    pub category: String,
    pub date: String,
    pub created_at: String,
    pub updated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt_image: Option<String>,
}

/// `*_display` fields are only filled in when a symbol or grouping is
/// configured; otherwise the canonical value is already the display form.
fn display_amount(value: rust_decimal::Decimal, display: &DisplayConfig) -> Option<String> {
    (display.currency_symbol.is_some() || display.currency_grouping)
        .then(|| format_amount(value, display))
}

impl ExpenseOutput {
    pub fn new(expense: &Expense, display: &DisplayConfig) -> Self {
        Self {
            id: expense.id.get(),
            title: expense.title.clone(),
            amount: format_amount_value(expense.amount, display.currency_decimals),
            amount_display: display_amount(expense.amount, display),
            category: expense.category.display_name().to_string(),
            date: expense.date().format("%Y-%m-%d").to_string(),
            created_at: expense.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            updated_at: expense.updated_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            notes: expense.notes.clone(),
            receipt_image: expense.receipt_image.clone(),
        }
    }
}

/// JSON output for one group in `list`
#[derive(Debug, Serialize)]
pub struct ExpenseGroupOutput {
    pub key: GroupKey,
    pub label: String,
    pub total_amount: String,
    pub count: usize,
    pub expenses: Vec<ExpenseOutput>,
}

impl ExpenseGroupOutput {
    pub fn new(group: &ExpenseGroup, display: &DisplayConfig) -> Result<Self> {
        Ok(Self {
            key: group.key,
            label: group.label.clone(),
            total_amount: format_amount_value(group.total_amount()?, display.currency_decimals),
            count: group.expenses.len(),
            expenses: group
                .expenses
                .iter()
                .map(|e| ExpenseOutput::new(e, display))
                .collect(),
        })
    }
}

/// JSON output for `list`
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub group_by: GroupBy,
    pub total_amount: String,
    pub total_count: usize,
    pub groups: Vec<ExpenseGroupOutput>,
}

impl ListOutput {
    pub fn new(grouped: &GroupedExpenses, display: &DisplayConfig) -> Result<Self> {
        Ok(Self {
            group_by: grouped.group_by,
            total_amount: format_amount_value(grouped.total_amount()?, display.currency_decimals),
            total_count: grouped.total_count(),
            groups: grouped
                .groups
                .iter()
                .map(|g| ExpenseGroupOutput::new(g, display))
                .collect::<Result<_>>()?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct DailyTotalOutput {
    pub date: String,
    pub amount: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct CategoryTotalOutput {
    pub category: String,
    pub amount: String,
    pub count: usize,
    /// Unrounded, as a decimal string.
    pub percentage: String,
    pub percentage_display: String,
}

/// JSON output for `report`
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub period: ReportPeriod,
    pub start_date: String,
    pub end_date: String,
    pub total_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount_display: Option<String>,
    pub total_count: usize,
    pub category_totals: Vec<CategoryTotalOutput>,
    pub daily_totals: Vec<DailyTotalOutput>,
}

impl ReportOutput {
    pub fn new(report: &ExpenseReport, display: &DisplayConfig) -> Self {
        let dp = display.currency_decimals;
        Self {
            period: report.period,
            start_date: report.start_date.format("%Y-%m-%d").to_string(),
            end_date: report.end_date.format("%Y-%m-%d").to_string(),
            total_amount: format_amount_value(report.total_amount, dp),
            total_amount_display: display_amount(report.total_amount, display),
            total_count: report.total_count,
            category_totals: report
                .category_totals
                .iter()
                .map(|c| CategoryTotalOutput {
                    category: c.category.display_name().to_string(),
                    amount: format_amount_value(c.amount, dp),
                    count: c.count,
                    percentage: c.percentage.normalize().to_string(),
                    percentage_display: format_percentage(c.percentage),
                })
                .collect(),
            daily_totals: report
                .daily_totals
                .iter()
                .map(|d| DailyTotalOutput {
                    date: d.date.format("%Y-%m-%d").to_string(),
                    amount: format_amount_value(d.amount, dp),
                    count: d.count,
                })
                .collect(),
        }
    }
}

/// JSON output for `today`
#[derive(Debug, Serialize)]
pub struct TodayOutput {
    pub date: String,
    pub total_amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_amount_display: Option<String>,
    pub count: usize,
}

impl TodayOutput {
    pub fn new(summary: &TodaySummary, display: &DisplayConfig) -> Self {
        Self {
            date: summary.date.format("%Y-%m-%d").to_string(),
            total_amount: format_amount_value(summary.total_amount, display.currency_decimals),
            total_amount_display: display_amount(summary.total_amount, display),
            count: summary.count,
        }
    }
}
