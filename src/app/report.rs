use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::models::{
    CategoryTotal, DailyTotal, ExpenseAggregation, ExpenseReport, ReportPeriod,
};
use crate::storage::ExpenseStore;

/// `amount` as a percentage of `total`, unrounded. Zero when `total` is not
/// positive.
pub fn percentage_of(amount: Decimal, total: Decimal) -> Decimal {
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|scaled| scaled.checked_div(total))
        .unwrap_or(Decimal::ZERO)
}

/// Totals, counts and per-day / per-category breakdowns for the inclusive
/// range `[start, end]`.
///
/// An inverted range yields an empty aggregation without touching the store.
/// The four store reads are independent snapshots, so a write landing
/// between them can make the breakdowns disagree with the totals.
pub async fn aggregate_expenses(
    storage: &dyn ExpenseStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ExpenseAggregation> {
    if start > end {
        tracing::debug!(%start, %end, "Inverted report range; returning empty aggregation");
        return Ok(ExpenseAggregation::empty(start, end));
    }

    let daily = storage.daily_totals_by_date_range(start, end).await?;
    let categories = storage.category_totals_by_date_range(start, end).await?;
    let total_amount = storage.total_amount_by_date_range(start, end).await?;
    let total_count = storage.count_by_date_range(start, end).await?;

    let daily_totals = daily
        .into_iter()
        .map(|row| DailyTotal {
            date: row.date,
            amount: row.total,
            count: row.count,
        })
        .collect();

    let category_totals = categories
        .into_iter()
        .map(|row| CategoryTotal {
            category: row.category,
            amount: row.total,
            count: row.count,
            percentage: percentage_of(row.total, total_amount),
        })
        .collect();

    tracing::debug!(%start, %end, total_count, "Aggregated expenses");

    Ok(ExpenseAggregation {
        start_date: start,
        end_date: end,
        daily_totals,
        category_totals,
        total_amount,
        total_count,
    })
}

/// Stamps an aggregation with the period it was computed for.
pub fn assemble_report(period: ReportPeriod, aggregation: ExpenseAggregation) -> ExpenseReport {
    ExpenseReport {
        period,
        start_date: aggregation.start_date,
        end_date: aggregation.end_date,
        daily_totals: aggregation.daily_totals,
        category_totals: aggregation.category_totals,
        total_amount: aggregation.total_amount,
        total_count: aggregation.total_count,
    }
}

/// Report for `period`, with named periods anchored at the clock's today.
pub async fn expense_report(
    storage: &dyn ExpenseStore,
    clock: &dyn Clock,
    period: ReportPeriod,
) -> Result<ExpenseReport> {
    let (start, end) = period.date_range(clock.today());
    let aggregation = aggregate_expenses(storage, start, end).await?;
    Ok(assemble_report(period, aggregation))
}

/// Report for an explicit inclusive range.
pub async fn custom_report(
    storage: &dyn ExpenseStore,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<ExpenseReport> {
    let aggregation = aggregate_expenses(storage, start, end).await?;
    Ok(assemble_report(ReportPeriod::Custom { start, end }, aggregation))
}
