use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::format::{format_amount_display, format_amount_value, format_percentage};
use crate::models::{ExpenseReport, ReportPeriod};

const BANNER_WIDTH: usize = 50;
const RULE_WIDTH: usize = 20;
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Text,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Text => "txt",
        }
    }
}

/// Suggested file name, e.g. `expense_report_last_7_days.csv`.
pub fn export_file_name(period: ReportPeriod, format: ExportFormat) -> String {
    format!("expense_report_{}.{}", period.slug(), format.extension())
}

/// Writes one block of CSV rows. Rows may differ in width.
fn csv_block(rows: &[Vec<String>]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer
            .write_record(row)
            .context("Failed to write CSV record")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

fn row<const N: usize>(fields: [&str; N]) -> Vec<String> {
    fields.iter().map(|f| f.to_string()).collect()
}

/// Renders a report as sectioned CSV: a title block, then SUMMARY,
/// CATEGORY BREAKDOWN and DAILY TRENDS, separated by blank lines.
///
/// Amounts are written in canonical decimal form; percentages with one decimal
/// place.
pub fn export_csv(report: &ExpenseReport, generated_at: NaiveDateTime) -> Result<String> {
    let slug = report.period.slug();
    let header = csv_block(&[
        vec![format!("Expense Report - {slug}")],
        vec![format!(
            "Generated on: {}",
            generated_at.format(TIMESTAMP_FORMAT)
        )],
    ])?;

    let summary = csv_block(&[
        row(["SUMMARY"]),
        vec![
            "Total Amount".to_string(),
            format_amount_value(report.total_amount, None),
        ],
        vec![
            "Total Expenses".to_string(),
            report.total_count.to_string(),
        ],
    ])?;

    let mut categories = vec![
        row(["CATEGORY BREAKDOWN"]),
        row(["Category", "Amount", "Count", "Percentage"]),
    ];
    categories.extend(report.category_totals.iter().map(|total| {
        vec![
            total.category.display_name().to_string(),
            format_amount_value(total.amount, None),
            total.count.to_string(),
            format_percentage(total.percentage),
        ]
    }));
    let categories = csv_block(&categories)?;

    let mut daily = vec![row(["DAILY TRENDS"]), row(["Date", "Amount"])];
    daily.extend(report.daily_totals.iter().map(|total| {
        vec![
            total.date.format("%Y-%m-%d").to_string(),
            format_amount_value(total.amount, None),
        ]
    }));
    let daily = csv_block(&daily)?;

    Ok([header, summary, categories, daily].join("\n"))
}

/// Renders a report as a fixed-layout plain-text document.
///
/// Money is shown with two decimals behind `currency_symbol`.
pub fn export_text(
    report: &ExpenseReport,
    generated_at: NaiveDateTime,
    currency_symbol: &str,
) -> String {
    let money = |value| format_amount_display(value, Some(2), false, Some(currency_symbol), true);
    let banner = "=".repeat(BANNER_WIDTH);
    let rule = "-".repeat(RULE_WIDTH);

    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "{banner}");
    let _ = writeln!(out, "EXPENSE REPORT");
    let _ = writeln!(out, "Period: {}", report.period.slug());
    let _ = writeln!(out, "Generated: {}", generated_at.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out, "{banner}");
    let _ = writeln!(out);

    let _ = writeln!(out, "SUMMARY");
    let _ = writeln!(out, "{rule}");
    let _ = writeln!(out, "Total Amount: {}", money(report.total_amount));
    let _ = writeln!(out, "Total Expenses: {}", report.total_count);
    let _ = writeln!(out);

    let _ = writeln!(out, "CATEGORY BREAKDOWN");
    let _ = writeln!(out, "{rule}");
    for total in &report.category_totals {
        let _ = writeln!(out, "{}", total.category.label());
        let _ = writeln!(out, "  Amount: {}", money(total.amount));
        let _ = writeln!(out, "  Count: {}", total.count);
        let _ = writeln!(out, "  Percentage: {}", format_percentage(total.percentage));
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "DAILY TRENDS");
    let _ = writeln!(out, "{rule}");
    for total in &report.daily_totals {
        let _ = writeln!(
            out,
            "{}: {}",
            total.date.format("%b %d, %Y"),
            money(total.amount)
        );
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{banner}");
    out
}

pub fn export_report(
    report: &ExpenseReport,
    format: ExportFormat,
    generated_at: NaiveDateTime,
    currency_symbol: &str,
) -> Result<String> {
    match format {
        ExportFormat::Csv => export_csv(report, generated_at),
        ExportFormat::Text => Ok(export_text(report, generated_at, currency_symbol)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CategoryTotal, DailyTotal, ExpenseCategory};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn generated_at() -> NaiveDateTime {
        ymd(2024, 1, 10).and_hms_opt(9, 30, 5).unwrap()
    }

    fn sample_report() -> ExpenseReport {
        ExpenseReport {
            period: ReportPeriod::Last7Days,
            start_date: ymd(2024, 1, 4),
            end_date: ymd(2024, 1, 10),
            daily_totals: vec![
                DailyTotal {
                    date: ymd(2024, 1, 4),
                    amount: Decimal::new(1005, 1),
                    count: 1,
                },
                DailyTotal {
                    date: ymd(2024, 1, 9),
                    amount: Decimal::from(250),
                    count: 2,
                },
            ],
            category_totals: vec![CategoryTotal {
                category: ExpenseCategory::Food,
                amount: Decimal::new(3505, 1),
                count: 3,
                percentage: Decimal::ONE_HUNDRED,
            }],
            total_amount: Decimal::new(3505, 1),
            total_count: 3,
        }
    }

    #[test]
    fn file_names_use_period_slug() {
        assert_eq!(
            export_file_name(ReportPeriod::Today, ExportFormat::Csv),
            "expense_report_today.csv"
        );
        let custom = ReportPeriod::Custom {
            start: ymd(2024, 1, 1),
            end: ymd(2024, 1, 2),
        };
        assert_eq!(
            export_file_name(custom, ExportFormat::Text),
            "expense_report_custom_period.txt"
        );
    }

    #[test]
    fn csv_layout_has_three_sections() -> Result<()> {
        let csv = export_csv(&sample_report(), generated_at())?;
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "Expense Report - last_7_days",
                "Generated on: 2024-01-10 09:30:05",
                "",
                "SUMMARY",
                "Total Amount,350.5",
                "Total Expenses,3",
                "",
                "CATEGORY BREAKDOWN",
                "Category,Amount,Count,Percentage",
                "Food,350.5,3,100.0%",
                "",
                "DAILY TRENDS",
                "Date,Amount",
                "2024-01-04,100.5",
                "2024-01-09,250",
            ]
        );
        Ok(())
    }

    #[test]
    fn text_layout_uses_symbol_and_two_decimals() {
        let text = export_text(&sample_report(), generated_at(), "₹");
        assert!(text.starts_with(&format!("{}\nEXPENSE REPORT\n", "=".repeat(50))));
        assert!(text.contains("Period: last_7_days\n"));
        assert!(text.contains(&format!("SUMMARY\n{}\n", "-".repeat(20))));
        assert!(text.contains("Total Amount: ₹350.50\n"));
        assert!(text.contains("🍽️ Food\n  Amount: ₹350.50\n  Count: 3\n  Percentage: 100.0%\n"));
        assert!(text.contains("Jan 04, 2024: ₹100.50\n"));
        assert!(text.contains("Jan 09, 2024: ₹250.00\n"));
        assert!(text.ends_with(&format!("{}\n", "=".repeat(50))));
    }
}
