mod config;
mod error;
mod export;
mod list;
mod mutations;
mod report;
mod summary;
mod types;

pub use config::config_output;
pub use error::{ExpenseError, ValidationError};
pub use export::{
    export_csv, export_file_name, export_report, export_text, ExportFormat,
};
pub use list::{
    expenses_by_date, filter_expenses, group_expenses, select_expenses, today_expenses,
    watch_expenses, ExpenseGroup, GroupKey, GroupedExpenses,
};
pub use mutations::{
    add_expense, add_expense_draft, delete_expense, delete_expense_value, get_expense,
    parse_amount, update_expense, validate_expense, ExpenseDraft,
};
pub use report::{
    aggregate_expenses, assemble_report, custom_report, expense_report, percentage_of,
};
pub use summary::{today_summary, TodaySummary, TodaySummaryTracker};
pub use types::{
    CategoryTotalOutput, DailyTotalOutput, ExpenseGroupOutput, ExpenseOutput, ListOutput,
    ReportOutput, TodayOutput,
};
