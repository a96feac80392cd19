mod category;
mod expense;
mod filter;
mod id;
mod report;

pub use category::{CategoryParseError, ExpenseCategory};
pub use expense::{add_amount, sum_amounts, Expense};
pub use filter::{ExpenseFilter, GroupBy};
pub use id::{ExpenseId, IdError};
pub use report::{
    CategoryTotal, DailyTotal, ExpenseAggregation, ExpenseReport, ReportPeriod,
};
