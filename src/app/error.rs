use crate::models::ExpenseId;

/// Rule violations in a candidate expense. The messages are user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title cannot be empty")]
    BlankTitle,
    #[error("Amount must be greater than 0")]
    NonPositiveAmount,
    #[error("Please enter a valid amount")]
    InvalidAmount,
    #[error("Date cannot be in the future")]
    FutureDate,
}

/// Failure of an expense write.
#[derive(Debug, thiserror::Error)]
pub enum ExpenseError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Duplicate expense found")]
    Duplicate,
    #[error("Expense not found: {0}")]
    NotFound(ExpenseId),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl ExpenseError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ExpenseError::Validation(_))
    }
}
