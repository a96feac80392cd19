use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::clock::Clock;
use crate::models::{Expense, ExpenseCategory, ExpenseId};
use crate::storage::ExpenseStore;

use super::error::{ExpenseError, ValidationError};

/// Raw user input for a new expense, as typed into a form or CLI.
#[derive(Debug, Clone)]
pub struct ExpenseDraft {
    pub title: String,
    pub amount: String,
    pub category: ExpenseCategory,
    pub notes: Option<String>,
    pub receipt_image: Option<String>,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

impl ExpenseDraft {
    pub fn new(title: impl Into<String>, amount: impl Into<String>, category: ExpenseCategory) -> Self {
        Self {
            title: title.into(),
            amount: amount.into(),
            category,
            notes: None,
            receipt_image: None,
            date: None,
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_receipt_image(mut self, reference: impl Into<String>) -> Self {
        self.receipt_image = Some(reference.into());
        self
    }

    /// Builds the expense: the title is trimmed, the amount parsed, and the
    /// timestamp is the chosen date at the current time of day.
    pub fn into_expense(self, clock: &dyn Clock) -> Result<Expense, ValidationError> {
        let amount = parse_amount(&self.amount)?;
        let now = clock.now();
        let created_at = self.date.unwrap_or(now.date()).and_time(now.time());

        let mut expense = Expense::new_with_clock(clock, self.title.trim(), amount, self.category)
            .with_created_at(created_at);
        if let Some(notes) = self.notes {
            expense = expense.with_notes(notes);
        }
        if let Some(reference) = self.receipt_image {
            expense = expense.with_receipt_image(reference);
        }
        Ok(expense)
    }
}

/// Parses a user-entered amount. Sign is preserved; positivity is checked by
/// [`validate_expense`].
pub fn parse_amount(input: &str) -> Result<Decimal, ValidationError> {
    Decimal::from_str(input.trim()).map_err(|_| ValidationError::InvalidAmount)
}

/// Checks the expense invariants, reporting the first violation in the
/// order title, amount, date.
pub fn validate_expense(expense: &Expense, today: NaiveDate) -> Result<(), ValidationError> {
    if expense.title.trim().is_empty() {
        return Err(ValidationError::BlankTitle);
    }
    if expense.amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }
    if expense.date() > today {
        return Err(ValidationError::FutureDate);
    }
    Ok(())
}

/// Validates `expense`, rejects duplicates and inserts it as a new record.
///
/// A duplicate is a stored expense with the same title, the same amount and
/// the same calendar date. The store is written at most once, and only after
/// every check has passed.
pub async fn add_expense(
    storage: &dyn ExpenseStore,
    clock: &dyn Clock,
    expense: &Expense,
) -> Result<ExpenseId, ExpenseError> {
    validate_expense(expense, clock.today())?;

    if let Some(existing) = storage
        .find_duplicate(&expense.title, expense.amount, expense.date())
        .await?
    {
        tracing::debug!(existing = %existing.id, title = %expense.title, "Rejected duplicate expense");
        return Err(ExpenseError::Duplicate);
    }

    let new_record = expense.clone().with_id(ExpenseId::UNSAVED);
    let id = storage.insert(&new_record).await?;
    tracing::info!(id = %id, amount = %expense.amount, category = %expense.category, "Added expense");
    Ok(id)
}

/// Parses and adds a draft in one step.
pub async fn add_expense_draft(
    storage: &dyn ExpenseStore,
    clock: &dyn Clock,
    draft: ExpenseDraft,
) -> Result<ExpenseId, ExpenseError> {
    let expense = draft.into_expense(clock)?;
    add_expense(storage, clock, &expense).await
}

/// Replaces a stored expense, applying the same rules as [`add_expense`].
///
/// The record itself does not count as its own duplicate. `updated_at` is set
/// from `clock`; the stored version is returned.
pub async fn update_expense(
    storage: &dyn ExpenseStore,
    clock: &dyn Clock,
    expense: &Expense,
) -> Result<Expense, ExpenseError> {
    validate_expense(expense, clock.today())?;

    if expense.id.is_unsaved() || storage.get(expense.id).await?.is_none() {
        return Err(ExpenseError::NotFound(expense.id));
    }

    if let Some(existing) = storage
        .find_duplicate(&expense.title, expense.amount, expense.date())
        .await?
    {
        if existing.id != expense.id {
            return Err(ExpenseError::Duplicate);
        }
    }

    let mut updated = expense.clone();
    updated.updated_at = clock.now();
    if !storage.update(&updated).await? {
        // Removed between the existence check and the write.
        return Err(ExpenseError::NotFound(expense.id));
    }
    tracing::info!(id = %updated.id, "Updated expense");
    Ok(updated)
}

pub async fn get_expense(
    storage: &dyn ExpenseStore,
    id: ExpenseId,
) -> anyhow::Result<Option<Expense>> {
    storage.get(id).await
}

/// Deletes by id. Returns whether a record was removed.
pub async fn delete_expense(storage: &dyn ExpenseStore, id: ExpenseId) -> anyhow::Result<bool> {
    let removed = storage.delete(id).await?;
    if removed {
        tracing::info!(id = %id, "Deleted expense");
    }
    Ok(removed)
}

/// Deletes the stored record `expense` refers to.
pub async fn delete_expense_value(
    storage: &dyn ExpenseStore,
    expense: &Expense,
) -> anyhow::Result<bool> {
    if expense.id.is_unsaved() {
        return Ok(false);
    }
    delete_expense(storage, expense.id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryStorage;
    use anyhow::Result;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock::at_date(ymd(2024, 1, 10))
    }

    #[test]
    fn validation_reports_title_before_amount() {
        let clock = clock();
        let expense = Expense::new_with_clock(&clock, "  ", Decimal::ZERO, ExpenseCategory::Food);
        assert_eq!(
            validate_expense(&expense, clock.today()),
            Err(ValidationError::BlankTitle)
        );
    }

    #[test]
    fn validation_rejects_future_but_accepts_today() {
        let clock = clock();
        let today = Expense::new_with_clock(&clock, "Taxi", Decimal::ONE, ExpenseCategory::Travel);
        assert_eq!(validate_expense(&today, clock.today()), Ok(()));

        let tomorrow = today.clone().with_date(ymd(2024, 1, 11));
        assert_eq!(
            validate_expense(&tomorrow, clock.today()),
            Err(ValidationError::FutureDate)
        );
    }

    #[test]
    fn parse_amount_distinguishes_garbage_from_negative() {
        assert_eq!(parse_amount("12.50"), Ok(Decimal::new(1250, 2)));
        assert_eq!(parse_amount("-5"), Ok(Decimal::from(-5)));
        assert_eq!(parse_amount("twelve"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount(""), Err(ValidationError::InvalidAmount));
    }

    #[test]
    fn draft_uses_chosen_date_with_current_time() -> Result<()> {
        let clock = clock();
        let expense = ExpenseDraft::new("  Hotel ", "80", ExpenseCategory::Travel)
            .with_date(ymd(2024, 1, 3))
            .with_notes("conference")
            .into_expense(&clock)?;

        assert_eq!(expense.title, "Hotel");
        assert_eq!(expense.date(), ymd(2024, 1, 3));
        assert_eq!(expense.created_at.time(), clock.now().time());
        assert_eq!(expense.notes.as_deref(), Some("conference"));
        Ok(())
    }

    #[tokio::test]
    async fn add_ignores_caller_supplied_id() -> Result<()> {
        let storage = MemoryStorage::new();
        let clock = clock();
        let expense = Expense::new_with_clock(&clock, "Taxi", Decimal::ONE, ExpenseCategory::Travel)
            .with_id(ExpenseId::new(40));

        let id = add_expense(&storage, &clock, &expense).await?;
        assert_eq!(id, ExpenseId::new(1));
        Ok(())
    }

    #[tokio::test]
    async fn update_rejects_collision_with_other_record() -> Result<()> {
        let storage = MemoryStorage::new();
        let clock = clock();
        let lunch = Expense::new_with_clock(&clock, "Lunch", Decimal::TEN, ExpenseCategory::Food);
        let dinner = Expense::new_with_clock(&clock, "Dinner", Decimal::TEN, ExpenseCategory::Food);
        add_expense(&storage, &clock, &lunch).await?;
        let dinner_id = add_expense(&storage, &clock, &dinner).await?;

        let mut renamed = storage.get(dinner_id).await?.expect("dinner stored");
        renamed.title = "Lunch".to_string();
        let err = update_expense(&storage, &clock, &renamed).await.unwrap_err();
        assert!(matches!(err, ExpenseError::Duplicate));

        // Re-saving a record unchanged is not a duplicate of itself.
        let unchanged = storage.get(dinner_id).await?.expect("dinner stored");
        update_expense(&storage, &clock, &unchanged).await?;
        Ok(())
    }

    #[tokio::test]
    async fn update_of_unknown_record_is_not_found() -> Result<()> {
        let storage = MemoryStorage::new();
        let clock = clock();
        let ghost = Expense::new_with_clock(&clock, "Ghost", Decimal::ONE, ExpenseCategory::Staff)
            .with_id(ExpenseId::new(5));

        let err = update_expense(&storage, &clock, &ghost).await.unwrap_err();
        assert!(matches!(err, ExpenseError::NotFound(id) if id == ExpenseId::new(5)));
        Ok(())
    }

    #[tokio::test]
    async fn update_stamps_updated_at() -> Result<()> {
        let storage = MemoryStorage::new();
        let entered = FixedClock::at_date(ymd(2024, 1, 5));
        let expense = Expense::new_with_clock(&entered, "Fuel", Decimal::TEN, ExpenseCategory::Travel);
        let id = add_expense(&storage, &entered, &expense).await?;

        let later = clock();
        let mut stored = storage.get(id).await?.expect("stored");
        stored.amount = Decimal::from(12);
        let updated = update_expense(&storage, &later, &stored).await?;

        assert_eq!(updated.updated_at, later.now());
        assert_eq!(updated.created_at, entered.now());
        assert_eq!(storage.get(id).await?, Some(updated));
        Ok(())
    }

    #[tokio::test]
    async fn delete_by_value_uses_its_id() -> Result<()> {
        let storage = MemoryStorage::new();
        let clock = clock();
        let expense = Expense::new_with_clock(&clock, "Fuel", Decimal::TEN, ExpenseCategory::Travel);
        let id = add_expense(&storage, &clock, &expense).await?;

        assert!(!delete_expense_value(&storage, &expense).await?);
        let stored = get_expense(&storage, id).await?.expect("stored");
        assert!(delete_expense_value(&storage, &stored).await?);
        assert!(get_expense(&storage, id).await?.is_none());
        Ok(())
    }
}
