use std::collections::HashMap;

use anyhow::Result;
use chrono::NaiveDate;
use futures::stream::{self, Stream};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::clock::Clock;
use crate::models::{sum_amounts, Expense, ExpenseCategory, ExpenseFilter, GroupBy};
use crate::storage::ExpenseStore;

/// What a group of expenses has in common.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum GroupKey {
    ByDate(NaiveDate),
    ByCategory(ExpenseCategory),
}

impl GroupKey {
    /// Display label: "Jan 02, 2024" for dates, "🍽️ Food" for categories.
    pub fn label(&self) -> String {
        match self {
            GroupKey::ByDate(date) => date.format("%b %d, %Y").to_string(),
            GroupKey::ByCategory(category) => category.label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseGroup {
    pub key: GroupKey,
    pub label: String,
    pub expenses: Vec<Expense>,
}

impl ExpenseGroup {
    fn new(key: GroupKey) -> Self {
        Self {
            label: key.label(),
            key,
            expenses: Vec::new(),
        }
    }

    pub fn total_amount(&self) -> Result<Decimal> {
        sum_amounts(self.expenses.iter().map(|e| e.amount))
    }
}

/// A filtered selection partitioned for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedExpenses {
    pub group_by: GroupBy,
    pub groups: Vec<ExpenseGroup>,
}

impl GroupedExpenses {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn total_amount(&self) -> Result<Decimal> {
        sum_amounts(self.expenses().map(|e| e.amount))
    }

    pub fn total_count(&self) -> usize {
        self.groups.iter().map(|g| g.expenses.len()).sum()
    }

    /// All member expenses, group by group.
    pub fn expenses(&self) -> impl Iterator<Item = &Expense> {
        self.groups.iter().flat_map(|g| g.expenses.iter())
    }
}

/// Fetches the records a filter selects.
///
/// The filter is resolved as a cascade, first match wins:
/// 1. both dates and a category: that category within the inclusive range;
/// 2. both dates: the inclusive range;
/// 3. a category: that category on any date;
/// 4. otherwise everything.
///
/// A lone start or end date does not restrict anything.
pub async fn select_expenses(
    storage: &dyn ExpenseStore,
    filter: &ExpenseFilter,
) -> Result<Vec<Expense>> {
    if filter.date_range().is_none() && (filter.start_date.is_some() || filter.end_date.is_some()) {
        tracing::debug!(
            start = ?filter.start_date,
            end = ?filter.end_date,
            "Ignoring half-open date range in expense filter"
        );
    }

    match (filter.date_range(), filter.category) {
        (Some((start, end)), Some(category)) => {
            storage
                .list_by_date_range_and_category(start, end, category)
                .await
        }
        (Some((start, end)), None) => storage.list_by_date_range(start, end).await,
        (None, Some(category)) => storage.list_by_category(category).await,
        (None, None) => storage.list_all().await,
    }
}

/// Partitions `expenses` (newest-first, as the store returns them).
///
/// By time, groups are ordered by ascending date; by category, in the order
/// each category first appears. Members keep their incoming order.
pub fn group_expenses(expenses: Vec<Expense>, group_by: GroupBy) -> GroupedExpenses {
    let mut groups: Vec<ExpenseGroup> = Vec::new();
    let mut index: HashMap<GroupKey, usize> = HashMap::new();

    for expense in expenses {
        let key = match group_by {
            GroupBy::Time => GroupKey::ByDate(expense.date()),
            GroupBy::Category => GroupKey::ByCategory(expense.category),
        };
        let idx = *index.entry(key).or_insert_with(|| {
            groups.push(ExpenseGroup::new(key));
            groups.len() - 1
        });
        groups[idx].expenses.push(expense);
    }

    if group_by == GroupBy::Time {
        groups.sort_by_key(|g| match g.key {
            GroupKey::ByDate(date) => Some(date),
            GroupKey::ByCategory(_) => None,
        });
    }

    GroupedExpenses { group_by, groups }
}

/// Selects and groups the expenses matching `filter`.
pub async fn filter_expenses(
    storage: &dyn ExpenseStore,
    filter: &ExpenseFilter,
) -> Result<GroupedExpenses> {
    let expenses = select_expenses(storage, filter).await?;
    tracing::debug!(count = expenses.len(), group_by = ?filter.group_by, "Filtered expenses");
    Ok(group_expenses(expenses, filter.group_by))
}

/// Live view of [`filter_expenses`].
///
/// Yields the current snapshot immediately and a fresh one after every store
/// write. The stream never ends on its own; drop it to unsubscribe. Writes
/// that land while a snapshot is being computed are coalesced into the next
/// one. Store errors are yielded as items and the stream keeps going.
pub fn watch_expenses<'a>(
    storage: &'a dyn ExpenseStore,
    filter: ExpenseFilter,
) -> impl Stream<Item = Result<GroupedExpenses>> + Send + 'a {
    let rx = storage.subscribe();
    stream::unfold((rx, filter, true), move |(mut rx, filter, first)| async move {
        if !first && rx.changed().await.is_err() {
            return None;
        }
        rx.borrow_and_update();
        let snapshot = filter_expenses(storage, &filter).await;
        Some((snapshot, (rx, filter, false)))
    })
}

pub async fn expenses_by_date(storage: &dyn ExpenseStore, date: NaiveDate) -> Result<Vec<Expense>> {
    storage.list_by_date(date).await
}

pub async fn today_expenses(storage: &dyn ExpenseStore, clock: &dyn Clock) -> Result<Vec<Expense>> {
    expenses_by_date(storage, clock.today()).await
}
