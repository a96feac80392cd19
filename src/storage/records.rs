//! Record set and query evaluation shared by the storage backends.

use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{add_amount, Expense, ExpenseCategory, ExpenseId};

use super::{CategoryAggregate, DailyAggregate};

#[derive(Debug, Default, Clone)]
pub(crate) struct ExpenseRecords {
    by_id: BTreeMap<ExpenseId, Expense>,
    last_id: ExpenseId,
}

fn in_range(expense: &Expense, start: NaiveDate, end: NaiveDate) -> bool {
    let date = expense.date();
    start <= date && date <= end
}

impl ExpenseRecords {
    /// Stores `expense`, assigning the next id when it is unsaved.
    pub(crate) fn upsert(&mut self, mut expense: Expense) -> Result<Expense> {
        if expense.id.is_unsaved() {
            expense.id = self.next_id()?;
        }
        self.last_id = self.last_id.max(expense.id);
        self.by_id.insert(expense.id, expense.clone());
        Ok(expense)
    }

    /// Id the next unsaved insert will receive.
    pub(crate) fn next_id(&self) -> Result<ExpenseId> {
        self.last_id
            .next()
            .context("Expense id space exhausted")
    }

    pub(crate) fn contains(&self, id: ExpenseId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub(crate) fn remove(&mut self, id: ExpenseId) -> bool {
        self.by_id.remove(&id).is_some()
    }

    /// Drops every record. Ids are not reused afterwards.
    pub(crate) fn clear(&mut self) {
        self.by_id.clear();
    }

    pub(crate) fn get(&self, id: ExpenseId) -> Option<Expense> {
        self.by_id.get(&id).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    fn newest_first<'a>(&'a self, pred: impl Fn(&Expense) -> bool) -> Vec<&'a Expense> {
        let mut out: Vec<&Expense> = self.by_id.values().filter(|e| pred(e)).collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    pub(crate) fn select(&self, pred: impl Fn(&Expense) -> bool) -> Vec<Expense> {
        self.newest_first(pred).into_iter().cloned().collect()
    }

    pub(crate) fn select_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<Expense> {
        self.select(|e| in_range(e, start, end))
    }

    pub(crate) fn count(&self, start: NaiveDate, end: NaiveDate) -> usize {
        self.by_id.values().filter(|e| in_range(e, start, end)).count()
    }

    pub(crate) fn total(&self, start: NaiveDate, end: NaiveDate) -> Result<Decimal> {
        self.by_id
            .values()
            .filter(|e| in_range(e, start, end))
            .try_fold(Decimal::ZERO, |total, e| add_amount(total, e.amount))
    }

    pub(crate) fn category_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CategoryAggregate>> {
        let mut out: Vec<CategoryAggregate> = Vec::new();
        let mut index: HashMap<ExpenseCategory, usize> = HashMap::new();
        for expense in self.newest_first(|e| in_range(e, start, end)) {
            let idx = *index.entry(expense.category).or_insert_with(|| {
                out.push(CategoryAggregate {
                    category: expense.category,
                    total: Decimal::ZERO,
                    count: 0,
                });
                out.len() - 1
            });
            out[idx].total = add_amount(out[idx].total, expense.amount)?;
            out[idx].count += 1;
        }
        Ok(out)
    }

    pub(crate) fn daily_totals(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyAggregate>> {
        let mut by_date: BTreeMap<NaiveDate, (Decimal, usize)> = BTreeMap::new();
        for expense in self.by_id.values().filter(|e| in_range(e, start, end)) {
            let entry = by_date.entry(expense.date()).or_insert((Decimal::ZERO, 0));
            entry.0 = add_amount(entry.0, expense.amount)?;
            entry.1 += 1;
        }
        Ok(by_date
            .into_iter()
            .map(|(date, (total, count))| DailyAggregate { date, total, count })
            .collect())
    }

    pub(crate) fn find_duplicate(
        &self,
        title: &str,
        amount: Decimal,
        date: NaiveDate,
    ) -> Option<Expense> {
        self.newest_first(|e| e.title == title && e.amount == amount && e.date() == date)
            .first()
            .map(|e| (*e).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn expense(title: &str, amount: i64, category: ExpenseCategory, date: NaiveDate) -> Expense {
        Expense::new_with_clock(
            &FixedClock::at_date(date),
            title,
            Decimal::from(amount),
            category,
        )
    }

    #[test]
    fn upsert_assigns_increasing_ids_and_never_reuses() {
        let mut records = ExpenseRecords::default();
        let a = records
            .upsert(expense("a", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();
        let b = records
            .upsert(expense("b", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();
        assert_eq!(a.id, ExpenseId::new(1));
        assert_eq!(b.id, ExpenseId::new(2));

        assert!(records.remove(b.id));
        records.clear();
        let c = records
            .upsert(expense("c", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();
        assert_eq!(c.id, ExpenseId::new(3));
    }

    #[test]
    fn unsaved_upsert_fails_once_ids_run_out() {
        let mut records = ExpenseRecords::default();
        let last = ExpenseId::new(u64::MAX);
        let kept = expense("last", 1, ExpenseCategory::Food, ymd(2024, 1, 1)).with_id(last);
        records.upsert(kept.clone()).unwrap();

        let err = records
            .upsert(expense("next", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Expense id space exhausted");
        assert_eq!(records.len(), 1);
        assert_eq!(records.get(last), Some(kept));
    }

    #[test]
    fn totals_fail_instead_of_overflowing() {
        let mut records = ExpenseRecords::default();
        let day = ymd(2024, 1, 1);
        for title in ["a", "b"] {
            let mut big = expense(title, 1, ExpenseCategory::Food, day);
            big.amount = Decimal::MAX;
            records.upsert(big).unwrap();
        }

        assert_eq!(records.count(day, day), 2);
        for err in [
            records.total(day, day).unwrap_err(),
            records.category_totals(day, day).unwrap_err(),
            records.daily_totals(day, day).unwrap_err(),
        ] {
            assert_eq!(err.to_string(), "Amount total overflowed");
        }
    }

    #[test]
    fn same_timestamp_orders_later_insert_first() {
        let mut records = ExpenseRecords::default();
        records
            .upsert(expense("first", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();
        records
            .upsert(expense("second", 1, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();

        let titles: Vec<String> = records.select(|_| true).into_iter().map(|e| e.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn category_totals_keep_first_seen_order() {
        let mut records = ExpenseRecords::default();
        records
            .upsert(expense("old", 5, ExpenseCategory::Staff, ymd(2024, 1, 1)))
            .unwrap();
        records
            .upsert(expense("new", 7, ExpenseCategory::Utility, ymd(2024, 1, 3)))
            .unwrap();
        records
            .upsert(expense("mid", 3, ExpenseCategory::Staff, ymd(2024, 1, 2)))
            .unwrap();

        let totals = records
            .category_totals(ymd(2024, 1, 1), ymd(2024, 1, 3))
            .unwrap();
        let order: Vec<ExpenseCategory> = totals.iter().map(|t| t.category).collect();
        assert_eq!(order, vec![ExpenseCategory::Utility, ExpenseCategory::Staff]);
        assert_eq!(totals[1].total, Decimal::from(8));
        assert_eq!(totals[1].count, 2);
    }

    #[test]
    fn duplicate_lookup_compares_amount_numerically() {
        let mut records = ExpenseRecords::default();
        records
            .upsert(expense("Lunch", 250, ExpenseCategory::Food, ymd(2024, 1, 1)))
            .unwrap();

        let scaled = Decimal::new(25000, 2);
        assert!(records
            .find_duplicate("Lunch", scaled, ymd(2024, 1, 1))
            .is_some());
        assert!(records
            .find_duplicate("lunch", scaled, ymd(2024, 1, 1))
            .is_none());
        assert!(records
            .find_duplicate("Lunch", scaled, ymd(2024, 1, 2))
            .is_none());
    }
}
