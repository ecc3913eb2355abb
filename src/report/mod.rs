use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::db::Database;
use crate::models::LedgerEntry;

/// Window applied when report dates are missing or unparseable.
pub(crate) const DEFAULT_REPORT_DAYS: u64 = 30;
/// Spending patterns look back this far from the evaluation date.
pub(crate) const PATTERN_WINDOW_DAYS: u64 = 180;

const RECENT_PER_KIND: u32 = 5;
const RECENT_TOTAL: usize = 10;

/// Closed date interval; both endpoints are included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub(crate) fn trailing_days(as_of: NaiveDate, days: u64) -> Self {
        let start = as_of.checked_sub_days(Days::new(days)).unwrap_or(as_of);
        Self { start, end: as_of }
    }

    /// Build a range from optional user-supplied endpoints. A missing or
    /// malformed endpoint falls back to the trailing 30-day default for
    /// that side; this never fails.
    pub(crate) fn parse_or_default(
        start: Option<&str>,
        end: Option<&str>,
        as_of: NaiveDate,
    ) -> Self {
        let fallback = Self::trailing_days(as_of, DEFAULT_REPORT_DAYS);
        let parse = |s: Option<&str>| s.and_then(|v| NaiveDate::parse_from_str(v, "%Y-%m-%d").ok());
        Self {
            start: parse(start).unwrap_or(fallback.start),
            end: parse(end).unwrap_or(fallback.end),
        }
    }

    fn as_tuple(&self) -> (NaiveDate, NaiveDate) {
        (self.start, self.end)
    }
}

/// All-time totals for one user.
#[derive(Debug, Clone)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub expense_categories: BTreeMap<String, Decimal>,
}

/// Totals, merged transaction listing, and category breakdown for a
/// date interval.
#[derive(Debug, Clone)]
pub struct RangeReport {
    pub range: DateRange,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net_income: Decimal,
    pub transactions: Vec<LedgerEntry>,
    pub expense_categories: BTreeMap<String, Decimal>,
}

pub(crate) fn summary(db: &Database, user_id: i64) -> Result<Summary> {
    Ok(Summary {
        total_income: db.sum_incomes(user_id, None)?,
        total_expenses: db.sum_expenses(user_id, None)?,
        expense_categories: db
            .expense_totals_by_category(user_id, None)?
            .into_iter()
            .collect(),
    })
}

pub(crate) fn range_report(db: &Database, user_id: i64, range: DateRange) -> Result<RangeReport> {
    let incomes = db.get_incomes_in_range(user_id, range.start, range.end)?;
    let expenses = db.get_expenses_in_range(user_id, range.start, range.end)?;

    let total_income: Decimal = incomes.iter().map(|i| i.amount).sum();
    let total_expenses: Decimal = expenses.iter().map(|(e, _)| e.amount).sum();

    let mut transactions: Vec<LedgerEntry> =
        incomes.iter().map(LedgerEntry::from_income).collect();
    transactions.extend(
        expenses
            .iter()
            .map(|(e, category)| LedgerEntry::from_expense(e, category.clone())),
    );
    // Stable sort: on equal dates incomes stay ahead of expenses, each in
    // insertion order.
    transactions.sort_by(|a, b| b.date.cmp(&a.date));

    Ok(RangeReport {
        range,
        total_income,
        total_expenses,
        net_income: total_income - total_expenses,
        transactions,
        expense_categories: db
            .expense_totals_by_category(user_id, Some(range.as_tuple()))?
            .into_iter()
            .collect(),
    })
}

/// Expense totals over the trailing 180 days, grouped month → category.
pub(crate) fn spending_patterns(
    db: &Database,
    user_id: i64,
    as_of: NaiveDate,
) -> Result<BTreeMap<String, BTreeMap<String, Decimal>>> {
    let range = DateRange::trailing_days(as_of, PATTERN_WINDOW_DAYS);

    let mut data: BTreeMap<String, BTreeMap<String, Decimal>> = BTreeMap::new();
    for (month, category, total) in
        db.monthly_category_totals(user_id, range.start, range.end)?
    {
        data.entry(month).or_default().insert(category, total);
    }
    Ok(data)
}

/// Newest incomes and expenses merged into one date-descending list,
/// capped at ten entries.
pub(crate) fn recent_transactions(db: &Database, user_id: i64) -> Result<Vec<LedgerEntry>> {
    let incomes = db.get_recent_incomes(user_id, RECENT_PER_KIND)?;
    let expenses = db.get_recent_expenses(user_id, RECENT_PER_KIND)?;

    let mut entries: Vec<LedgerEntry> = incomes.iter().map(LedgerEntry::from_income).collect();
    entries.extend(
        expenses
            .iter()
            .map(|(e, category)| LedgerEntry::from_expense(e, category.clone())),
    );
    entries.sort_by(|a, b| b.date.cmp(&a.date));
    entries.truncate(RECENT_TOTAL);
    Ok(entries)
}

#[cfg(test)]
mod tests;
