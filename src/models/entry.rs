use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{Expense, Income};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Income,
    Expense,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "Income",
            Self::Expense => "Expense",
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One row of a merged income/expense listing.
/// `category` is empty for income entries.
#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
}

impl LedgerEntry {
    pub(crate) fn from_income(income: &Income) -> Self {
        Self {
            date: income.date,
            kind: EntryKind::Income,
            amount: income.amount,
            description: income.source.clone(),
            category: String::new(),
        }
    }

    pub(crate) fn from_expense(expense: &Expense, category: String) -> Self {
        Self {
            date: expense.date,
            kind: EntryKind::Expense,
            amount: expense.amount,
            description: expense.description.clone(),
            category,
        }
    }
}
