#![allow(clippy::unwrap_used)]

use chrono::NaiveDate;
use rust_decimal_macros::dec;

use super::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

// ── EntryKind ─────────────────────────────────────────────────

#[test]
fn test_entry_kind_labels() {
    assert_eq!(EntryKind::Income.as_str(), "Income");
    assert_eq!(EntryKind::Expense.as_str(), "Expense");
    assert_eq!(EntryKind::Income.to_string(), "Income");
}

// ── LedgerEntry ───────────────────────────────────────────────

#[test]
fn test_entry_from_income_has_empty_category() {
    let income = Income::new(1, dec!(1200.00), "Salary".into(), date("2024-03-01"));
    let entry = LedgerEntry::from_income(&income);
    assert_eq!(entry.kind, EntryKind::Income);
    assert_eq!(entry.amount, dec!(1200.00));
    assert_eq!(entry.description, "Salary");
    assert!(entry.category.is_empty());
}

#[test]
fn test_entry_from_expense_carries_category() {
    let expense = Expense::new(1, 2, dec!(18.40), "Lunch".into(), date("2024-03-02"));
    let entry = LedgerEntry::from_expense(&expense, "Food".into());
    assert_eq!(entry.kind, EntryKind::Expense);
    assert_eq!(entry.amount, dec!(18.40));
    assert_eq!(entry.description, "Lunch");
    assert_eq!(entry.category, "Food");
}

// ── Category ──────────────────────────────────────────────────

#[test]
fn test_category_find_by_name_case_insensitive() {
    let cats = vec![
        Category {
            id: Some(1),
            name: "Food".into(),
        },
        Category {
            id: Some(2),
            name: "Utilities".into(),
        },
    ];
    assert_eq!(Category::find_by_name(&cats, "food").unwrap().id, Some(1));
    assert_eq!(
        Category::find_by_name(&cats, "UTILITIES").unwrap().id,
        Some(2)
    );
    assert!(Category::find_by_name(&cats, "Travel").is_none());
}

#[test]
fn test_category_find_by_id() {
    let cats = vec![Category {
        id: Some(7),
        name: "Rent".into(),
    }];
    assert_eq!(Category::find_by_id(&cats, 7).unwrap().name, "Rent");
    assert!(Category::find_by_id(&cats, 8).is_none());
}

// ── Constructors ──────────────────────────────────────────────

#[test]
fn test_user_new_has_no_id() {
    let user = User::new("maria".into(), "maria@example.com".into());
    assert!(user.id.is_none());
    assert!(user.password_hash.is_empty());
    assert_eq!(user.to_string(), "maria <maria@example.com>");
}

#[test]
fn test_limit_new() {
    let limit = BudgetLimit::new(1, 2, dec!(500.00));
    assert!(limit.id.is_none());
    assert_eq!(limit.amount, dec!(500.00));
}
