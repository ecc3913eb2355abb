#![allow(clippy::unwrap_used)]

use rust_decimal_macros::dec;

use super::*;
use crate::models::{EntryKind, Expense, Income, User};

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn setup() -> (Database, i64, i64, i64) {
    let db = Database::open_in_memory().unwrap();
    let user_id = db
        .insert_user(&User::new("alice".into(), "alice@example.com".into()))
        .unwrap();
    let food = db
        .get_category_by_name("Food")
        .unwrap()
        .unwrap()
        .id
        .unwrap();
    let utilities = db
        .get_category_by_name("Utilities")
        .unwrap()
        .unwrap()
        .id
        .unwrap();
    (db, user_id, food, utilities)
}

fn add_income(db: &Database, user_id: i64, amount: Decimal, source: &str, on: &str) {
    db.insert_income(&Income::new(user_id, amount, source.into(), date(on)))
        .unwrap();
}

fn add_expense(db: &Database, user_id: i64, category_id: i64, amount: Decimal, desc: &str, on: &str) {
    db.insert_expense(&Expense::new(
        user_id,
        category_id,
        amount,
        desc.into(),
        date(on),
    ))
    .unwrap();
}

// ── DateRange ─────────────────────────────────────────────────

#[test]
fn test_trailing_days() {
    let range = DateRange::trailing_days(date("2024-06-30"), 30);
    assert_eq!(range.start, date("2024-05-31"));
    assert_eq!(range.end, date("2024-06-30"));
}

#[test]
fn test_missing_dates_fall_back_to_default_window() {
    let as_of = date("2024-06-30");
    let range = DateRange::parse_or_default(None, None, as_of);
    assert_eq!(range, DateRange::trailing_days(as_of, DEFAULT_REPORT_DAYS));
}

#[test]
fn test_malformed_dates_fall_back_to_default_window() {
    let as_of = date("2024-06-30");
    let range = DateRange::parse_or_default(Some("garbage"), Some("2024-13-99"), as_of);
    assert_eq!(range, DateRange::trailing_days(as_of, DEFAULT_REPORT_DAYS));
}

#[test]
fn test_partial_dates_fall_back_per_side() {
    let as_of = date("2024-06-30");

    let range = DateRange::parse_or_default(Some("2024-01-15"), None, as_of);
    assert_eq!(range.start, date("2024-01-15"));
    assert_eq!(range.end, as_of);

    let range = DateRange::parse_or_default(None, Some("2024-02-01"), as_of);
    assert_eq!(range.start, date("2024-05-31"));
    assert_eq!(range.end, date("2024-02-01"));
}

// ── summary ───────────────────────────────────────────────────

#[test]
fn test_summary_totals_and_categories() {
    let (db, alice, food, utilities) = setup();
    add_income(&db, alice, dec!(3000.00), "Salary", "2024-01-20");
    add_income(&db, alice, dec!(200.00), "Freelance", "2024-02-10");
    add_expense(&db, alice, food, dec!(87.50), "Groceries", "2024-01-10");
    add_expense(&db, alice, food, dec!(12.50), "Takeout", "2024-02-05");
    add_expense(&db, alice, utilities, dec!(60.00), "Electric", "2024-02-06");

    let summary = summary(&db, alice).unwrap();
    assert_eq!(summary.total_income, dec!(3200.00));
    assert_eq!(summary.total_expenses, dec!(160.00));
    assert_eq!(summary.expense_categories.len(), 2);
    assert_eq!(summary.expense_categories["Food"], dec!(100.00));
    assert_eq!(summary.expense_categories["Utilities"], dec!(60.00));
}

#[test]
fn test_summary_empty_user_is_all_zeroes() {
    let (db, alice, _, _) = setup();
    let summary = summary(&db, alice).unwrap();
    assert_eq!(summary.total_income, Decimal::ZERO);
    assert_eq!(summary.total_expenses, Decimal::ZERO);
    assert!(summary.expense_categories.is_empty());
}

// ── range_report ──────────────────────────────────────────────

#[test]
fn test_range_report_totals_and_net() {
    let (db, alice, food, _) = setup();
    add_income(&db, alice, dec!(100.00), "Salary", "2024-03-05");
    add_expense(&db, alice, food, dec!(30.00), "Groceries", "2024-03-06");

    let report = range_report(
        &db,
        alice,
        DateRange {
            start: date("2024-03-01"),
            end: date("2024-03-31"),
        },
    )
    .unwrap();
    assert_eq!(report.total_income, dec!(100.00));
    assert_eq!(report.total_expenses, dec!(30.00));
    assert_eq!(report.net_income, dec!(70.00));
    assert_eq!(report.transactions.len(), 2);
    assert_eq!(report.expense_categories["Food"], dec!(30.00));
}

#[test]
fn test_range_report_single_day() {
    let (db, alice, food, _) = setup();
    add_expense(&db, alice, food, dec!(10.00), "Before", "2024-03-09");
    add_expense(&db, alice, food, dec!(20.00), "On the day", "2024-03-10");
    add_expense(&db, alice, food, dec!(30.00), "After", "2024-03-11");

    let day = date("2024-03-10");
    let report = range_report(&db, alice, DateRange { start: day, end: day }).unwrap();
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.transactions[0].description, "On the day");
    assert_eq!(report.total_expenses, dec!(20.00));
}

#[test]
fn test_range_report_merges_newest_first() {
    let (db, alice, food, _) = setup();
    add_income(&db, alice, dec!(50.00), "Older income", "2024-03-08");
    add_income(&db, alice, dec!(100.00), "Tied income", "2024-03-10");
    add_expense(&db, alice, food, dec!(25.00), "Tied expense", "2024-03-10");
    add_expense(&db, alice, food, dec!(5.00), "Newest expense", "2024-03-12");

    let report = range_report(
        &db,
        alice,
        DateRange {
            start: date("2024-03-01"),
            end: date("2024-03-31"),
        },
    )
    .unwrap();

    let rows: Vec<(&str, EntryKind)> = report
        .transactions
        .iter()
        .map(|t| (t.description.as_str(), t.kind))
        .collect();
    // Date-descending; on the tied date incomes come before expenses.
    assert_eq!(
        rows,
        vec![
            ("Newest expense", EntryKind::Expense),
            ("Tied income", EntryKind::Income),
            ("Tied expense", EntryKind::Expense),
            ("Older income", EntryKind::Income),
        ]
    );
}

#[test]
fn test_range_report_empty_range() {
    let (db, alice, food, _) = setup();
    add_expense(&db, alice, food, dec!(10.00), "Elsewhere", "2024-03-10");

    let report = range_report(
        &db,
        alice,
        DateRange {
            start: date("2025-01-01"),
            end: date("2025-01-31"),
        },
    )
    .unwrap();
    assert_eq!(report.total_income, Decimal::ZERO);
    assert_eq!(report.total_expenses, Decimal::ZERO);
    assert_eq!(report.net_income, Decimal::ZERO);
    assert!(report.transactions.is_empty());
    assert!(report.expense_categories.is_empty());
}

#[test]
fn test_range_report_income_entries_have_empty_category() {
    let (db, alice, _, _) = setup();
    add_income(&db, alice, dec!(100.00), "Salary", "2024-03-05");

    let report = range_report(
        &db,
        alice,
        DateRange {
            start: date("2024-03-01"),
            end: date("2024-03-31"),
        },
    )
    .unwrap();
    assert_eq!(report.transactions[0].kind, EntryKind::Income);
    assert!(report.transactions[0].category.is_empty());
}

// ── spending_patterns ─────────────────────────────────────────

#[test]
fn test_patterns_group_by_month_and_category() {
    let (db, alice, food, utilities) = setup();
    add_expense(&db, alice, food, dec!(30.00), "Groceries", "2024-03-10");
    add_expense(&db, alice, food, dec!(20.00), "Takeout", "2024-03-20");
    add_expense(&db, alice, food, dec!(15.00), "Groceries", "2024-04-02");
    add_expense(&db, alice, utilities, dec!(40.00), "Electric", "2024-04-05");

    let patterns = spending_patterns(&db, alice, date("2024-06-15")).unwrap();
    assert_eq!(patterns.len(), 2);
    // Same month and category merge into one entry
    assert_eq!(patterns["2024-03"]["Food"], dec!(50.00));
    // Different months never merge
    assert_eq!(patterns["2024-04"]["Food"], dec!(15.00));
    assert_eq!(patterns["2024-04"]["Utilities"], dec!(40.00));
}

#[test]
fn test_patterns_window_is_trailing_180_days() {
    let (db, alice, food, _) = setup();
    add_expense(&db, alice, food, dec!(99.00), "Too old", "2023-11-01");
    add_expense(&db, alice, food, dec!(10.00), "In window", "2024-05-01");
    add_expense(&db, alice, food, dec!(77.00), "In the future", "2024-07-01");

    let patterns = spending_patterns(&db, alice, date("2024-06-15")).unwrap();
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns["2024-05"]["Food"], dec!(10.00));
}

#[test]
fn test_patterns_empty_when_no_expenses() {
    let (db, alice, _, _) = setup();
    let patterns = spending_patterns(&db, alice, date("2024-06-15")).unwrap();
    assert!(patterns.is_empty());
}

// ── recent_transactions ───────────────────────────────────────

#[test]
fn test_recent_caps_at_ten_entries() {
    let (db, alice, food, _) = setup();
    for day in 1..=7 {
        add_income(
            &db,
            alice,
            dec!(10.00),
            &format!("Income {day}"),
            &format!("2024-03-{day:02}"),
        );
        add_expense(
            &db,
            alice,
            food,
            dec!(5.00),
            &format!("Expense {day}"),
            &format!("2024-03-{day:02}"),
        );
    }

    let entries = recent_transactions(&db, alice).unwrap();
    assert_eq!(entries.len(), 10);
    // Newest first; on the tied date the income comes before the expense
    assert_eq!(entries[0].description, "Income 7");
    assert_eq!(entries[1].description, "Expense 7");
    // Only the five newest of each kind are considered
    assert!(entries.iter().all(|e| !e.description.ends_with(" 1")));
    assert!(entries.iter().all(|e| !e.description.ends_with(" 2")));
}

#[test]
fn test_recent_empty() {
    let (db, alice, _, _) = setup();
    assert!(recent_transactions(&db, alice).unwrap().is_empty());
}
