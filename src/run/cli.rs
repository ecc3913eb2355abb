use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::budget::{self, LimitDecision};
use crate::db::Database;
use crate::models::{BudgetLimit, Category, Expense, Income, User};
use crate::report::{self, DateRange};
use crate::util::{format_amount, truncate};

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    match args[1].as_str() {
        "user" => cli_user(&args[2..], db),
        "category" => cli_category(&args[2..], db),
        "categories" => cli_categories(db),
        "income" => cli_income(&args[2..], db),
        "expense" => cli_expense(&args[2..], db),
        "limit" => cli_limit(&args[2..], db),
        "summary" | "s" => cli_summary(&args[2..], db),
        "report" => cli_report(&args[2..], db),
        "patterns" => cli_patterns(&args[2..], db),
        "recent" => cli_recent(&args[2..], db),
        "alerts" => cli_alerts(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

pub(crate) fn print_usage() {
    println!("BudgetBook — multi-user personal budget tracker");
    println!();
    println!("Usage: budgetbook <command>");
    println!();
    println!("Commands:");
    println!("  user add <username> <email>                      Register a user");
    println!("  user list                                        List users");
    println!("  user remove <username>                           Delete a user and their records");
    println!("  category add <name>                              Create an expense category");
    println!("  categories                                       List categories");
    println!("  income add <user> <amount> <source> [date]       Record income");
    println!("  income list <user>                               List a user's income");
    println!("  income edit <user> <id> <amount> <source> [date] Edit an income entry");
    println!("  income remove <user> <id>                        Delete an income entry");
    println!("  expense add <user> <amount> <category> <description> [date]");
    println!("                                                   Record an expense (limit-checked)");
    println!("  expense list <user>                              List a user's expenses");
    println!("  expense edit <user> <id> <amount> <category> <description> [date]");
    println!("                                                   Edit an expense entry");
    println!("  expense remove <user> <id>                       Delete an expense entry");
    println!("  limit set <user> <category> <amount>             Set a monthly budget limit");
    println!("  limit list <user>                                List a user's budget limits");
    println!("  limit remove <user> <category>                   Remove a budget limit");
    println!("  summary <user>                                   All-time totals by category");
    println!("  report <user> [start] [end]                      Report for a date range");
    println!("                                                   (defaults to the last 30 days)");
    println!("  patterns <user>                                  Monthly spending by category");
    println!("  recent <user>                                    Ten most recent transactions");
    println!("  alerts <user>                                    Breached budget limits");
    println!("  --help, -h                                       Show this help");
    println!("  --version, -V                                    Show version");
}

// ── Argument helpers ─────────────────────────────────────────

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn require_user_id(db: &Database, username: &str) -> Result<i64> {
    let user = db
        .get_user_by_username(username)?
        .ok_or_else(|| anyhow::anyhow!("User '{username}' not found"))?;
    user.id
        .ok_or_else(|| anyhow::anyhow!("User '{username}' has no ID"))
}

fn require_category_id(db: &Database, name: &str) -> Result<i64> {
    let cat = db
        .get_category_by_name(name)?
        .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))?;
    cat.id
        .ok_or_else(|| anyhow::anyhow!("Category '{name}' has no ID"))
}

fn parse_amount(s: &str) -> Result<Decimal> {
    Decimal::from_str(s).ok().with_context(|| format!("Invalid amount: {s}"))
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .with_context(|| format!("Invalid date (expected YYYY-MM-DD): {s}"))
}

/// Optional trailing date argument; defaults to today.
fn parse_date_arg(args: &[String], idx: usize) -> Result<NaiveDate> {
    match args.get(idx) {
        Some(s) => parse_date(s),
        None => Ok(today()),
    }
}

fn parse_id(s: &str) -> Result<i64> {
    s.parse::<i64>()
        .ok()
        .with_context(|| format!("Invalid ID: {s}"))
}

// ── Users ─────────────────────────────────────────────────────

fn cli_user(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            if args.len() < 3 {
                anyhow::bail!("Usage: budgetbook user add <username> <email>");
            }
            let user = User::new(args[1].clone(), args[2].clone());
            let id = db.insert_user(&user)?;
            println!("Registered {user} (#{id})");
            Ok(())
        }
        Some("list") => {
            let users = db.get_users()?;
            if users.is_empty() {
                println!("No users");
                return Ok(());
            }
            println!("{:<4} {:<16} Email", "ID", "Username");
            println!("{}", "─".repeat(48));
            for user in &users {
                println!(
                    "{:<4} {:<16} {}",
                    user.id.unwrap_or(0),
                    user.username,
                    user.email
                );
            }
            Ok(())
        }
        Some("remove") => {
            if args.len() < 2 {
                anyhow::bail!("Usage: budgetbook user remove <username>");
            }
            let id = require_user_id(db, &args[1])?;
            db.delete_user(id)?;
            println!("Deleted user '{}' and all their records", args[1]);
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetbook user <add|list|remove>"),
    }
}

// ── Categories ────────────────────────────────────────────────

fn cli_category(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            if args.len() < 2 {
                anyhow::bail!("Usage: budgetbook category add <name>");
            }
            let categories = db.get_categories()?;
            if Category::find_by_name(&categories, &args[1]).is_some() {
                println!("Category '{}' already exists", args[1]);
                return Ok(());
            }
            let category = Category::new(args[1].clone());
            let id = db.insert_category(&category)?;
            println!("Created category '{category}' (#{id})");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetbook category add <name>"),
    }
}

fn cli_categories(db: &mut Database) -> Result<()> {
    let categories = db.get_categories()?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }
    for category in &categories {
        println!("{:<4} {}", category.id.unwrap_or(0), category.name);
    }
    Ok(())
}

// ── Incomes ───────────────────────────────────────────────────

fn cli_income(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            if args.len() < 4 {
                anyhow::bail!("Usage: budgetbook income add <user> <amount> <source> [date]");
            }
            let user_id = require_user_id(db, &args[1])?;
            let amount = parse_amount(&args[2])?;
            let date = parse_date_arg(args, 4)?;
            let income = Income::new(user_id, amount, args[3].clone(), date);
            db.insert_income(&income)?;
            println!(
                "Income added: {} {} on {}",
                income.source,
                format_amount(amount),
                income.date
            );
            Ok(())
        }
        Some("list") => {
            if args.len() < 2 {
                anyhow::bail!("Usage: budgetbook income list <user>");
            }
            let user_id = require_user_id(db, &args[1])?;
            let incomes = db.get_incomes(user_id)?;
            if incomes.is_empty() {
                println!("No income recorded");
                return Ok(());
            }
            println!("{:<4} {:<12} {:>14} Source", "ID", "Date", "Amount");
            println!("{}", "─".repeat(48));
            for income in &incomes {
                println!(
                    "{:<4} {:<12} {:>14} {}",
                    income.id.unwrap_or(0),
                    income.date.to_string(),
                    format_amount(income.amount),
                    income.source
                );
            }
            Ok(())
        }
        Some("edit") => {
            if args.len() < 5 {
                anyhow::bail!(
                    "Usage: budgetbook income edit <user> <id> <amount> <source> [date]"
                );
            }
            let user_id = require_user_id(db, &args[1])?;
            let income = Income {
                id: Some(parse_id(&args[2])?),
                user_id,
                amount: parse_amount(&args[3])?,
                source: args[4].clone(),
                date: parse_date_arg(args, 5)?,
                created_at: String::new(),
            };
            db.update_income(&income)?;
            println!("Income updated");
            Ok(())
        }
        Some("remove") => {
            if args.len() < 3 {
                anyhow::bail!("Usage: budgetbook income remove <user> <id>");
            }
            let user_id = require_user_id(db, &args[1])?;
            db.delete_income(parse_id(&args[2])?, user_id)?;
            println!("Income deleted");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetbook income <add|list|edit|remove>"),
    }
}

// ── Expenses ──────────────────────────────────────────────────

fn cli_expense(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("add") => {
            if args.len() < 5 {
                anyhow::bail!(
                    "Usage: budgetbook expense add <user> <amount> <category> <description> [date]"
                );
            }
            let user_id = require_user_id(db, &args[1])?;
            let amount = parse_amount(&args[2])?;
            let category_id = require_category_id(db, &args[3])?;
            let date = parse_date_arg(args, 5)?;

            match budget::evaluate_limit(db, user_id, category_id, amount, today())? {
                LimitDecision::Deny { limit } => {
                    println!(
                        "This expense exceeds your budget limit of {}. \
                         Please adjust your expense or update your budget limit.",
                        format_amount(limit)
                    );
                }
                LimitDecision::Allow => {
                    let expense =
                        Expense::new(user_id, category_id, amount, args[4].clone(), date);
                    db.insert_expense(&expense)?;
                    println!(
                        "Expense added: {} {} ({})",
                        expense.description,
                        format_amount(amount),
                        args[3]
                    );
                }
            }
            Ok(())
        }
        Some("list") => {
            if args.len() < 2 {
                anyhow::bail!("Usage: budgetbook expense list <user>");
            }
            let user_id = require_user_id(db, &args[1])?;
            let expenses = db.get_expenses(user_id)?;
            if expenses.is_empty() {
                println!("No expenses recorded");
                return Ok(());
            }
            println!(
                "{:<4} {:<12} {:>14} {:<16} Description",
                "ID", "Date", "Amount", "Category"
            );
            println!("{}", "─".repeat(72));
            for (expense, category) in &expenses {
                println!(
                    "{:<4} {:<12} {:>14} {:<16} {}",
                    expense.id.unwrap_or(0),
                    expense.date.to_string(),
                    format_amount(expense.amount),
                    category,
                    truncate(&expense.description, 32)
                );
            }
            Ok(())
        }
        Some("edit") => {
            if args.len() < 6 {
                anyhow::bail!(
                    "Usage: budgetbook expense edit <user> <id> <amount> <category> <description> [date]"
                );
            }
            let user_id = require_user_id(db, &args[1])?;
            let expense = Expense {
                id: Some(parse_id(&args[2])?),
                user_id,
                category_id: require_category_id(db, &args[4])?,
                amount: parse_amount(&args[3])?,
                description: args[5].clone(),
                date: parse_date_arg(args, 6)?,
                created_at: String::new(),
            };
            db.update_expense(&expense)?;
            println!("Expense updated");
            Ok(())
        }
        Some("remove") => {
            if args.len() < 3 {
                anyhow::bail!("Usage: budgetbook expense remove <user> <id>");
            }
            let user_id = require_user_id(db, &args[1])?;
            db.delete_expense(parse_id(&args[2])?, user_id)?;
            println!("Expense deleted");
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetbook expense <add|list|edit|remove>"),
    }
}

// ── Budget limits ─────────────────────────────────────────────

fn cli_limit(args: &[String], db: &mut Database) -> Result<()> {
    match args.first().map(String::as_str) {
        Some("set") => {
            if args.len() < 4 {
                anyhow::bail!("Usage: budgetbook limit set <user> <category> <amount>");
            }
            let user_id = require_user_id(db, &args[1])?;
            let category_id = require_category_id(db, &args[2])?;
            let amount = parse_amount(&args[3])?;
            db.upsert_limit(&BudgetLimit::new(user_id, category_id, amount))?;
            println!(
                "Budget limit set: {} {} per month",
                args[2],
                format_amount(amount)
            );
            Ok(())
        }
        Some("list") => {
            if args.len() < 2 {
                anyhow::bail!("Usage: budgetbook limit list <user>");
            }
            let user_id = require_user_id(db, &args[1])?;
            let limits = db.get_limits(user_id)?;
            if limits.is_empty() {
                println!("No budget limits set");
                return Ok(());
            }
            let categories = db.get_categories()?;
            println!("{:<16} Monthly limit", "Category");
            println!("{}", "─".repeat(32));
            for limit in &limits {
                let name = Category::find_by_id(&categories, limit.category_id)
                    .map(|c| c.name.as_str())
                    .unwrap_or("Unknown");
                println!("{:<16} {}", name, format_amount(limit.amount));
            }
            Ok(())
        }
        Some("remove") => {
            if args.len() < 3 {
                anyhow::bail!("Usage: budgetbook limit remove <user> <category>");
            }
            let user_id = require_user_id(db, &args[1])?;
            let category_id = require_category_id(db, &args[2])?;
            db.delete_limit(user_id, category_id)?;
            println!("Budget limit removed for {}", args[2]);
            Ok(())
        }
        _ => anyhow::bail!("Usage: budgetbook limit <set|list|remove>"),
    }
}

// ── Reports ───────────────────────────────────────────────────

fn cli_summary(args: &[String], db: &mut Database) -> Result<()> {
    let Some(username) = args.first() else {
        anyhow::bail!("Usage: budgetbook summary <user>");
    };
    let user_id = require_user_id(db, username)?;
    let summary = report::summary(db, user_id)?;

    println!("BudgetBook — {username}");
    println!("{}", "─".repeat(40));
    println!("  Income:    {}", format_amount(summary.total_income));
    println!("  Expenses:  {}", format_amount(summary.total_expenses));

    if !summary.expense_categories.is_empty() {
        println!();
        println!("Spending by Category:");
        for (name, amount) in &summary.expense_categories {
            println!("  {name:<24} {}", format_amount(*amount));
        }
    }

    Ok(())
}

fn cli_report(args: &[String], db: &mut Database) -> Result<()> {
    let Some(username) = args.first() else {
        anyhow::bail!("Usage: budgetbook report <user> [start] [end]");
    };
    let user_id = require_user_id(db, username)?;
    let range = DateRange::parse_or_default(
        args.get(1).map(String::as_str),
        args.get(2).map(String::as_str),
        today(),
    );
    let report = report::range_report(db, user_id, range)?;

    println!(
        "BudgetBook — {username} ({} to {})",
        report.range.start, report.range.end
    );
    println!("{}", "─".repeat(40));
    println!("  Income:    {}", format_amount(report.total_income));
    println!("  Expenses:  {}", format_amount(report.total_expenses));
    println!("  Net:       {}", format_amount(report.net_income));

    if !report.expense_categories.is_empty() {
        println!();
        println!("Spending by Category:");
        for (name, amount) in &report.expense_categories {
            println!("  {name:<24} {}", format_amount(*amount));
        }
    }

    if !report.transactions.is_empty() {
        println!();
        print_entries(&report.transactions);
    }

    Ok(())
}

fn cli_patterns(args: &[String], db: &mut Database) -> Result<()> {
    let Some(username) = args.first() else {
        anyhow::bail!("Usage: budgetbook patterns <user>");
    };
    let user_id = require_user_id(db, username)?;
    let patterns = report::spending_patterns(db, user_id, today())?;

    if patterns.is_empty() {
        println!("No expenses in the last {} days", report::PATTERN_WINDOW_DAYS);
        return Ok(());
    }
    for (month, categories) in &patterns {
        println!("{month}");
        for (name, total) in categories {
            println!("  {name:<24} {}", format_amount(*total));
        }
    }
    Ok(())
}

fn cli_recent(args: &[String], db: &mut Database) -> Result<()> {
    let Some(username) = args.first() else {
        anyhow::bail!("Usage: budgetbook recent <user>");
    };
    let user_id = require_user_id(db, username)?;
    let entries = report::recent_transactions(db, user_id)?;

    if entries.is_empty() {
        println!("No transactions");
        return Ok(());
    }
    print_entries(&entries);
    Ok(())
}

fn cli_alerts(args: &[String], db: &mut Database) -> Result<()> {
    let Some(username) = args.first() else {
        anyhow::bail!("Usage: budgetbook alerts <user>");
    };
    let user_id = require_user_id(db, username)?;
    let alerts = budget::scan_alerts(db, user_id, today())?;

    if alerts.is_empty() {
        println!("All budget limits are within bounds");
        return Ok(());
    }
    for alert in &alerts {
        println!(
            "  {}: spent {} of {} ({:.1}%)",
            alert.category,
            format_amount(alert.spent),
            format_amount(alert.limit),
            alert.percentage
        );
    }
    Ok(())
}

fn print_entries(entries: &[crate::models::LedgerEntry]) {
    println!(
        "{:<12} {:<8} {:>14} {:<16} Description",
        "Date", "Type", "Amount", "Category"
    );
    println!("{}", "─".repeat(72));
    for entry in entries {
        println!(
            "{:<12} {:<8} {:>14} {:<16} {}",
            entry.date.to_string(),
            entry.kind.as_str(),
            format_amount(entry.amount),
            entry.category,
            truncate(&entry.description, 32)
        );
    }
}
