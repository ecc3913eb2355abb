mod schema;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

fn parse_dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap_or_default()
}

fn ensure_non_negative(what: &str, amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        bail!("{what} amount cannot be negative: {amount}");
    }
    Ok(())
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        // Check if schema_version table exists
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        // Existing database - check version and apply migrations
        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    fn seed_default_categories(&mut self) -> Result<()> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM categories", [], |row| row.get(0))?;
        if count > 0 {
            return Ok(());
        }

        let defaults = ["Food", "Transportation", "Entertainment", "Utilities"];

        let tx = self.conn.transaction()?;
        for name in &defaults {
            tx.execute(
                "INSERT OR IGNORE INTO categories (name) VALUES (?1)",
                params![name],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    // ── Users ─────────────────────────────────────────────────

    pub(crate) fn insert_user(&self, user: &User) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    user.username,
                    user.email,
                    user.password_hash,
                    user.created_at,
                ],
            )
            .with_context(|| format!("Failed to create user '{}'", user.username))?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_users(&self) -> Result<Vec<User>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, email, password_hash, created_at FROM users ORDER BY username",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(User {
                id: Some(row.get(0)?),
                username: row.get(1)?,
                email: row.get(2)?,
                password_hash: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_user_by_id(&self, id: i64) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?1",
            params![id],
            |row| {
                Ok(User {
                    id: Some(row.get(0)?),
                    username: row.get(1)?,
                    email: row.get(2)?,
                    password_hash: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        );
        match result {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let result = self.conn.query_row(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?1",
            params![username],
            |row| {
                Ok(User {
                    id: Some(row.get(0)?),
                    username: row.get(1)?,
                    email: row.get(2)?,
                    password_hash: row.get(3)?,
                    created_at: row.get(4)?,
                })
            },
        );
        match result {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a user and everything they own. The schema declares no
    /// ON DELETE CASCADE, so the cascade is spelled out here inside one
    /// transaction.
    pub(crate) fn delete_user(&mut self, id: i64) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM budget_limits WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM expenses WHERE user_id = ?1", params![id])?;
        tx.execute("DELETE FROM incomes WHERE user_id = ?1", params![id])?;
        let deleted = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;
        tx.commit()?;
        if deleted == 0 {
            bail!("user {id} not found");
        }
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(Category {
                id: Some(row.get(0)?),
                name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_category_by_id(&self, id: i64) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name FROM categories WHERE id = ?1",
            params![id],
            |row| {
                Ok(Category {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            },
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        let result = self.conn.query_row(
            "SELECT id, name FROM categories WHERE name = ?1 COLLATE NOCASE",
            params![name],
            |row| {
                Ok(Category {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                })
            },
        );
        match result {
            Ok(c) => Ok(Some(c)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn
            .execute("INSERT INTO categories (name) VALUES (?1)", params![cat.name])
            .with_context(|| format!("Failed to create category '{}'", cat.name))?;
        Ok(self.conn.last_insert_rowid())
    }

    // ── Incomes ───────────────────────────────────────────────

    pub(crate) fn insert_income(&self, income: &Income) -> Result<i64> {
        ensure_non_negative("income", income.amount)?;
        self.conn.execute(
            "INSERT INTO incomes (user_id, amount, source, date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                income.user_id,
                income.amount.to_string(),
                income.source,
                income.date,
                income.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn update_income(&self, income: &Income) -> Result<()> {
        ensure_non_negative("income", income.amount)?;
        let Some(id) = income.id else {
            bail!("cannot update an unsaved income");
        };
        let changed = self.conn.execute(
            "UPDATE incomes SET amount = ?1, source = ?2, date = ?3
             WHERE id = ?4 AND user_id = ?5",
            params![
                income.amount.to_string(),
                income.source,
                income.date,
                id,
                income.user_id,
            ],
        )?;
        if changed == 0 {
            bail!("income {id} not found");
        }
        Ok(())
    }

    pub(crate) fn delete_income(&self, id: i64, user_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM incomes WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            bail!("income {id} not found");
        }
        Ok(())
    }

    pub(crate) fn get_incomes(&self, user_id: i64) -> Result<Vec<Income>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, source, date, created_at
             FROM incomes WHERE user_id = ?1
             ORDER BY date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], Self::income_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_incomes_in_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Income>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, source, date, created_at
             FROM incomes WHERE user_id = ?1 AND date >= ?2 AND date <= ?3
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(params![user_id, start, end], Self::income_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_recent_incomes(&self, user_id: i64, limit: u32) -> Result<Vec<Income>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, amount, source, date, created_at
             FROM incomes WHERE user_id = ?1
             ORDER BY date DESC, id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], Self::income_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn income_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Income> {
        let amount: String = row.get(2)?;
        Ok(Income {
            id: Some(row.get(0)?),
            user_id: row.get(1)?,
            amount: parse_dec(&amount),
            source: row.get(3)?,
            date: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn insert_expense(&self, expense: &Expense) -> Result<i64> {
        ensure_non_negative("expense", expense.amount)?;
        self.conn
            .execute(
                "INSERT INTO expenses (user_id, category_id, amount, description, date, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    expense.user_id,
                    expense.category_id,
                    expense.amount.to_string(),
                    expense.description,
                    expense.date,
                    expense.created_at,
                ],
            )
            .context("Failed to insert expense")?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Edits do not re-run limit evaluation; only new expenses are checked.
    pub(crate) fn update_expense(&self, expense: &Expense) -> Result<()> {
        ensure_non_negative("expense", expense.amount)?;
        let Some(id) = expense.id else {
            bail!("cannot update an unsaved expense");
        };
        let changed = self.conn.execute(
            "UPDATE expenses SET amount = ?1, description = ?2, date = ?3, category_id = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                expense.amount.to_string(),
                expense.description,
                expense.date,
                expense.category_id,
                id,
                expense.user_id,
            ],
        )?;
        if changed == 0 {
            bail!("expense {id} not found");
        }
        Ok(())
    }

    pub(crate) fn delete_expense(&self, id: i64, user_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM expenses WHERE id = ?1 AND user_id = ?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            bail!("expense {id} not found");
        }
        Ok(())
    }

    pub(crate) fn get_expenses(&self, user_id: i64) -> Result<Vec<(Expense, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.user_id, e.category_id, e.amount, e.description, e.date, e.created_at,
                    COALESCE(c.name, '')
             FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
             WHERE e.user_id = ?1
             ORDER BY e.date DESC, e.id DESC",
        )?;
        let rows = stmt.query_map(params![user_id], Self::expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_expenses_in_range(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(Expense, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.user_id, e.category_id, e.amount, e.description, e.date, e.created_at,
                    COALESCE(c.name, '')
             FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
             WHERE e.user_id = ?1 AND e.date >= ?2 AND e.date <= ?3
             ORDER BY e.date, e.id",
        )?;
        let rows = stmt.query_map(params![user_id, start, end], Self::expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_recent_expenses(
        &self,
        user_id: i64,
        limit: u32,
    ) -> Result<Vec<(Expense, String)>> {
        let mut stmt = self.conn.prepare(
            "SELECT e.id, e.user_id, e.category_id, e.amount, e.description, e.date, e.created_at,
                    COALESCE(c.name, '')
             FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
             WHERE e.user_id = ?1
             ORDER BY e.date DESC, e.id DESC LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], Self::expense_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    fn expense_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<(Expense, String)> {
        let amount: String = row.get(3)?;
        Ok((
            Expense {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                category_id: row.get(2)?,
                amount: parse_dec(&amount),
                description: row.get(4)?,
                date: row.get(5)?,
                created_at: row.get(6)?,
            },
            row.get(7)?,
        ))
    }

    // ── Budget limits ─────────────────────────────────────────

    /// One limit per (user, category); setting it again replaces the amount.
    pub(crate) fn upsert_limit(&self, limit: &BudgetLimit) -> Result<()> {
        ensure_non_negative("limit", limit.amount)?;
        self.conn.execute(
            "INSERT INTO budget_limits (user_id, category_id, amount)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, category_id) DO UPDATE SET amount = ?3",
            params![limit.user_id, limit.category_id, limit.amount.to_string()],
        )?;
        Ok(())
    }

    pub(crate) fn get_limits(&self, user_id: i64) -> Result<Vec<BudgetLimit>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, category_id, amount FROM budget_limits WHERE user_id = ?1",
        )?;
        let rows = stmt.query_map(params![user_id], |row| {
            let amount: String = row.get(3)?;
            Ok(BudgetLimit {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                category_id: row.get(2)?,
                amount: parse_dec(&amount),
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn get_limit(&self, user_id: i64, category_id: i64) -> Result<Option<BudgetLimit>> {
        let result = self.conn.query_row(
            "SELECT id, user_id, category_id, amount FROM budget_limits
             WHERE user_id = ?1 AND category_id = ?2",
            params![user_id, category_id],
            |row| {
                let amount: String = row.get(3)?;
                Ok(BudgetLimit {
                    id: Some(row.get(0)?),
                    user_id: row.get(1)?,
                    category_id: row.get(2)?,
                    amount: parse_dec(&amount),
                })
            },
        );
        match result {
            Ok(l) => Ok(Some(l)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn delete_limit(&self, user_id: i64, category_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM budget_limits WHERE user_id = ?1 AND category_id = ?2",
            params![user_id, category_id],
        )?;
        if changed == 0 {
            bail!("no budget limit for that category");
        }
        Ok(())
    }

    // ── Aggregation ───────────────────────────────────────────

    pub(crate) fn sum_incomes(
        &self,
        user_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Decimal> {
        let total: String = match range {
            Some((start, end)) => self.conn.query_row(
                "SELECT CAST(COALESCE(SUM(amount), 0) AS TEXT) FROM incomes
                 WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
                params![user_id, start, end],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT CAST(COALESCE(SUM(amount), 0) AS TEXT) FROM incomes WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?,
        };
        Ok(parse_dec(&total))
    }

    pub(crate) fn sum_expenses(
        &self,
        user_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Decimal> {
        let total: String = match range {
            Some((start, end)) => self.conn.query_row(
                "SELECT CAST(COALESCE(SUM(amount), 0) AS TEXT) FROM expenses
                 WHERE user_id = ?1 AND date >= ?2 AND date <= ?3",
                params![user_id, start, end],
                |row| row.get(0),
            )?,
            None => self.conn.query_row(
                "SELECT CAST(COALESCE(SUM(amount), 0) AS TEXT) FROM expenses WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )?,
        };
        Ok(parse_dec(&total))
    }

    /// Spend for one (user, category) pair within a closed date interval.
    /// Zero rows sum to 0, never NULL.
    pub(crate) fn category_spend(
        &self,
        user_id: i64,
        category_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Decimal> {
        let total: String = self.conn.query_row(
            "SELECT CAST(COALESCE(SUM(amount), 0) AS TEXT) FROM expenses
             WHERE user_id = ?1 AND category_id = ?2 AND date >= ?3 AND date <= ?4",
            params![user_id, category_id, start, end],
            |row| row.get(0),
        )?;
        Ok(parse_dec(&total))
    }

    pub(crate) fn expense_totals_by_category(
        &self,
        user_id: i64,
        range: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<Vec<(String, Decimal)>> {
        let (sql, dates) = match range {
            Some((start, end)) => (
                "SELECT COALESCE(c.name, 'Uncategorized'), CAST(SUM(e.amount) AS TEXT)
                 FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
                 WHERE e.user_id = ?1 AND e.date >= ?2 AND e.date <= ?3
                 GROUP BY COALESCE(c.name, 'Uncategorized')
                 ORDER BY SUM(e.amount) DESC",
                Some((start, end)),
            ),
            None => (
                "SELECT COALESCE(c.name, 'Uncategorized'), CAST(SUM(e.amount) AS TEXT)
                 FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
                 WHERE e.user_id = ?1
                 GROUP BY COALESCE(c.name, 'Uncategorized')
                 ORDER BY SUM(e.amount) DESC",
                None,
            ),
        };

        let mut stmt = self.conn.prepare(sql)?;
        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(String, Decimal)> {
            let name: String = row.get(0)?;
            let amount: String = row.get(1)?;
            Ok((name, parse_dec(&amount)))
        };
        let rows = match dates {
            Some((start, end)) => stmt.query_map(params![user_id, start, end], map_row)?,
            None => stmt.query_map(params![user_id], map_row)?,
        };
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Expense totals bucketed by calendar month and category.
    /// Month keys come back as zero-padded "YYYY-MM".
    pub(crate) fn monthly_category_totals(
        &self,
        user_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<(String, String, Decimal)>> {
        let mut stmt = self.conn.prepare(
            "SELECT strftime('%Y-%m', e.date) AS month,
                    COALESCE(c.name, 'Uncategorized') AS category,
                    CAST(SUM(e.amount) AS TEXT)
             FROM expenses e LEFT JOIN categories c ON e.category_id = c.id
             WHERE e.user_id = ?1 AND e.date >= ?2 AND e.date <= ?3
             GROUP BY month, category
             ORDER BY month, category",
        )?;
        let rows = stmt.query_map(params![user_id, start, end], |row| {
            let month: String = row.get(0)?;
            let category: String = row.get(1)?;
            let amount: String = row.get(2)?;
            Ok((month, category, parse_dec(&amount)))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}
