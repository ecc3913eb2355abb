use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

use crate::db::Database;

/// Outcome of checking a candidate expense against a monthly limit.
/// A breach is a normal decision, not an error; the caller decides
/// whether to block or warn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LimitDecision {
    Allow,
    Deny { limit: Decimal },
}

/// Limit breach found by the alert scanner.
#[derive(Debug, Clone)]
pub struct BudgetAlert {
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub percentage: Decimal,
}

/// First day of `date`'s calendar month.
pub(crate) fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Decide whether a candidate expense fits under the (user, category)
/// monthly limit.
///
/// The month window anchors to the evaluation time `as_of`, not the
/// candidate's own date, and runs [first of month, as_of] inclusive.
/// Spending exactly up to the limit is allowed; only exceeding it denies.
/// Pure read: the caller persists the expense only on Allow.
pub(crate) fn evaluate_limit(
    db: &Database,
    user_id: i64,
    category_id: i64,
    candidate: Decimal,
    as_of: NaiveDate,
) -> Result<LimitDecision> {
    let Some(limit) = db.get_limit(user_id, category_id)? else {
        return Ok(LimitDecision::Allow);
    };

    let spent = db.category_spend(user_id, category_id, month_start(as_of), as_of)?;

    if spent + candidate > limit.amount {
        Ok(LimitDecision::Deny {
            limit: limit.amount,
        })
    } else {
        Ok(LimitDecision::Allow)
    }
}

/// Scan every limit the user owns and report the ones already breached
/// this month. Returns an empty list when nothing is over.
pub(crate) fn scan_alerts(
    db: &Database,
    user_id: i64,
    as_of: NaiveDate,
) -> Result<Vec<BudgetAlert>> {
    let start = month_start(as_of);
    let mut alerts = Vec::new();

    for limit in db.get_limits(user_id)? {
        let spent = db.category_spend(user_id, limit.category_id, start, as_of)?;
        if spent <= limit.amount {
            continue;
        }

        let category = db
            .get_category_by_id(limit.category_id)?
            .map(|c| c.name)
            .unwrap_or_else(|| "Uncategorized".into());
        // A zero limit with any positive spend is a breach; report it as
        // fully consumed rather than dividing by zero.
        let percentage = if limit.amount > Decimal::ZERO {
            spent / limit.amount * Decimal::ONE_HUNDRED
        } else {
            Decimal::ONE_HUNDRED
        };

        alerts.push(BudgetAlert {
            category,
            limit: limit.amount,
            spent,
            percentage,
        });
    }

    Ok(alerts)
}
