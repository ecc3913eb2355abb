use rust_decimal::Decimal;

/// Monthly spending ceiling for one (user, category) pair.
/// The store enforces at most one row per pair; writes are upserts.
#[derive(Debug, Clone)]
pub struct BudgetLimit {
    pub id: Option<i64>,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
}

impl BudgetLimit {
    pub fn new(user_id: i64, category_id: i64, amount: Decimal) -> Self {
        Self {
            id: None,
            user_id,
            category_id,
            amount,
        }
    }
}
