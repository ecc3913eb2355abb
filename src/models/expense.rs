use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Expense {
    pub id: Option<i64>,
    pub user_id: i64,
    pub category_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: String,
}

impl Expense {
    pub fn new(
        user_id: i64,
        category_id: i64,
        amount: Decimal,
        description: String,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: None,
            user_id,
            category_id,
            amount,
            description,
            date,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
