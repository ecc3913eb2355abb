use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Income {
    pub id: Option<i64>,
    pub user_id: i64,
    pub amount: Decimal,
    pub source: String,
    pub date: NaiveDate,
    pub created_at: String,
}

impl Income {
    pub fn new(user_id: i64, amount: Decimal, source: String, date: NaiveDate) -> Self {
        Self {
            id: None,
            user_id,
            amount,
            source,
            date,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
