use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: String,
    pub employee_code: String,
    pub body: String,
    pub month: i32,
    pub year: i32,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub id: String,
    pub employee_code: String,
    pub body: String,
    pub month: i32,
    pub year: i32,
}
