use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::message::Message;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMessagePayload {
    #[validate(length(min = 1))]
    pub payslip_id: String,
    #[validate(length(min = 1))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub id: String,
    pub employee_code: String,
    pub body: String,
    pub month: i32,
    pub year: i32,
    pub sent: bool,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<Message> for MessageResponse {
    fn from(message: Message) -> Self {
        Self {
            id: message.id,
            employee_code: message.employee_code,
            body: message.body,
            month: message.month,
            year: message.year,
            sent: message.sent,
            created_at: message.created_at,
            sent_at: message.sent_at,
        }
    }
}
