use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::deduction::{DeductionKind, DeductionRule};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DeductionPayload {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeductionResponse {
    pub name: String,
    pub percentage: Decimal,
    /// `None` for names the payroll engine does not recognize.
    pub kind: Option<DeductionKind>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeductionRule> for DeductionResponse {
    fn from(rule: DeductionRule) -> Self {
        Self {
            kind: DeductionKind::from_rule_name(&rule.name),
            name: rule.name,
            percentage: rule.percentage,
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}
