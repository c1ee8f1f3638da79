use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::database::EmploymentInsert;
use crate::models::employment::{Employment, EmploymentStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmploymentPayload {
    #[validate(length(min = 1))]
    pub employee_code: String,
    #[validate(length(min = 1))]
    pub department: String,
    #[validate(length(min = 1))]
    pub position: String,
    pub base_salary: Decimal,
    pub joining_date: NaiveDate,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateEmploymentPayload {
    #[validate(length(min = 1))]
    pub department: Option<String>,
    #[validate(length(min = 1))]
    pub position: Option<String>,
    pub base_salary: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmploymentResponse {
    pub code: String,
    pub employee_code: String,
    pub department: String,
    pub position: String,
    pub base_salary: Decimal,
    pub joining_date: NaiveDate,
    pub status: EmploymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Codes of the employments this one replaced as ACTIVE.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub superseded: Vec<String>,
}

impl From<Employment> for EmploymentResponse {
    fn from(employment: Employment) -> Self {
        Self {
            code: employment.code,
            employee_code: employment.employee_code,
            department: employment.department,
            position: employment.position,
            base_salary: employment.base_salary,
            joining_date: employment.joining_date,
            status: employment.status,
            created_at: employment.created_at,
            updated_at: employment.updated_at,
            superseded: Vec::new(),
        }
    }
}

impl From<EmploymentInsert> for EmploymentResponse {
    fn from(inserted: EmploymentInsert) -> Self {
        Self {
            superseded: inserted.superseded,
            ..Self::from(inserted.employment)
        }
    }
}
