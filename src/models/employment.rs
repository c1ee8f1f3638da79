use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmploymentStatus {
    Active,
    Inactive,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmploymentStatus::Active => "ACTIVE",
            EmploymentStatus::Inactive => "INACTIVE",
        }
    }
}

impl TryFrom<String> for EmploymentStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(EmploymentStatus::Active),
            "INACTIVE" => Ok(EmploymentStatus::Inactive),
            _ => Err(UnknownStatus {
                kind: "employment",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employment {
    pub code: String,
    pub employee_code: String,
    pub department: String,
    pub position: String,
    pub base_salary: Decimal,
    pub joining_date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: EmploymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employment {
    pub fn is_active(&self) -> bool {
        self.status == EmploymentStatus::Active
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployment {
    pub code: String,
    pub employee_code: String,
    pub department: String,
    pub position: String,
    pub base_salary: Decimal,
    pub joining_date: NaiveDate,
}

#[derive(Debug, Clone, Default)]
pub struct EmploymentChanges {
    pub department: Option<String>,
    pub position: Option<String>,
    pub base_salary: Option<Decimal>,
}
