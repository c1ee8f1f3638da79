use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownStatus;
use crate::utils::token::{ROLE_ADMIN, ROLE_MANAGER};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmployeeStatus {
    Active,
    Inactive,
}

impl EmployeeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "ACTIVE",
            EmployeeStatus::Inactive => "INACTIVE",
        }
    }
}

impl TryFrom<String> for EmployeeStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "ACTIVE" => Ok(EmployeeStatus::Active),
            "INACTIVE" => Ok(EmployeeStatus::Inactive),
            _ => Err(UnknownStatus {
                kind: "employee",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    #[sqlx(try_from = "String")]
    pub status: EmployeeStatus,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Most privileged role, carried in the access token.
    pub fn primary_role(&self) -> Option<&str> {
        [ROLE_ADMIN, ROLE_MANAGER]
            .into_iter()
            .find(|wanted| self.roles.iter().any(|r| r == wanted))
            .or_else(|| self.roles.first().map(String::as_str))
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub roles: Vec<String>,
}

/// Replacement values for the mutable part of a profile. A `None` password
/// hash keeps the stored credential.
#[derive(Debug, Clone)]
pub struct EmployeeChanges {
    pub first_name: String,
    pub last_name: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub roles: Option<Vec<String>>,
    pub password_hash: Option<String>,
}
