use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::employee::{Employee, EmployeeStatus};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateEmployeePayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[serde(default)]
    pub roles: Vec<String>,
    #[validate(length(min = 1))]
    pub mobile: String,
    pub date_of_birth: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateEmployeePayload {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub roles: Option<Vec<String>>,
    /// Left out or empty keeps the current credential.
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeResponse {
    pub code: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub mobile: String,
    pub date_of_birth: NaiveDate,
    pub status: EmployeeStatus,
    pub roles: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Employee> for EmployeeResponse {
    fn from(employee: Employee) -> Self {
        Self {
            code: employee.code,
            first_name: employee.first_name,
            last_name: employee.last_name,
            email: employee.email,
            mobile: employee.mobile,
            date_of_birth: employee.date_of_birth,
            status: employee.status,
            roles: employee.roles,
            created_at: employee.created_at,
            updated_at: employee.updated_at,
        }
    }
}
