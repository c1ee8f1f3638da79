use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::PayrollStore;
use crate::dto::employee_dto::{CreateEmployeePayload, UpdateEmployeePayload};
use crate::error::{Error, Result};
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::utils::crypto::hash_password;
use crate::utils::token::generate_code;

pub const DEFAULT_ROLE: &str = "ROLE_EMPLOYEE";

#[derive(Clone)]
pub struct EmployeeService {
    store: Arc<dyn PayrollStore>,
}

fn check_birth_date(date_of_birth: chrono::NaiveDate) -> Result<()> {
    if date_of_birth >= Utc::now().date_naive() {
        return Err(Error::InvalidArgument(
            "Date of birth must be in the past".into(),
        ));
    }
    Ok(())
}

impl EmployeeService {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: CreateEmployeePayload) -> Result<Employee> {
        check_birth_date(payload.date_of_birth)?;
        let email = payload.email.trim().to_lowercase();
        if self.store.find_employee_by_email(&email).await?.is_some() {
            warn!(email = %email, "Attempt to create employee with existing email");
            return Err(Error::Conflict(format!("Email {} already exists", email)));
        }

        let roles = if payload.roles.is_empty() {
            vec![DEFAULT_ROLE.to_string()]
        } else {
            payload.roles
        };
        let employee = self
            .store
            .insert_employee(NewEmployee {
                code: generate_code("EMP"),
                first_name: payload.first_name,
                last_name: payload.last_name,
                email,
                password_hash: hash_password(&payload.password)?,
                mobile: payload.mobile,
                date_of_birth: payload.date_of_birth,
                roles,
            })
            .await?;
        info!(employee = %employee.code, email = %employee.email, "Created employee");
        Ok(employee)
    }

    pub async fn list_all(&self) -> Result<Vec<Employee>> {
        self.store.list_employees().await
    }

    pub async fn get_by_code(&self, code: &str) -> Result<Employee> {
        self.store.find_employee(code).await?.ok_or_else(|| {
            warn!(employee = %code, "Employee not found");
            Error::NotFound(format!("Employee {} not found", code))
        })
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Employee> {
        let email = email.trim().to_lowercase();
        self.store
            .find_employee_by_email(&email)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Employee with email {} not found", email)))
    }

    /// Replaces the mutable profile fields. The credential is re-hashed only
    /// when a non-empty password is supplied.
    pub async fn update(&self, code: &str, payload: UpdateEmployeePayload) -> Result<Employee> {
        check_birth_date(payload.date_of_birth)?;
        let password_hash = match payload.password.as_deref() {
            Some(password) if !password.is_empty() => Some(hash_password(password)?),
            _ => None,
        };
        let credential_changed = password_hash.is_some();

        let employee = self
            .store
            .update_employee(
                code,
                EmployeeChanges {
                    first_name: payload.first_name,
                    last_name: payload.last_name,
                    mobile: payload.mobile,
                    date_of_birth: payload.date_of_birth,
                    roles: payload.roles.filter(|roles| !roles.is_empty()),
                    password_hash,
                },
            )
            .await?
            .ok_or_else(|| {
                warn!(employee = %code, "Employee not found for update");
                Error::NotFound(format!("Employee {} not found", code))
            })?;
        info!(employee = %code, credential_changed, "Updated employee");
        Ok(employee)
    }

    pub async fn delete(&self, code: &str) -> Result<()> {
        if !self.store.delete_employee(code).await? {
            warn!(employee = %code, "Attempt to delete non-existent employee");
            return Err(Error::NotFound(format!("Employee {} not found", code)));
        }
        info!(employee = %code, "Deleted employee");
        Ok(())
    }
}
