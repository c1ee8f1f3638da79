use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::{EmploymentInsert, PayrollStore};
use crate::dto::employment_dto::{CreateEmploymentPayload, UpdateEmploymentPayload};
use crate::error::{Error, Result};
use crate::models::employment::{Employment, EmploymentChanges, NewEmployment};
use crate::services::payroll_calculator::check_money;
use crate::utils::token::generate_code;

#[derive(Clone)]
pub struct EmploymentService {
    store: Arc<dyn PayrollStore>,
}

fn check_salary(base_salary: Decimal) -> Result<()> {
    check_money("Base salary", base_salary)
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

impl EmploymentService {
    pub fn new(store: Arc<dyn PayrollStore>) -> Self {
        Self { store }
    }

    /// Starts a new ACTIVE contract. An ACTIVE contract the employee already
    /// holds is moved to INACTIVE in the same atomic step.
    pub async fn create(&self, payload: CreateEmploymentPayload) -> Result<EmploymentInsert> {
        if self
            .store
            .find_employee(&payload.employee_code)
            .await?
            .is_none()
        {
            warn!(employee = %payload.employee_code, "Employment requested for unknown employee");
            return Err(Error::NotFound(format!(
                "Employee {} not found",
                payload.employee_code
            )));
        }
        check_salary(payload.base_salary)?;

        let inserted = self
            .store
            .insert_employment_superseding(NewEmployment {
                code: generate_code("EMPL"),
                employee_code: payload.employee_code,
                department: required("Department", &payload.department)?,
                position: required("Position", &payload.position)?,
                base_salary: payload.base_salary,
                joining_date: payload.joining_date,
            })
            .await?;

        for previous in &inserted.superseded {
            info!(
                employment = %previous,
                replaced_by = %inserted.employment.code,
                "Superseded active employment"
            );
        }
        info!(
            employment = %inserted.employment.code,
            employee = %inserted.employment.employee_code,
            "Created employment"
        );
        Ok(inserted)
    }

    pub async fn list_by_employee(&self, employee_code: &str) -> Result<Vec<Employment>> {
        self.store.list_employments_by_employee(employee_code).await
    }

    pub async fn get_active(&self, employee_code: &str) -> Result<Employment> {
        self.store
            .find_active_employment(employee_code)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "No active employment for employee {}",
                    employee_code
                ))
            })
    }

    pub async fn list_active(&self) -> Result<Vec<Employment>> {
        self.store.list_active_employments().await
    }

    /// Changes department, position or base salary; never the status.
    pub async fn update(&self, code: &str, payload: UpdateEmploymentPayload) -> Result<Employment> {
        if let Some(base_salary) = payload.base_salary {
            check_salary(base_salary)?;
        }
        let changes = EmploymentChanges {
            department: payload
                .department
                .as_deref()
                .map(|d| required("Department", d))
                .transpose()?,
            position: payload
                .position
                .as_deref()
                .map(|p| required("Position", p))
                .transpose()?,
            base_salary: payload.base_salary,
        };
        let employment = self
            .store
            .update_employment(code, changes)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Employment {} not found", code)))?;
        info!(employment = %code, "Updated employment");
        Ok(employment)
    }

    /// One-way transition to INACTIVE. Deactivating an inactive record is a
    /// no-op.
    pub async fn deactivate(&self, code: &str) -> Result<Employment> {
        let employment = self
            .store
            .deactivate_employment(code)
            .await?
            .ok_or_else(|| {
                warn!(employment = %code, "Attempt to deactivate unknown employment");
                Error::NotFound(format!("Employment {} not found", code))
            })?;
        info!(employment = %code, "Deactivated employment");
        Ok(employment)
    }
}
