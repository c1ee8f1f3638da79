//! Payroll engine: one payslip per active employment per pay period, and the
//! PENDING → PAID approval step.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::PayrollStore;
use crate::error::{Error, ErrorKind, Result};
use crate::models::employment::Employment;
use crate::models::payslip::{PayPeriod, Payslip, PayslipStatus};
use crate::services::payroll_calculator::{compute_breakdown, DeductionSchedule};
use crate::services::payslip_renderer::{PayslipRenderer, PayslipSnapshot, RenderedDocument};
use crate::utils::token::generate_code;

#[derive(Debug, Clone)]
pub struct PayslipFailure {
    pub employee_code: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Outcome of a processing run. Failures are isolated per employee, so a
/// conflict for one employee does not stop the others.
#[derive(Debug, Clone)]
pub struct PayrollRun {
    pub period: PayPeriod,
    pub created: Vec<Payslip>,
    pub failures: Vec<PayslipFailure>,
}

#[derive(Clone)]
pub struct PayslipService {
    store: Arc<dyn PayrollStore>,
    renderer: Arc<dyn PayslipRenderer>,
    organization: String,
}

async fn create_payslip(
    store: &dyn PayrollStore,
    employment: &Employment,
    period: PayPeriod,
    schedule: &DeductionSchedule,
) -> Result<Payslip> {
    let breakdown = compute_breakdown(employment.base_salary, schedule)?;
    let now = Utc::now();
    let payslip = Payslip {
        id: generate_code("PSL"),
        employee_code: employment.employee_code.clone(),
        month: period.month,
        year: period.year,
        base_salary: breakdown.base_salary,
        house_amount: breakdown.house_amount,
        transport_amount: breakdown.transport_amount,
        employee_taxed_amount: breakdown.employee_taxed_amount,
        pension_amount: breakdown.pension_amount,
        medical_insurance_amount: breakdown.medical_insurance_amount,
        other_taxed_amount: breakdown.other_taxed_amount,
        gross_salary: breakdown.gross_salary,
        net_salary: breakdown.net_salary,
        status: PayslipStatus::Pending,
        created_at: now,
        updated_at: now,
    };
    let saved = store.insert_payslip(payslip).await?;
    info!(
        payslip = %saved.id,
        employee = %saved.employee_code,
        period = %period,
        net = %saved.net_salary,
        "Created payslip"
    );
    Ok(saved)
}

impl PayslipService {
    pub fn new(
        store: Arc<dyn PayrollStore>,
        renderer: Arc<dyn PayslipRenderer>,
        organization: impl Into<String>,
    ) -> Self {
        Self {
            store,
            renderer,
            organization: organization.into(),
        }
    }

    /// Generates PENDING payslips for every ACTIVE employment.
    ///
    /// The whole run is rejected before anything is written when the period
    /// is invalid or a recognized deduction rule is missing. Otherwise each
    /// employee is processed independently and concurrently; an existing
    /// payslip for the period or an invalid salary is recorded as a failure
    /// for that employee only.
    pub async fn process_payslips(&self, month: i32, year: i32) -> Result<PayrollRun> {
        let period = PayPeriod::new(month, year)?;
        let employments = self.store.list_active_employments().await?;
        let rules = self.store.list_deductions().await?;
        let (schedule, unrecognized) = DeductionSchedule::from_rules(&rules).map_err(|e| {
            warn!(period = %period, error = %e, "Payroll run rejected");
            e
        })?;
        for name in &unrecognized {
            warn!(deduction = %name, "Ignoring deduction rule with unrecognized name");
        }

        let already_issued: HashSet<String> = self
            .store
            .list_payslips_by_period(period)
            .await?
            .into_iter()
            .map(|p| p.employee_code)
            .collect();

        info!(period = %period, employments = employments.len(), "Processing payslips");

        let schedule = Arc::new(schedule);
        let mut run = PayrollRun {
            period,
            created: Vec::new(),
            failures: Vec::new(),
        };
        let mut tasks = Vec::new();
        for employment in employments {
            if already_issued.contains(&employment.employee_code) {
                let err = Error::Conflict(format!(
                    "Payslip already exists for employee {} for {}",
                    employment.employee_code, period
                ));
                run.failures.push(PayslipFailure {
                    employee_code: employment.employee_code,
                    kind: err.kind(),
                    message: err.to_string(),
                });
                continue;
            }
            let store = self.store.clone();
            let schedule = schedule.clone();
            let employee_code = employment.employee_code.clone();
            let handle = tokio::spawn(async move {
                create_payslip(store.as_ref(), &employment, period, &schedule).await
            });
            tasks.push((employee_code, handle));
        }

        for (employee_code, handle) in tasks {
            // A panicked or cancelled task only fails its own employee.
            let result = handle.await.unwrap_or_else(|e| {
                Err(Error::Internal(format!("payslip task failed: {}", e)))
            });
            match result {
                Ok(payslip) => run.created.push(payslip),
                Err(err) => run.failures.push(PayslipFailure {
                    employee_code,
                    kind: err.kind(),
                    message: err.to_string(),
                }),
            }
        }

        for failure in &run.failures {
            warn!(
                employee = %failure.employee_code,
                period = %period,
                error = %failure.message,
                "Payslip not created"
            );
        }
        run.created
            .sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        run.failures
            .sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        info!(
            period = %period,
            created = run.created.len(),
            failed = run.failures.len(),
            "Processed payslips"
        );
        Ok(run)
    }

    pub async fn get(&self, id: &str) -> Result<Payslip> {
        self.store
            .find_payslip(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Payslip {} not found", id)))
    }

    pub async fn get_by_employee(&self, employee_code: &str) -> Result<Vec<Payslip>> {
        self.store.list_payslips_by_employee(employee_code).await
    }

    pub async fn get_by_period(&self, month: i32, year: i32) -> Result<Vec<Payslip>> {
        let period = PayPeriod::new(month, year)?;
        self.store.list_payslips_by_period(period).await
    }

    /// Moves the period's PENDING payslips to PAID. PAID payslips are left
    /// alone, so approving twice is harmless. Returns the newly paid ones.
    pub async fn approve_payslips(&self, month: i32, year: i32) -> Result<Vec<Payslip>> {
        let period = PayPeriod::new(month, year)?;
        let approved = self.store.mark_period_paid(period).await?;
        info!(period = %period, approved = approved.len(), "Approved payslips");
        Ok(approved)
    }

    pub async fn render_payslip(&self, id: &str) -> Result<RenderedDocument> {
        let payslip = self.get(id).await?;
        let employee_name = match self.store.find_employee(&payslip.employee_code).await? {
            Some(employee) => employee.full_name(),
            None => payslip.employee_code.clone(),
        };
        self.renderer.render(&PayslipSnapshot {
            payslip,
            employee_name,
            organization: self.organization.clone(),
        })
    }
}
