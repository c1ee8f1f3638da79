use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ErrorKind;
use crate::models::payslip::{Payslip, PayslipStatus};
use crate::services::payslip_service::{PayrollRun, PayslipFailure};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Validate)]
pub struct PeriodPayload {
    #[validate(range(min = 1, max = 12))]
    pub month: i32,
    #[validate(range(min = 1))]
    pub year: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipResponse {
    pub id: String,
    pub employee_code: String,
    pub month: i32,
    pub year: i32,
    pub base_salary: Decimal,
    pub house_amount: Decimal,
    pub transport_amount: Decimal,
    pub employee_taxed_amount: Decimal,
    pub pension_amount: Decimal,
    pub medical_insurance_amount: Decimal,
    pub other_taxed_amount: Decimal,
    pub gross_salary: Decimal,
    pub net_salary: Decimal,
    pub status: PayslipStatus,
}

impl From<Payslip> for PayslipResponse {
    fn from(payslip: Payslip) -> Self {
        Self {
            id: payslip.id,
            employee_code: payslip.employee_code,
            month: payslip.month,
            year: payslip.year,
            base_salary: payslip.base_salary,
            house_amount: payslip.house_amount,
            transport_amount: payslip.transport_amount,
            employee_taxed_amount: payslip.employee_taxed_amount,
            pension_amount: payslip.pension_amount,
            medical_insurance_amount: payslip.medical_insurance_amount,
            other_taxed_amount: payslip.other_taxed_amount,
            gross_salary: payslip.gross_salary,
            net_salary: payslip.net_salary,
            status: payslip.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayslipFailureResponse {
    pub employee_code: String,
    pub kind: ErrorKind,
    pub error: String,
}

impl From<PayslipFailure> for PayslipFailureResponse {
    fn from(failure: PayslipFailure) -> Self {
        Self {
            employee_code: failure.employee_code,
            kind: failure.kind,
            error: failure.message,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayrollRunResponse {
    pub month: i32,
    pub year: i32,
    pub created: Vec<PayslipResponse>,
    pub failures: Vec<PayslipFailureResponse>,
}

impl From<PayrollRun> for PayrollRunResponse {
    fn from(run: PayrollRun) -> Self {
        Self {
            month: run.period.month,
            year: run.period.year,
            created: run.created.into_iter().map(Into::into).collect(),
            failures: run.failures.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub month: i32,
    pub year: i32,
    pub approved: Vec<PayslipResponse>,
}
