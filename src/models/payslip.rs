use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::UnknownStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PayslipStatus {
    Pending,
    Paid,
}

impl PayslipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayslipStatus::Pending => "PENDING",
            PayslipStatus::Paid => "PAID",
        }
    }
}

impl TryFrom<String> for PayslipStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING" => Ok(PayslipStatus::Pending),
            "PAID" => Ok(PayslipStatus::Paid),
            _ => Err(UnknownStatus {
                kind: "payslip",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payslip {
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
    #[sqlx(try_from = "String")]
    pub status: PayslipStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Calendar month a payslip or message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayPeriod {
    pub month: i32,
    pub year: i32,
}

impl PayPeriod {
    pub fn new(month: i32, year: i32) -> crate::error::Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(crate::error::Error::InvalidArgument(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if year < 1 {
            return Err(crate::error::Error::InvalidArgument(format!(
                "year must be positive, got {}",
                year
            )));
        }
        Ok(Self { month, year })
    }
}

impl std::fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}
