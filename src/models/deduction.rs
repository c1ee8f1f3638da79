use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeductionRule {
    pub name: String,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The deduction and allowance categories the payroll engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DeductionKind {
    Housing,
    Transport,
    EmployeeTax,
    Pension,
    MedicalInsurance,
    Others,
}

impl DeductionKind {
    pub const ALL: [DeductionKind; 6] = [
        DeductionKind::Housing,
        DeductionKind::Transport,
        DeductionKind::EmployeeTax,
        DeductionKind::Pension,
        DeductionKind::MedicalInsurance,
        DeductionKind::Others,
    ];

    /// Name of the rule that configures this category.
    pub fn rule_name(&self) -> &'static str {
        match self {
            DeductionKind::Housing => "Housing",
            DeductionKind::Transport => "Transport",
            DeductionKind::EmployeeTax => "Employee Tax",
            DeductionKind::Pension => "Pension",
            DeductionKind::MedicalInsurance => "Medical Insurance",
            DeductionKind::Others => "Others",
        }
    }

    pub fn from_rule_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.rule_name() == name)
    }
}

impl fmt::Display for DeductionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rule_name())
    }
}
