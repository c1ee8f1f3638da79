use rust_decimal::Decimal;
use std::fmt::Write;

use crate::error::{Error, Result};
use crate::models::payslip::Payslip;

/// Everything a renderer needs to lay out one payslip.
#[derive(Debug, Clone)]
pub struct PayslipSnapshot {
    pub payslip: Payslip,
    pub employee_name: String,
    pub organization: String,
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub content_type: &'static str,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
pub trait PayslipRenderer: Send + Sync {
    fn render(&self, snapshot: &PayslipSnapshot) -> Result<RenderedDocument>;
}

/// Plain-text statement; a PDF backend can be dropped in behind the same trait.
#[derive(Debug, Clone, Default)]
pub struct TextPayslipRenderer;

impl TextPayslipRenderer {
    fn line(out: &mut String, label: &str, amount: Decimal) -> std::fmt::Result {
        writeln!(out, "{:<28}{:>18}", label, amount)
    }
}

impl PayslipRenderer for TextPayslipRenderer {
    fn render(&self, snapshot: &PayslipSnapshot) -> Result<RenderedDocument> {
        let p = &snapshot.payslip;
        let mut out = String::new();
        let write = |out: &mut String| -> std::fmt::Result {
            writeln!(out, "{}", snapshot.organization)?;
            writeln!(out, "Payslip {} for {}/{}", p.id, p.month, p.year)?;
            writeln!(out, "Employee: {} ({})", snapshot.employee_name, p.employee_code)?;
            writeln!(out, "Status: {}", p.status.as_str())?;
            writeln!(out)?;
            Self::line(out, "Base salary", p.base_salary)?;
            Self::line(out, "Housing allowance", p.house_amount)?;
            Self::line(out, "Transport allowance", p.transport_amount)?;
            Self::line(out, "Gross salary", p.gross_salary)?;
            Self::line(out, "Employee tax", p.employee_taxed_amount)?;
            Self::line(out, "Pension", p.pension_amount)?;
            Self::line(out, "Medical insurance", p.medical_insurance_amount)?;
            Self::line(out, "Other deductions", p.other_taxed_amount)?;
            Self::line(out, "Net salary", p.net_salary)
        };
        write(&mut out).map_err(|e| Error::Internal(format!("render failed: {}", e)))?;

        Ok(RenderedDocument {
            content_type: "text/plain; charset=utf-8",
            file_name: format!("payslip-{}-{}-{:02}.txt", p.employee_code, p.year, p.month),
            bytes: out.into_bytes(),
        })
    }
}
