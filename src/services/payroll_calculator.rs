//! Salary arithmetic for payslip generation.
//!
//! Every derived amount is `base_salary × percentage / 100`, computed with
//! exact decimals and rounded half-up to two fractional digits. Withholdings
//! are taken from the base salary, not from the gross salary.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::models::deduction::{DeductionKind, DeductionRule};

const MONEY_SCALE: u32 = 2;
/// Fractional digits allowed on a rule percentage.
const PERCENTAGE_SCALE: u32 = 4;

/// Largest amount a `NUMERIC(15, 2)` column holds.
pub fn max_money() -> Decimal {
    Decimal::new(999_999_999_999_999, MONEY_SCALE)
}

/// Accepts positive amounts that fit the money columns exactly.
pub fn check_money(field: &str, amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidArgument(format!(
            "{} must be positive, got {}",
            field, amount
        )));
    }
    if amount > max_money() {
        return Err(Error::InvalidArgument(format!(
            "{} must not exceed {}, got {}",
            field,
            max_money(),
            amount
        )));
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(Error::InvalidArgument(format!(
            "{} allows at most {} decimal places, got {}",
            field, MONEY_SCALE, amount
        )));
    }
    Ok(())
}

/// Accepts percentages in (0, 100] with at most four decimal places.
pub fn check_percentage(percentage: Decimal) -> Result<()> {
    if percentage <= Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidArgument(format!(
            "Deduction percentage must be greater than 0 and at most 100, got {}",
            percentage
        )));
    }
    if percentage.normalize().scale() > PERCENTAGE_SCALE {
        return Err(Error::InvalidArgument(format!(
            "Deduction percentage allows at most {} decimal places, got {}",
            PERCENTAGE_SCALE, percentage
        )));
    }
    Ok(())
}

/// Rounds half-up (away from zero on a tie) and pins the scale to 2.
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

fn overflow(base: Decimal) -> Error {
    Error::InvalidArgument(format!("Amount {} is out of range", base))
}

pub fn percentage_of(base: Decimal, percentage: Decimal) -> Result<Decimal> {
    base.checked_mul(percentage)
        .and_then(|product| product.checked_div(Decimal::ONE_HUNDRED))
        .map(round_money)
        .ok_or_else(|| overflow(base))
}

/// Percentages for every recognized [`DeductionKind`], built from the stored
/// rules once per payroll run.
#[derive(Debug, Clone, PartialEq)]
pub struct DeductionSchedule {
    rates: BTreeMap<DeductionKind, Decimal>,
}

impl DeductionSchedule {
    /// Fails with InvalidArgument when a recognized category has no rule.
    /// Rules whose names match no category are reported back so the caller can
    /// log them.
    pub fn from_rules(rules: &[DeductionRule]) -> Result<(Self, Vec<String>)> {
        let mut rates = BTreeMap::new();
        let mut unrecognized = Vec::new();
        for rule in rules {
            match DeductionKind::from_rule_name(&rule.name) {
                Some(kind) => {
                    rates.insert(kind, rule.percentage);
                }
                None => unrecognized.push(rule.name.clone()),
            }
        }

        let missing: Vec<&str> = DeductionKind::ALL
            .iter()
            .filter(|kind| !rates.contains_key(kind))
            .map(|kind| kind.rule_name())
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "Missing deduction rules: {}",
                missing.join(", ")
            )));
        }

        Ok((Self { rates }, unrecognized))
    }

    pub fn rate(&self, kind: DeductionKind) -> Decimal {
        self.rates.get(&kind).copied().unwrap_or(Decimal::ZERO)
    }

    fn amount(&self, base: Decimal, kind: DeductionKind) -> Result<Decimal> {
        percentage_of(base, self.rate(kind))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalaryBreakdown {
    pub base_salary: Decimal,
    pub house_amount: Decimal,
    pub transport_amount: Decimal,
    pub gross_salary: Decimal,
    pub employee_taxed_amount: Decimal,
    pub pension_amount: Decimal,
    pub medical_insurance_amount: Decimal,
    pub other_taxed_amount: Decimal,
    pub net_salary: Decimal,
}

impl SalaryBreakdown {
    pub fn total_withholdings(&self) -> Decimal {
        self.employee_taxed_amount
            + self.pension_amount
            + self.medical_insurance_amount
            + self.other_taxed_amount
    }
}

pub fn compute_breakdown(base_salary: Decimal, schedule: &DeductionSchedule) -> Result<SalaryBreakdown> {
    check_money("Base salary", base_salary)?;

    let house_amount = schedule.amount(base_salary, DeductionKind::Housing)?;
    let transport_amount = schedule.amount(base_salary, DeductionKind::Transport)?;
    let gross_salary = base_salary
        .checked_add(house_amount)
        .and_then(|sum| sum.checked_add(transport_amount))
        .map(round_money)
        .ok_or_else(|| overflow(base_salary))?;

    let employee_taxed_amount = schedule.amount(base_salary, DeductionKind::EmployeeTax)?;
    let pension_amount = schedule.amount(base_salary, DeductionKind::Pension)?;
    let medical_insurance_amount = schedule.amount(base_salary, DeductionKind::MedicalInsurance)?;
    let other_taxed_amount = schedule.amount(base_salary, DeductionKind::Others)?;

    let net_salary = [
        employee_taxed_amount,
        pension_amount,
        medical_insurance_amount,
        other_taxed_amount,
    ]
    .iter()
    .try_fold(gross_salary, |net, withheld| net.checked_sub(*withheld))
    .ok_or_else(|| overflow(base_salary))?;

    Ok(SalaryBreakdown {
        base_salary,
        house_amount,
        transport_amount,
        gross_salary,
        employee_taxed_amount,
        pension_amount,
        medical_insurance_amount,
        other_taxed_amount,
        net_salary,
    })
}
