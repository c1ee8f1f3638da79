pub mod deduction;
pub mod employee;
pub mod employment;
pub mod message;
pub mod payslip;

/// Raised when a status column holds a value this crate does not know.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} status: {value}")]
pub struct UnknownStatus {
    pub kind: &'static str,
    pub value: String,
}
