//! Storage seam for the payroll engine.
//!
//! Services talk to a [`PayrollStore`]; the Postgres backend is used in
//! production and the in-memory backend backs tests and database-less runs.
//! Both backends enforce the same uniqueness contracts atomically: one ACTIVE
//! employment per employee, one payslip and one message per employee and
//! pay period, unique deduction names and unique employee emails.

pub mod memory;
pub mod pool;
pub mod postgres;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::models::deduction::DeductionRule;
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::models::employment::{Employment, EmploymentChanges, NewEmployment};
use crate::models::message::{Message, NewMessage};
use crate::models::payslip::{PayPeriod, Payslip};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Result of inserting an employment: the new ACTIVE record and the codes of
/// the records it superseded.
#[derive(Debug, Clone)]
pub struct EmploymentInsert {
    pub employment: Employment,
    pub superseded: Vec<String>,
}

#[async_trait]
pub trait PayrollStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Conflict when the name is taken.
    async fn insert_deduction(&self, name: &str, percentage: Decimal) -> Result<DeductionRule>;
    async fn find_deduction(&self, name: &str) -> Result<Option<DeductionRule>>;
    /// `None` when `name` is absent; Conflict when `new_name` belongs to a
    /// different rule.
    async fn update_deduction(
        &self,
        name: &str,
        new_name: &str,
        percentage: Decimal,
    ) -> Result<Option<DeductionRule>>;
    async fn delete_deduction(&self, name: &str) -> Result<bool>;
    /// Ordered by name.
    async fn list_deductions(&self) -> Result<Vec<DeductionRule>>;

    /// Conflict when the email or code is taken.
    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee>;
    async fn find_employee(&self, code: &str) -> Result<Option<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>>;
    /// Ordered by code.
    async fn list_employees(&self) -> Result<Vec<Employee>>;
    async fn update_employee(&self, code: &str, changes: EmployeeChanges)
        -> Result<Option<Employee>>;
    /// Conflict when employment, payslip or message history references the
    /// employee.
    async fn delete_employee(&self, code: &str) -> Result<bool>;

    /// Deactivates every ACTIVE employment of the employee and inserts the new
    /// one as ACTIVE in a single atomic step. NotFound when the employee is
    /// unknown.
    async fn insert_employment_superseding(&self, new: NewEmployment) -> Result<EmploymentInsert>;
    async fn find_employment(&self, code: &str) -> Result<Option<Employment>>;
    /// Creation order.
    async fn list_employments_by_employee(&self, employee_code: &str) -> Result<Vec<Employment>>;
    async fn find_active_employment(&self, employee_code: &str) -> Result<Option<Employment>>;
    async fn list_active_employments(&self) -> Result<Vec<Employment>>;
    /// Never touches status.
    async fn update_employment(
        &self,
        code: &str,
        changes: EmploymentChanges,
    ) -> Result<Option<Employment>>;
    async fn deactivate_employment(&self, code: &str) -> Result<Option<Employment>>;

    /// Conflict when a payslip already exists for the employee and period.
    async fn insert_payslip(&self, payslip: Payslip) -> Result<Payslip>;
    async fn find_payslip(&self, id: &str) -> Result<Option<Payslip>>;
    async fn list_payslips_by_employee(&self, employee_code: &str) -> Result<Vec<Payslip>>;
    async fn list_payslips_by_period(&self, period: PayPeriod) -> Result<Vec<Payslip>>;
    /// Moves PENDING payslips of the period to PAID and returns them.
    async fn mark_period_paid(&self, period: PayPeriod) -> Result<Vec<Payslip>>;

    /// Conflict when a message already exists for the employee and period.
    async fn insert_message(&self, new: NewMessage) -> Result<Message>;
    async fn find_message(&self, id: &str) -> Result<Option<Message>>;
    async fn list_messages_by_employee(&self, employee_code: &str) -> Result<Vec<Message>>;
    async fn list_messages_by_period(&self, period: PayPeriod) -> Result<Vec<Message>>;
    async fn list_unsent_messages(&self) -> Result<Vec<Message>>;
    async fn mark_message_sent(&self, id: &str) -> Result<Option<Message>>;
}
