use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{EmploymentInsert, PayrollStore};
use crate::error::{Error, Result};
use crate::models::deduction::DeductionRule;
use crate::models::employee::{Employee, EmployeeChanges, EmployeeStatus, NewEmployee};
use crate::models::employment::{Employment, EmploymentChanges, EmploymentStatus, NewEmployment};
use crate::models::message::{Message, NewMessage};
use crate::models::payslip::{PayPeriod, Payslip, PayslipStatus};

#[derive(Default)]
struct Tables {
    deductions: BTreeMap<String, DeductionRule>,
    employees: BTreeMap<String, Employee>,
    // Vectors keep insertion order, which is the creation order callers see.
    employments: Vec<Employment>,
    payslips: Vec<Payslip>,
    messages: Vec<Message>,
}

impl Tables {
    fn employee_is_referenced(&self, code: &str) -> bool {
        self.employments.iter().any(|e| e.employee_code == code)
            || self.payslips.iter().any(|p| p.employee_code == code)
            || self.messages.iter().any(|m| m.employee_code == code)
    }
}

/// Process-local store. Every operation runs under one lock, so each
/// check-and-insert is atomic with respect to concurrent callers.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_employee(mut payslips: Vec<Payslip>) -> Vec<Payslip> {
    payslips.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
    payslips
}

#[async_trait]
impl PayrollStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert_deduction(&self, name: &str, percentage: Decimal) -> Result<DeductionRule> {
        let mut tables = self.tables.write().await;
        if tables.deductions.contains_key(name) {
            return Err(Error::Conflict(format!("Deduction '{}' already exists", name)));
        }
        let now = Utc::now();
        let rule = DeductionRule {
            name: name.to_string(),
            percentage,
            created_at: now,
            updated_at: now,
        };
        tables.deductions.insert(name.to_string(), rule.clone());
        Ok(rule)
    }

    async fn find_deduction(&self, name: &str) -> Result<Option<DeductionRule>> {
        Ok(self.tables.read().await.deductions.get(name).cloned())
    }

    async fn update_deduction(
        &self,
        name: &str,
        new_name: &str,
        percentage: Decimal,
    ) -> Result<Option<DeductionRule>> {
        let mut tables = self.tables.write().await;
        if !tables.deductions.contains_key(name) {
            return Ok(None);
        }
        if name != new_name && tables.deductions.contains_key(new_name) {
            return Err(Error::Conflict(format!(
                "Deduction '{}' already exists",
                new_name
            )));
        }
        let Some(mut rule) = tables.deductions.remove(name) else {
            return Ok(None);
        };
        rule.name = new_name.to_string();
        rule.percentage = percentage;
        rule.updated_at = Utc::now();
        tables.deductions.insert(new_name.to_string(), rule.clone());
        Ok(Some(rule))
    }

    async fn delete_deduction(&self, name: &str) -> Result<bool> {
        Ok(self.tables.write().await.deductions.remove(name).is_some())
    }

    async fn list_deductions(&self) -> Result<Vec<DeductionRule>> {
        Ok(self.tables.read().await.deductions.values().cloned().collect())
    }

    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee> {
        let mut tables = self.tables.write().await;
        if tables.employees.values().any(|e| e.email == new.email) {
            return Err(Error::Conflict(format!("Email {} already exists", new.email)));
        }
        if tables.employees.contains_key(&new.code) {
            return Err(Error::Conflict(format!(
                "Employee code {} already exists",
                new.code
            )));
        }
        let now = Utc::now();
        let employee = Employee {
            code: new.code,
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            password_hash: new.password_hash,
            mobile: new.mobile,
            date_of_birth: new.date_of_birth,
            status: EmployeeStatus::Active,
            roles: new.roles,
            created_at: now,
            updated_at: now,
        };
        tables
            .employees
            .insert(employee.code.clone(), employee.clone());
        Ok(employee)
    }

    async fn find_employee(&self, code: &str) -> Result<Option<Employee>> {
        Ok(self.tables.read().await.employees.get(code).cloned())
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        Ok(self
            .tables
            .read()
            .await
            .employees
            .values()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        Ok(self.tables.read().await.employees.values().cloned().collect())
    }

    async fn update_employee(
        &self,
        code: &str,
        changes: EmployeeChanges,
    ) -> Result<Option<Employee>> {
        let mut tables = self.tables.write().await;
        let Some(employee) = tables.employees.get_mut(code) else {
            return Ok(None);
        };
        employee.first_name = changes.first_name;
        employee.last_name = changes.last_name;
        employee.mobile = changes.mobile;
        employee.date_of_birth = changes.date_of_birth;
        if let Some(roles) = changes.roles {
            employee.roles = roles;
        }
        if let Some(hash) = changes.password_hash {
            employee.password_hash = hash;
        }
        employee.updated_at = Utc::now();
        Ok(Some(employee.clone()))
    }

    async fn delete_employee(&self, code: &str) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(code) {
            return Ok(false);
        }
        if tables.employee_is_referenced(code) {
            return Err(Error::Conflict(format!(
                "Employee {} is referenced by payroll history",
                code
            )));
        }
        Ok(tables.employees.remove(code).is_some())
    }

    async fn insert_employment_superseding(&self, new: NewEmployment) -> Result<EmploymentInsert> {
        let mut tables = self.tables.write().await;
        if !tables.employees.contains_key(&new.employee_code) {
            return Err(Error::NotFound(format!(
                "Employee {} not found",
                new.employee_code
            )));
        }
        if tables.employments.iter().any(|e| e.code == new.code) {
            return Err(Error::Conflict(format!(
                "Employment code {} already exists",
                new.code
            )));
        }

        let now = Utc::now();
        let mut superseded = Vec::new();
        for existing in tables
            .employments
            .iter_mut()
            .filter(|e| e.employee_code == new.employee_code && e.is_active())
        {
            existing.status = EmploymentStatus::Inactive;
            existing.updated_at = now;
            superseded.push(existing.code.clone());
        }

        let employment = Employment {
            code: new.code,
            employee_code: new.employee_code,
            department: new.department,
            position: new.position,
            base_salary: new.base_salary,
            joining_date: new.joining_date,
            status: EmploymentStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.employments.push(employment.clone());
        Ok(EmploymentInsert {
            employment,
            superseded,
        })
    }

    async fn find_employment(&self, code: &str) -> Result<Option<Employment>> {
        Ok(self
            .tables
            .read()
            .await
            .employments
            .iter()
            .find(|e| e.code == code)
            .cloned())
    }

    async fn list_employments_by_employee(&self, employee_code: &str) -> Result<Vec<Employment>> {
        Ok(self
            .tables
            .read()
            .await
            .employments
            .iter()
            .filter(|e| e.employee_code == employee_code)
            .cloned()
            .collect())
    }

    async fn find_active_employment(&self, employee_code: &str) -> Result<Option<Employment>> {
        Ok(self
            .tables
            .read()
            .await
            .employments
            .iter()
            .find(|e| e.employee_code == employee_code && e.is_active())
            .cloned())
    }

    async fn list_active_employments(&self) -> Result<Vec<Employment>> {
        let mut active: Vec<Employment> = self
            .tables
            .read()
            .await
            .employments
            .iter()
            .filter(|e| e.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(active)
    }

    async fn update_employment(
        &self,
        code: &str,
        changes: EmploymentChanges,
    ) -> Result<Option<Employment>> {
        let mut tables = self.tables.write().await;
        let Some(employment) = tables.employments.iter_mut().find(|e| e.code == code) else {
            return Ok(None);
        };
        if let Some(department) = changes.department {
            employment.department = department;
        }
        if let Some(position) = changes.position {
            employment.position = position;
        }
        if let Some(base_salary) = changes.base_salary {
            employment.base_salary = base_salary;
        }
        employment.updated_at = Utc::now();
        Ok(Some(employment.clone()))
    }

    async fn deactivate_employment(&self, code: &str) -> Result<Option<Employment>> {
        let mut tables = self.tables.write().await;
        let Some(employment) = tables.employments.iter_mut().find(|e| e.code == code) else {
            return Ok(None);
        };
        if employment.is_active() {
            employment.status = EmploymentStatus::Inactive;
            employment.updated_at = Utc::now();
        }
        Ok(Some(employment.clone()))
    }

    async fn insert_payslip(&self, payslip: Payslip) -> Result<Payslip> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.payslips.iter().any(|p| {
            p.employee_code == payslip.employee_code
                && p.month == payslip.month
                && p.year == payslip.year
        });
        if duplicate {
            return Err(Error::Conflict(format!(
                "Payslip already exists for employee {} for {}/{}",
                payslip.employee_code, payslip.month, payslip.year
            )));
        }
        if tables.payslips.iter().any(|p| p.id == payslip.id) {
            return Err(Error::Conflict(format!(
                "Payslip id {} already exists",
                payslip.id
            )));
        }
        tables.payslips.push(payslip.clone());
        Ok(payslip)
    }

    async fn find_payslip(&self, id: &str) -> Result<Option<Payslip>> {
        Ok(self
            .tables
            .read()
            .await
            .payslips
            .iter()
            .find(|p| p.id == id)
            .cloned())
    }

    async fn list_payslips_by_employee(&self, employee_code: &str) -> Result<Vec<Payslip>> {
        let mut payslips: Vec<Payslip> = self
            .tables
            .read()
            .await
            .payslips
            .iter()
            .filter(|p| p.employee_code == employee_code)
            .cloned()
            .collect();
        payslips.sort_by_key(|p| (p.year, p.month));
        Ok(payslips)
    }

    async fn list_payslips_by_period(&self, period: PayPeriod) -> Result<Vec<Payslip>> {
        let payslips = self
            .tables
            .read()
            .await
            .payslips
            .iter()
            .filter(|p| p.month == period.month && p.year == period.year)
            .cloned()
            .collect();
        Ok(sorted_by_employee(payslips))
    }

    async fn mark_period_paid(&self, period: PayPeriod) -> Result<Vec<Payslip>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut approved = Vec::new();
        for payslip in tables.payslips.iter_mut().filter(|p| {
            p.month == period.month && p.year == period.year && p.status == PayslipStatus::Pending
        }) {
            payslip.status = PayslipStatus::Paid;
            payslip.updated_at = now;
            approved.push(payslip.clone());
        }
        Ok(sorted_by_employee(approved))
    }

    async fn insert_message(&self, new: NewMessage) -> Result<Message> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.messages.iter().any(|m| {
            m.employee_code == new.employee_code && m.month == new.month && m.year == new.year
        });
        if duplicate {
            return Err(Error::Conflict(format!(
                "Message already exists for employee {} for {}/{}",
                new.employee_code, new.month, new.year
            )));
        }
        if !tables.employees.contains_key(&new.employee_code) {
            return Err(Error::NotFound(format!(
                "Employee {} not found",
                new.employee_code
            )));
        }
        let message = Message {
            id: new.id,
            employee_code: new.employee_code,
            body: new.body,
            month: new.month,
            year: new.year,
            sent: false,
            created_at: Utc::now(),
            sent_at: None,
        };
        tables.messages.push(message.clone());
        Ok(message)
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>> {
        Ok(self
            .tables
            .read()
            .await
            .messages
            .iter()
            .find(|m| m.id == id)
            .cloned())
    }

    async fn list_messages_by_employee(&self, employee_code: &str) -> Result<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.employee_code == employee_code)
            .cloned()
            .collect())
    }

    async fn list_messages_by_period(&self, period: PayPeriod) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| m.month == period.month && m.year == period.year)
            .cloned()
            .collect();
        messages.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(messages)
    }

    async fn list_unsent_messages(&self) -> Result<Vec<Message>> {
        Ok(self
            .tables
            .read()
            .await
            .messages
            .iter()
            .filter(|m| !m.sent)
            .cloned()
            .collect())
    }

    async fn mark_message_sent(&self, id: &str) -> Result<Option<Message>> {
        let mut tables = self.tables.write().await;
        let Some(message) = tables.messages.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        if !message.sent {
            message.sent = true;
            message.sent_at = Some(Utc::now());
        }
        Ok(Some(message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use std::sync::Arc;

    fn new_employee(code: &str, email: &str) -> NewEmployee {
        NewEmployee {
            code: code.to_string(),
            first_name: "Aline".into(),
            last_name: "Uwase".into(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".into(),
            mobile: "+250788000000".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1992, 3, 14).unwrap(),
            roles: vec!["ROLE_EMPLOYEE".into()],
        }
    }

    fn new_employment(code: &str, employee_code: &str) -> NewEmployment {
        NewEmployment {
            code: code.to_string(),
            employee_code: employee_code.to_string(),
            department: "Finance".into(),
            position: "Accountant".into(),
            base_salary: Decimal::from_str("500000").unwrap(),
            joining_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn concurrent_hires_leave_exactly_one_active_employment() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_employee(new_employee("EMP-1", "a@example.com"))
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_employment_superseding(new_employment(&format!("EMPL-{}", i), "EMP-1"))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let all = store.list_employments_by_employee("EMP-1").await.unwrap();
        assert_eq!(all.len(), 16);
        assert_eq!(all.iter().filter(|e| e.is_active()).count(), 1);
    }

    fn pending_payslip(id: &str, employee_code: &str) -> Payslip {
        let now = Utc::now();
        let amount = Decimal::from_str("500000").unwrap();
        Payslip {
            id: id.to_string(),
            employee_code: employee_code.to_string(),
            month: 6,
            year: 2024,
            base_salary: amount,
            house_amount: Decimal::ZERO,
            transport_amount: Decimal::ZERO,
            employee_taxed_amount: Decimal::ZERO,
            pension_amount: Decimal::ZERO,
            medical_insurance_amount: Decimal::ZERO,
            other_taxed_amount: Decimal::ZERO,
            gross_salary: amount,
            net_salary: amount,
            status: PayslipStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn concurrent_payslip_inserts_keep_one_per_period() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = ["PSL-1", "PSL-2"]
            .into_iter()
            .map(|id| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_payslip(pending_payslip(id, "EMP-1")).await })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap());
        }
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(Error::Conflict(_))))
            .count();
        assert_eq!(conflicts, 1);

        let stored = store
            .list_payslips_by_period(PayPeriod::new(6, 2024).unwrap())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let store = MemoryStore::new();
        store
            .insert_employee(new_employee("EMP-1", "a@example.com"))
            .await
            .unwrap();
        let err = store
            .insert_employee(new_employee("EMP-2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn referenced_employee_cannot_be_deleted() {
        let store = MemoryStore::new();
        store
            .insert_employee(new_employee("EMP-1", "a@example.com"))
            .await
            .unwrap();
        store
            .insert_employment_superseding(new_employment("EMPL-1", "EMP-1"))
            .await
            .unwrap();

        let err = store.delete_employee("EMP-1").await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        assert!(!store.delete_employee("EMP-404").await.unwrap());
    }

    #[tokio::test]
    async fn renaming_a_rule_onto_another_is_a_conflict() {
        let store = MemoryStore::new();
        let ten = Decimal::from(10);
        store.insert_deduction("Housing", ten).await.unwrap();
        store.insert_deduction("Transport", ten).await.unwrap();

        let err = store
            .update_deduction("Housing", "Transport", ten)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let renamed = store
            .update_deduction("Housing", "Housing Allowance", Decimal::from(12))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.name, "Housing Allowance");
        assert!(store.find_deduction("Housing").await.unwrap().is_none());
    }
}
