use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;

use super::{EmploymentInsert, PayrollStore};
use crate::error::{Error, Result};
use crate::models::deduction::DeductionRule;
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};
use crate::models::employment::{Employment, EmploymentChanges, NewEmployment};
use crate::models::message::{Message, NewMessage};
use crate::models::payslip::{PayPeriod, Payslip};

const EMPLOYEE_COLUMNS: &str = "code, first_name, last_name, email, password_hash, mobile, \
     date_of_birth, status, roles, created_at, updated_at";

const EMPLOYMENT_COLUMNS: &str = "code, employee_code, department, position, base_salary, \
     joining_date, status, created_at, updated_at";

const PAYSLIP_COLUMNS: &str = "id, employee_code, month, year, base_salary, house_amount, \
     transport_amount, employee_taxed_amount, pension_amount, medical_insurance_amount, \
     other_taxed_amount, gross_salary, net_salary, status, created_at, updated_at";

const MESSAGE_COLUMNS: &str = "id, employee_code, body, month, year, sent, created_at, sent_at";

/// Maps a unique violation to a Conflict carrying a domain message, leaving
/// every other failure to the generic conversion.
fn conflict_on_unique(err: sqlx::Error, message: impl FnOnce() -> String) -> Error {
    match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => Error::Conflict(message()),
        other => Error::from(other),
    }
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PayrollStore for PgStore {
    fn backend_tag(&self) -> &'static str {
        "postgres"
    }

    async fn insert_deduction(&self, name: &str, percentage: Decimal) -> Result<DeductionRule> {
        sqlx::query_as::<_, DeductionRule>(
            r#"
            INSERT INTO deductions (name, percentage)
            VALUES ($1, $2)
            RETURNING name, percentage, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(percentage)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Deduction '{}' already exists", name)))
    }

    async fn find_deduction(&self, name: &str) -> Result<Option<DeductionRule>> {
        let rule = sqlx::query_as::<_, DeductionRule>(
            "SELECT name, percentage, created_at, updated_at FROM deductions WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(rule)
    }

    async fn update_deduction(
        &self,
        name: &str,
        new_name: &str,
        percentage: Decimal,
    ) -> Result<Option<DeductionRule>> {
        sqlx::query_as::<_, DeductionRule>(
            r#"
            UPDATE deductions
            SET name = $2, percentage = $3, updated_at = NOW()
            WHERE name = $1
            RETURNING name, percentage, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(new_name)
        .bind(percentage)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, || format!("Deduction '{}' already exists", new_name)))
    }

    async fn delete_deduction(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deductions WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_deductions(&self) -> Result<Vec<DeductionRule>> {
        let rules = sqlx::query_as::<_, DeductionRule>(
            "SELECT name, percentage, created_at, updated_at FROM deductions ORDER BY name ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rules)
    }

    async fn insert_employee(&self, new: NewEmployee) -> Result<Employee> {
        let sql = format!(
            r#"
            INSERT INTO employees (code, first_name, last_name, email, password_hash, mobile, date_of_birth, roles)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );
        sqlx::query_as::<_, Employee>(&sql)
            .bind(&new.code)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.mobile)
            .bind(new.date_of_birth)
            .bind(&new.roles)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| conflict_on_unique(e, || format!("Email {} already exists", new.email)))
    }

    async fn find_employee(&self, code: &str) -> Result<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE code = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn find_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE email = $1", EMPLOYEE_COLUMNS);
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn list_employees(&self) -> Result<Vec<Employee>> {
        let sql = format!("SELECT {} FROM employees ORDER BY code ASC", EMPLOYEE_COLUMNS);
        let employees = sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employees)
    }

    async fn update_employee(
        &self,
        code: &str,
        changes: EmployeeChanges,
    ) -> Result<Option<Employee>> {
        let sql = format!(
            r#"
            UPDATE employees
            SET
                first_name = $2,
                last_name = $3,
                mobile = $4,
                date_of_birth = $5,
                roles = COALESCE($6, roles),
                password_hash = COALESCE($7, password_hash),
                updated_at = NOW()
            WHERE code = $1
            RETURNING {}
            "#,
            EMPLOYEE_COLUMNS
        );
        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(code)
            .bind(&changes.first_name)
            .bind(&changes.last_name)
            .bind(&changes.mobile)
            .bind(changes.date_of_birth)
            .bind(&changes.roles)
            .bind(&changes.password_hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employee)
    }

    async fn delete_employee(&self, code: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE code = $1")
            .bind(code)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    Error::Conflict(format!("Employee {} is referenced by payroll history", code))
                }
                other => Error::from(other),
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_employment_superseding(&self, new: NewEmployment) -> Result<EmploymentInsert> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the employee serializes concurrent hires of the same person.
        let owner: Option<String> =
            sqlx::query_scalar("SELECT code FROM employees WHERE code = $1 FOR UPDATE")
                .bind(&new.employee_code)
                .fetch_optional(&mut *tx)
                .await?;
        if owner.is_none() {
            return Err(Error::NotFound(format!(
                "Employee {} not found",
                new.employee_code
            )));
        }

        let superseded: Vec<String> = sqlx::query_scalar(
            r#"
            UPDATE employments
            SET status = 'INACTIVE', updated_at = NOW()
            WHERE employee_code = $1 AND status = 'ACTIVE'
            RETURNING code
            "#,
        )
        .bind(&new.employee_code)
        .fetch_all(&mut *tx)
        .await?;

        let sql = format!(
            r#"
            INSERT INTO employments (code, employee_code, department, position, base_salary, joining_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'ACTIVE')
            RETURNING {}
            "#,
            EMPLOYMENT_COLUMNS
        );
        let employment = sqlx::query_as::<_, Employment>(&sql)
            .bind(&new.code)
            .bind(&new.employee_code)
            .bind(&new.department)
            .bind(&new.position)
            .bind(new.base_salary)
            .bind(new.joining_date)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                conflict_on_unique(e, || {
                    format!(
                        "Employee {} already has an active employment",
                        new.employee_code
                    )
                })
            })?;

        tx.commit().await?;
        Ok(EmploymentInsert {
            employment,
            superseded,
        })
    }

    async fn find_employment(&self, code: &str) -> Result<Option<Employment>> {
        let sql = format!(
            "SELECT {} FROM employments WHERE code = $1",
            EMPLOYMENT_COLUMNS
        );
        let employment = sqlx::query_as::<_, Employment>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employment)
    }

    async fn list_employments_by_employee(&self, employee_code: &str) -> Result<Vec<Employment>> {
        let sql = format!(
            "SELECT {} FROM employments WHERE employee_code = $1 ORDER BY seq ASC",
            EMPLOYMENT_COLUMNS
        );
        let employments = sqlx::query_as::<_, Employment>(&sql)
            .bind(employee_code)
            .fetch_all(&self.pool)
            .await?;
        Ok(employments)
    }

    async fn find_active_employment(&self, employee_code: &str) -> Result<Option<Employment>> {
        let sql = format!(
            "SELECT {} FROM employments WHERE employee_code = $1 AND status = 'ACTIVE'",
            EMPLOYMENT_COLUMNS
        );
        let employment = sqlx::query_as::<_, Employment>(&sql)
            .bind(employee_code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employment)
    }

    async fn list_active_employments(&self) -> Result<Vec<Employment>> {
        let sql = format!(
            "SELECT {} FROM employments WHERE status = 'ACTIVE' ORDER BY employee_code ASC",
            EMPLOYMENT_COLUMNS
        );
        let employments = sqlx::query_as::<_, Employment>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(employments)
    }

    async fn update_employment(
        &self,
        code: &str,
        changes: EmploymentChanges,
    ) -> Result<Option<Employment>> {
        let sql = format!(
            r#"
            UPDATE employments
            SET
                department = COALESCE($2, department),
                position = COALESCE($3, position),
                base_salary = COALESCE($4, base_salary),
                updated_at = NOW()
            WHERE code = $1
            RETURNING {}
            "#,
            EMPLOYMENT_COLUMNS
        );
        let employment = sqlx::query_as::<_, Employment>(&sql)
            .bind(code)
            .bind(&changes.department)
            .bind(&changes.position)
            .bind(changes.base_salary)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employment)
    }

    async fn deactivate_employment(&self, code: &str) -> Result<Option<Employment>> {
        let sql = format!(
            r#"
            UPDATE employments
            SET
                updated_at = CASE WHEN status = 'ACTIVE' THEN NOW() ELSE updated_at END,
                status = 'INACTIVE'
            WHERE code = $1
            RETURNING {}
            "#,
            EMPLOYMENT_COLUMNS
        );
        let employment = sqlx::query_as::<_, Employment>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(employment)
    }

    async fn insert_payslip(&self, payslip: Payslip) -> Result<Payslip> {
        let sql = format!(
            r#"
            INSERT INTO payslips (
                id, employee_code, month, year, base_salary, house_amount,
                transport_amount, employee_taxed_amount, pension_amount,
                medical_insurance_amount, other_taxed_amount, gross_salary,
                net_salary, status, created_at, updated_at
            ) VALUES (
                $1,$2,$3,$4,$5,$6,
                $7,$8,$9,
                $10,$11,$12,
                $13,$14,$15,$16
            )
            RETURNING {}
            "#,
            PAYSLIP_COLUMNS
        );
        sqlx::query_as::<_, Payslip>(&sql)
            .bind(&payslip.id)
            .bind(&payslip.employee_code)
            .bind(payslip.month)
            .bind(payslip.year)
            .bind(payslip.base_salary)
            .bind(payslip.house_amount)
            .bind(payslip.transport_amount)
            .bind(payslip.employee_taxed_amount)
            .bind(payslip.pension_amount)
            .bind(payslip.medical_insurance_amount)
            .bind(payslip.other_taxed_amount)
            .bind(payslip.gross_salary)
            .bind(payslip.net_salary)
            .bind(payslip.status.as_str())
            .bind(payslip.created_at)
            .bind(payslip.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_on_unique(e, || {
                    format!(
                        "Payslip already exists for employee {} for {}/{}",
                        payslip.employee_code, payslip.month, payslip.year
                    )
                })
            })
    }

    async fn find_payslip(&self, id: &str) -> Result<Option<Payslip>> {
        let sql = format!("SELECT {} FROM payslips WHERE id = $1", PAYSLIP_COLUMNS);
        let payslip = sqlx::query_as::<_, Payslip>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(payslip)
    }

    async fn list_payslips_by_employee(&self, employee_code: &str) -> Result<Vec<Payslip>> {
        let sql = format!(
            "SELECT {} FROM payslips WHERE employee_code = $1 ORDER BY year ASC, month ASC",
            PAYSLIP_COLUMNS
        );
        let payslips = sqlx::query_as::<_, Payslip>(&sql)
            .bind(employee_code)
            .fetch_all(&self.pool)
            .await?;
        Ok(payslips)
    }

    async fn list_payslips_by_period(&self, period: PayPeriod) -> Result<Vec<Payslip>> {
        let sql = format!(
            "SELECT {} FROM payslips WHERE month = $1 AND year = $2 ORDER BY employee_code ASC",
            PAYSLIP_COLUMNS
        );
        let payslips = sqlx::query_as::<_, Payslip>(&sql)
            .bind(period.month)
            .bind(period.year)
            .fetch_all(&self.pool)
            .await?;
        Ok(payslips)
    }

    async fn mark_period_paid(&self, period: PayPeriod) -> Result<Vec<Payslip>> {
        let sql = format!(
            r#"
            UPDATE payslips
            SET status = 'PAID', updated_at = NOW()
            WHERE month = $1 AND year = $2 AND status = 'PENDING'
            RETURNING {}
            "#,
            PAYSLIP_COLUMNS
        );
        let mut payslips = sqlx::query_as::<_, Payslip>(&sql)
            .bind(period.month)
            .bind(period.year)
            .fetch_all(&self.pool)
            .await?;
        payslips.sort_by(|a, b| a.employee_code.cmp(&b.employee_code));
        Ok(payslips)
    }

    async fn insert_message(&self, new: NewMessage) -> Result<Message> {
        let sql = format!(
            r#"
            INSERT INTO messages (id, employee_code, body, month, year)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        sqlx::query_as::<_, Message>(&sql)
            .bind(&new.id)
            .bind(&new.employee_code)
            .bind(&new.body)
            .bind(new.month)
            .bind(new.year)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                conflict_on_unique(e, || {
                    format!(
                        "Message already exists for employee {} for {}/{}",
                        new.employee_code, new.month, new.year
                    )
                })
            })
    }

    async fn find_message(&self, id: &str) -> Result<Option<Message>> {
        let sql = format!("SELECT {} FROM messages WHERE id = $1", MESSAGE_COLUMNS);
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }

    async fn list_messages_by_employee(&self, employee_code: &str) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE employee_code = $1 ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        );
        let messages = sqlx::query_as::<_, Message>(&sql)
            .bind(employee_code)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn list_messages_by_period(&self, period: PayPeriod) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE month = $1 AND year = $2 ORDER BY employee_code ASC",
            MESSAGE_COLUMNS
        );
        let messages = sqlx::query_as::<_, Message>(&sql)
            .bind(period.month)
            .bind(period.year)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn list_unsent_messages(&self) -> Result<Vec<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE sent = FALSE ORDER BY created_at ASC",
            MESSAGE_COLUMNS
        );
        let messages = sqlx::query_as::<_, Message>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(messages)
    }

    async fn mark_message_sent(&self, id: &str) -> Result<Option<Message>> {
        let sql = format!(
            r#"
            UPDATE messages
            SET sent = TRUE, sent_at = COALESCE(sent_at, NOW())
            WHERE id = $1
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        );
        let message = sqlx::query_as::<_, Message>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(message)
    }
}
