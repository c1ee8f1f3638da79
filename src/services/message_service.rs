use std::sync::Arc;
use tracing::{info, warn};

use crate::database::PayrollStore;
use crate::dto::message_dto::CreateMessagePayload;
use crate::error::{Error, Result};
use crate::models::message::{Message, NewMessage};
use crate::models::payslip::{PayPeriod, Payslip, PayslipStatus};
use crate::utils::token::generate_code;

#[derive(Clone)]
pub struct MessageService {
    store: Arc<dyn PayrollStore>,
    organization: String,
}

pub fn salary_credited_body(
    first_name: &str,
    payslip: &Payslip,
    organization: &str,
) -> String {
    format!(
        "Dear {}, your salary for {}/{} from {} amounting to {} has been credited to your account {} successfully.",
        first_name, payslip.month, payslip.year, organization, payslip.net_salary, payslip.employee_code
    )
}

impl MessageService {
    pub fn new(store: Arc<dyn PayrollStore>, organization: impl Into<String>) -> Self {
        Self {
            store,
            organization: organization.into(),
        }
    }

    /// Drafts the salary notice for each PAID payslip of the period whose
    /// employee has no message for it yet. Returns only the new drafts.
    pub async fn draft_messages_for_paid_payslips(&self, month: i32, year: i32) -> Result<Vec<Message>> {
        let period = PayPeriod::new(month, year)?;
        let mut drafted = Vec::new();

        for payslip in self.store.list_payslips_by_period(period).await? {
            if payslip.status != PayslipStatus::Paid {
                continue;
            }
            let Some(employee) = self.store.find_employee(&payslip.employee_code).await? else {
                warn!(employee = %payslip.employee_code, "Paid payslip without employee record");
                continue;
            };
            let new = NewMessage {
                id: generate_code("MSG"),
                employee_code: payslip.employee_code.clone(),
                body: salary_credited_body(&employee.first_name, &payslip, &self.organization),
                month: payslip.month,
                year: payslip.year,
            };
            match self.store.insert_message(new).await {
                Ok(message) => drafted.push(message),
                Err(Error::Conflict(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        info!(period = %period, drafted = drafted.len(), "Drafted salary messages");
        Ok(drafted)
    }

    pub async fn create_for_payslip(&self, payload: CreateMessagePayload) -> Result<Message> {
        let payslip = self
            .store
            .find_payslip(&payload.payslip_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Payslip {} not found", payload.payslip_id)))?;
        let body = payload.body.trim();
        if body.is_empty() {
            return Err(Error::InvalidArgument("Message body is required".to_string()));
        }

        let message = self
            .store
            .insert_message(NewMessage {
                id: generate_code("MSG"),
                employee_code: payslip.employee_code,
                body: body.to_string(),
                month: payslip.month,
                year: payslip.year,
            })
            .await
            .map_err(|e| {
                warn!(payslip = %payload.payslip_id, error = %e, "Message rejected");
                e
            })?;
        info!(message = %message.id, employee = %message.employee_code, "Created message");
        Ok(message)
    }

    pub async fn list_by_employee(&self, employee_code: &str) -> Result<Vec<Message>> {
        self.store.list_messages_by_employee(employee_code).await
    }

    pub async fn list_by_period(&self, month: i32, year: i32) -> Result<Vec<Message>> {
        let period = PayPeriod::new(month, year)?;
        self.store.list_messages_by_period(period).await
    }

    pub async fn list_unsent(&self) -> Result<Vec<Message>> {
        self.store.list_unsent_messages().await
    }

    pub async fn mark_sent(&self, id: &str) -> Result<Message> {
        self.store
            .mark_message_sent(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Message {} not found", id)))
    }
}
