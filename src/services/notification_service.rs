//! Outbound delivery of drafted messages.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::database::PayrollStore;
use crate::error::{Error, Result};
use crate::models::message::Message;

pub const SALARY_SUBJECT: &str = "Salary payment notification";

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Posts each mail as JSON to an HTTP mail relay.
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    relay_url: String,
    from: String,
}

impl HttpMailer {
    /// `timeout` bounds each request so a stalled relay cannot hold up a
    /// delivery sweep.
    pub fn new(relay_url: String, from: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            relay_url,
            from,
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let resp = self
            .client
            .post(&self.relay_url)
            .json(&json!({
                "from": self.from,
                "to": to,
                "subject": subject,
                "text": body,
            }))
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().await.unwrap_or_default();
            return Err(Error::Internal(format!(
                "Mail relay returned {}: {}",
                status, detail
            )));
        }
        Ok(())
    }
}

/// Used when no relay is configured: the mail is only logged.
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        info!(to = %to, subject = %subject, body = %body, "Mail relay not configured; logging message");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationService {
    store: Arc<dyn PayrollStore>,
    mailer: Arc<dyn Mailer>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn PayrollStore>, mailer: Arc<dyn Mailer>) -> Self {
        Self { store, mailer }
    }

    async fn deliver_one(&self, message: &Message) -> Result<()> {
        let employee = self
            .store
            .find_employee(&message.employee_code)
            .await?
            .ok_or_else(|| {
                Error::NotFound(format!("Employee {} not found", message.employee_code))
            })?;
        self.mailer
            .send(&employee.email, SALARY_SUBJECT, &message.body)
            .await?;
        self.store.mark_message_sent(&message.id).await?;
        Ok(())
    }

    /// Sends every unsent message once. A message is marked sent only after
    /// the mailer accepts it; failures stay unsent for the next sweep.
    pub async fn deliver_pending(&self) -> Result<DeliveryReport> {
        let pending = self.store.list_unsent_messages().await?;
        let mut report = DeliveryReport::default();

        for message in &pending {
            report.attempted += 1;
            match self.deliver_one(message).await {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    report.failed += 1;
                    error!(message = %message.id, employee = %message.employee_code, error = %err, "Message delivery failed");
                }
            }
        }

        if report.attempted > 0 {
            info!(
                attempted = report.attempted,
                delivered = report.delivered,
                failed = report.failed,
                "Delivery sweep finished"
            );
        }
        Ok(report)
    }

    /// Runs [`Self::deliver_pending`] forever on a fixed interval.
    pub async fn run_sweeper(self, interval: std::time::Duration) {
        loop {
            if let Err(err) = self.deliver_pending().await {
                warn!(error = %err, "Delivery sweep failed");
            }
            tokio::time::sleep(interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::models::employee::NewEmployee;
    use crate::models::message::NewMessage;
    use chrono::NaiveDate;
    use mockall::predicate::eq;

    async fn seed(store: &dyn PayrollStore, code: &str) {
        store
            .insert_employee(NewEmployee {
                code: code.to_string(),
                first_name: "Aline".into(),
                last_name: "Uwase".into(),
                email: format!("{}@example.com", code.to_lowercase()),
                password_hash: "hash".into(),
                mobile: "+250788000004".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1991, 3, 3).unwrap(),
                roles: vec!["ROLE_EMPLOYEE".into()],
            })
            .await
            .unwrap();
        store
            .insert_message(NewMessage {
                id: format!("MSG-{}", code),
                employee_code: code.to_string(),
                body: format!("hello {}", code),
                month: 6,
                year: 2024,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn delivered_messages_are_marked_sent() {
        let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
        seed(store.as_ref(), "EMP-A").await;

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .with(eq("emp-a@example.com"), eq(SALARY_SUBJECT), eq("hello EMP-A"))
            .times(1)
            .returning(|_, _, _| Ok(()));
        let svc = NotificationService::new(store.clone(), Arc::new(mailer));

        let report = svc.deliver_pending().await.unwrap();
        assert_eq!(
            report,
            DeliveryReport {
                attempted: 1,
                delivered: 1,
                failed: 0
            }
        );
        assert!(store.list_unsent_messages().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delivery_stays_unsent() {
        let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
        seed(store.as_ref(), "EMP-A").await;
        seed(store.as_ref(), "EMP-B").await;

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .times(2)
            .returning(|to, _, _| {
                if to.starts_with("emp-b") {
                    Err(Error::Internal("relay down".into()))
                } else {
                    Ok(())
                }
            });
        let svc = NotificationService::new(store.clone(), Arc::new(mailer));

        let report = svc.deliver_pending().await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed, 1);

        let unsent = store.list_unsent_messages().await.unwrap();
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].employee_code, "EMP-B");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
        seed(store.as_ref(), "EMP-A").await;
        let svc = NotificationService::new(store, Arc::new(LogMailer));
        tokio_test::assert_ok!(svc.deliver_pending().await);
    }

    #[tokio::test]
    async fn stalled_relay_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mailer = HttpMailer::new(
            format!("http://{}/send", addr),
            "payroll@example.com".into(),
            Duration::from_millis(200),
        )
        .unwrap();
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            mailer.send("aline@example.com", SALARY_SUBJECT, "hello"),
        )
        .await
        .expect("mailer should give up before the outer deadline");
        assert!(matches!(outcome, Err(Error::Reqwest(_))));
        server.abort();
    }
}
