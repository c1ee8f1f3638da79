pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::PayrollStore;
use crate::error::Result;
use crate::services::{
    auth_service::AuthService,
    deduction_service::DeductionService,
    employee_service::EmployeeService,
    employment_service::EmploymentService,
    message_service::MessageService,
    notification_service::{HttpMailer, LogMailer, Mailer, NotificationService},
    payslip_renderer::{PayslipRenderer, TextPayslipRenderer},
    payslip_service::PayslipService,
};
use crate::utils::token::JwtSettings;

/// Settings the services need, separate from [`Config`] so tests can build
/// an [`AppState`] without touching the environment.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub organization_name: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    pub mail_timeout_secs: u64,
}

impl From<&Config> for AppSettings {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiration_minutes: config.jwt_expiration_minutes,
            organization_name: config.organization_name.clone(),
            mail_relay_url: config.mail_relay_url.clone(),
            mail_from: config.mail_from.clone(),
            mail_timeout_secs: config.mail_timeout_secs,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PayrollStore>,
    pub jwt: JwtSettings,
    pub auth_service: AuthService,
    pub employee_service: EmployeeService,
    pub deduction_service: DeductionService,
    pub employment_service: EmploymentService,
    pub payslip_service: PayslipService,
    pub message_service: MessageService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(store: Arc<dyn PayrollStore>, settings: AppSettings) -> Result<Self> {
        let mailer: Arc<dyn Mailer> = match settings.mail_relay_url.clone() {
            Some(url) => Arc::new(HttpMailer::new(
                url,
                settings.mail_from.clone(),
                Duration::from_secs(settings.mail_timeout_secs.max(1)),
            )?),
            None => Arc::new(LogMailer),
        };
        Ok(Self::with_mailer(store, settings, mailer))
    }

    pub fn with_mailer(
        store: Arc<dyn PayrollStore>,
        settings: AppSettings,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        let jwt = JwtSettings::new(settings.jwt_secret, settings.jwt_expiration_minutes);
        let renderer: Arc<dyn PayslipRenderer> = Arc::new(TextPayslipRenderer);

        Self {
            auth_service: AuthService::new(store.clone(), jwt.clone()),
            employee_service: EmployeeService::new(store.clone()),
            deduction_service: DeductionService::new(store.clone()),
            employment_service: EmploymentService::new(store.clone()),
            payslip_service: PayslipService::new(
                store.clone(),
                renderer,
                settings.organization_name.clone(),
            ),
            message_service: MessageService::new(store.clone(), settings.organization_name),
            notification_service: NotificationService::new(store.clone(), mailer),
            jwt,
            store,
        }
    }
}
