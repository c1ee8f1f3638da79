use std::sync::Arc;
use tracing::{info, warn};

use crate::database::PayrollStore;
use crate::dto::auth_dto::{LoginPayload, LoginResponse};
use crate::error::{Error, Result};
use crate::models::employee::EmployeeStatus;
use crate::utils::crypto::verify_password;
use crate::utils::token::JwtSettings;

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn PayrollStore>,
    jwt: JwtSettings,
}

impl AuthService {
    pub fn new(store: Arc<dyn PayrollStore>, jwt: JwtSettings) -> Self {
        Self { store, jwt }
    }

    pub fn jwt(&self) -> &JwtSettings {
        &self.jwt
    }

    pub async fn login(&self, payload: LoginPayload) -> Result<LoginResponse> {
        let email = payload.email.trim().to_lowercase();
        let rejected = || Error::Unauthorized("Invalid email or password".to_string());

        let Some(employee) = self.store.find_employee_by_email(&email).await? else {
            warn!(email = %email, "Login attempt for unknown email");
            return Err(rejected());
        };
        if employee.status != EmployeeStatus::Active {
            warn!(employee = %employee.code, "Login attempt for inactive employee");
            return Err(rejected());
        }
        if !verify_password(&payload.password, &employee.password_hash)? {
            warn!(employee = %employee.code, "Login attempt with wrong password");
            return Err(rejected());
        }

        let role = employee.primary_role().map(str::to_string);
        let token = self.jwt.issue(&employee.code, &employee.email, role.as_deref())?;
        info!(employee = %employee.code, "Issued access token");
        Ok(LoginResponse {
            token,
            email: employee.email,
            role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::dto::employee_dto::CreateEmployeePayload;
    use crate::services::employee_service::EmployeeService;
    use chrono::NaiveDate;

    async fn setup() -> AuthService {
        let store: Arc<dyn PayrollStore> = Arc::new(MemoryStore::new());
        EmployeeService::new(store.clone())
            .create(CreateEmployeePayload {
                first_name: "Manager".into(),
                last_name: "User".into(),
                email: "manager@erp.gov.rw".into(),
                password: "manager123".into(),
                roles: vec!["ROLE_MANAGER".into()],
                mobile: "+250788888889".into(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            })
            .await
            .unwrap();
        AuthService::new(store, JwtSettings::new("test_secret_key", 30))
    }

    #[tokio::test]
    async fn login_issues_token_with_role() {
        let auth = setup().await;
        let response = auth
            .login(LoginPayload {
                email: "manager@erp.gov.rw".into(),
                password: "manager123".into(),
            })
            .await
            .unwrap();
        assert_eq!(response.role.as_deref(), Some("ROLE_MANAGER"));

        let claims = auth.jwt().verify(&response.token).unwrap();
        assert!(claims.sub.starts_with("EMP-"));
        assert_eq!(claims.email, "manager@erp.gov.rw");
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = setup().await;
        let err = auth
            .login(LoginPayload {
                email: "manager@erp.gov.rw".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
