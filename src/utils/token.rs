use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::{Deserialize, Serialize};

use crate::error::Result;

const CODE_SUFFIX_LEN: usize = 10;

/// Opaque entity key such as `EMP-7Q2KD9XZ0A`.
pub fn generate_code(prefix: &str) -> String {
    let suffix: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CODE_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", prefix, suffix.to_ascii_uppercase())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Employee code.
    pub sub: String,
    pub email: String,
    pub role: Option<String>,
    pub exp: usize,
}

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";
pub const ROLE_MANAGER: &str = "ROLE_MANAGER";

impl Claims {
    fn has_role(&self, wanted: &str) -> bool {
        self.role
            .as_deref()
            .is_some_and(|role| role.eq_ignore_ascii_case(wanted))
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    /// Managers and admins may run payroll and read any employee's records.
    pub fn is_manager(&self) -> bool {
        self.is_admin() || self.has_role(ROLE_MANAGER)
    }
}

#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub expiration_minutes: i64,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, expiration_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            expiration_minutes,
        }
    }

    pub fn issue(&self, subject: &str, email: &str, role: Option<&str>) -> Result<String> {
        let exp = (Utc::now() + Duration::minutes(self.expiration_minutes)).timestamp() as usize;
        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            role: role.map(str::to_string),
            exp,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_carry_prefix_and_uppercase_suffix() {
        let code = generate_code("PSL");
        let suffix = code.strip_prefix("PSL-").unwrap();
        assert_eq!(suffix.len(), CODE_SUFFIX_LEN);
        assert!(suffix.chars().all(|c| !c.is_ascii_lowercase()));
        assert_ne!(code, generate_code("PSL"));
    }

    #[test]
    fn issued_token_round_trips_and_rejects_other_secret() {
        let settings = JwtSettings::new("test_secret_key", 5);
        let token = settings
            .issue("EMP-1", "a@example.com", Some("ROLE_ADMIN"))
            .unwrap();
        let claims = settings.verify(&token).unwrap();
        assert_eq!(claims.sub, "EMP-1");
        assert_eq!(claims.role.as_deref(), Some("ROLE_ADMIN"));

        let other = JwtSettings::new("another_secret", 5);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn admins_count_as_managers() {
        let claims = |role: Option<&str>| Claims {
            sub: "EMP-1".into(),
            email: "a@example.com".into(),
            role: role.map(str::to_string),
            exp: 0,
        };
        assert!(claims(Some("role_admin")).is_admin());
        assert!(claims(Some("ROLE_ADMIN")).is_manager());
        assert!(claims(Some("ROLE_MANAGER")).is_manager());
        assert!(!claims(Some("ROLE_MANAGER")).is_admin());
        assert!(!claims(Some("ROLE_EMPLOYEE")).is_manager());
        assert!(!claims(None).is_manager());
    }
}
