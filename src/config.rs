use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Postgres connection string. Without it the service runs on the
    /// in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_expiration_minutes: i64,
    pub organization_name: String,
    pub mail_relay_url: Option<String>,
    pub mail_from: String,
    /// Per-request timeout for the mail relay.
    pub mail_timeout_secs: u64,
    pub message_sweep_secs: u64,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: env::var("DATABASE_URL").ok(),
            jwt_secret: get_env("JWT_SECRET")?,
            jwt_expiration_minutes: get_env_parse_or("JWT_EXPIRATION_MINUTES", 60)?,
            organization_name: env::var("ORGANIZATION_NAME")
                .unwrap_or_else(|_| "Rwanda Government".to_string()),
            mail_relay_url: env::var("MAIL_RELAY_URL").ok(),
            mail_from: env::var("MAIL_FROM").unwrap_or_else(|_| "payroll@erp.gov.rw".to_string()),
            mail_timeout_secs: get_env_parse_or("MAIL_TIMEOUT_SECS", 10)?,
            message_sweep_secs: get_env_parse_or("MESSAGE_SWEEP_SECS", 300)?,
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> Result<&'static Config> {
    CONFIG
        .get()
        .ok_or_else(|| Error::Config("Configuration has not been initialized".to_string()))
}
