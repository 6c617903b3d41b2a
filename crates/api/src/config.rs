//! Process configuration from environment variables.

use std::net::SocketAddr;

use thiserror::Error;

use billing_infra::StockWritePolicy;
use billing_observability::LogFormat;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },
}

impl ConfigError {
    fn invalid(var: &'static str, message: impl ToString) -> Self {
        Self::Invalid {
            var,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// True when `JWT_SECRET` was unset and the dev default is in use.
    pub jwt_secret_is_default: bool,
    /// Postgres connection string; only used with the `postgres` feature.
    pub database_url: Option<String>,
    pub stock_write_policy: StockWritePolicy,
    pub log_format: LogFormat,
    /// Seed demo users and items into the in-memory stores.
    pub seed_demo_data: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (empty values count as unset).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e))?;

        let (jwt_secret, jwt_secret_is_default) = match get("JWT_SECRET") {
            Some(secret) => (secret, false),
            None => (DEV_JWT_SECRET.to_string(), true),
        };

        let stock_write_policy = get("STOCK_WRITE_POLICY")
            .map(|v| v.parse::<StockWritePolicy>())
            .transpose()
            .map_err(|e| ConfigError::invalid("STOCK_WRITE_POLICY", e))?
            .unwrap_or_default();

        let log_format = get("LOG_FORMAT")
            .map(|v| v.parse::<LogFormat>())
            .transpose()
            .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?
            .unwrap_or_default();

        let seed_demo_data = match get("SEED_DEMO_DATA") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ConfigError::invalid("SEED_DEMO_DATA", format!("expected true/false, got `{v}`"))
            })?,
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            jwt_secret_is_default,
            database_url: get("DATABASE_URL"),
            stock_write_policy,
            log_format,
            seed_demo_data,
        })
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
