use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::engine::EngineSettings;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment (and an optional .env file).
// Every variable has a default; a value that is present but malformed is an
// error rather than silently falling back.
//
// ============================================================================

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("{var} must be between {min} and {max}, got {value}")]
    OutOfRange {
        var: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,

    /// Days between credit approval and the payment due date
    pub credit_term_days: u32,
    /// Window for "upcoming" credits
    pub due_soon_days: u32,
    pub order_lock_timeout_ms: u64,
    pub retry_max_attempts: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 8080,
            credit_term_days: 30,
            due_soon_days: 7,
            order_lock_timeout_ms: 5_000,
            retry_max_attempts: 3,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok(); // Load .env file if present

        let config = Self::from_lookup(|var| env::var(var).ok())?;
        tracing::info!(
            host = %config.server_host,
            port = config.server_port,
            credit_term_days = config.credit_term_days,
            "Application configuration loaded"
        );
        Ok(config)
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let server_host = lookup("SERVER_HOST").unwrap_or(defaults.server_host);
        let server_port = parse_var(&lookup, "SERVER_PORT", defaults.server_port)?;
        let credit_term_days = parse_var(&lookup, "CREDIT_TERM_DAYS", defaults.credit_term_days)?;
        let due_soon_days = parse_var(&lookup, "DUE_SOON_DAYS", defaults.due_soon_days)?;
        let order_lock_timeout_ms =
            parse_var(&lookup, "ORDER_LOCK_TIMEOUT_MS", defaults.order_lock_timeout_ms)?;
        let retry_max_attempts =
            parse_var(&lookup, "RETRY_MAX_ATTEMPTS", defaults.retry_max_attempts)?;

        check_range("CREDIT_TERM_DAYS", credit_term_days.into(), 1, 3650)?;
        check_range("DUE_SOON_DAYS", due_soon_days.into(), 0, 3650)?;
        check_range("ORDER_LOCK_TIMEOUT_MS", order_lock_timeout_ms, 1, 600_000)?;
        check_range("RETRY_MAX_ATTEMPTS", retry_max_attempts.into(), 1, 20)?;

        Ok(Self {
            server_host,
            server_port,
            credit_term_days,
            due_soon_days,
            order_lock_timeout_ms,
            retry_max_attempts,
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            credit_term: chrono::Duration::days(self.credit_term_days.into()),
            lock_timeout: Duration::from_millis(self.order_lock_timeout_ms),
            due_soon_window: chrono::Duration::days(self.due_soon_days.into()),
        }
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
            var,
            reason: format!("{} ({:?})", e, raw),
        }),
    }
}

fn check_range(var: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::OutOfRange { var, value, min, max });
    }
    Ok(())
}
