//! Process configuration, read once from the environment at startup.
//!
//! | Variable                   | Required               | Default                  |
//! |----------------------------|------------------------|--------------------------|
//! | `STORAGE_BACKEND`          | no                     | `postgres`               |
//! | `DATABASE_URL`             | when backend=postgres  | -                        |
//! | `DATABASE_MAX_CONNECTIONS` | no                     | `10`                     |
//! | `PORT`                     | no                     | `8080`                   |
//! | `SMTP_HOST`                | no (mail off if unset) | -                        |
//! | `SMTP_PORT`                | no                     | `587`                    |
//! | `SMTP_USER` / `SMTP_PASS`  | no                     | -                        |
//! | `SMTP_FROM`                | no                     | `noreply@yourgym.com`    |
//! | `STAFF_EMAIL`              | no                     | `admin@yourgym.com`      |
//! | `APP_URL`                  | no                     | `http://localhost:8080`  |
//! | `OPENAI_API_KEY`           | no (AI off if unset)   | -                        |
//! | `OPENAI_BASE_URL`          | no                     | `https://api.openai.com/v1` |
//! | `OPENAI_MODEL`             | no                     | `gpt-4o-mini`            |
//! | `ENABLE_TRIAL_BOOKING`     | no                     | `true`                   |
//! | `ENABLE_EMAIL_NOTIFICATIONS` | no                   | `true`                   |
//! | `ENABLE_ANALYTICS`         | no                     | `true`                   |
//! | `SESSION_IDLE_SECS`        | no                     | `1800`                   |

use std::time::Duration;

use thiserror::Error;

use crate::flow::FeatureFlags;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@yourgym.com";
const DEFAULT_STAFF_EMAIL: &str = "admin@yourgym.com";
const DEFAULT_APP_URL: &str = "http://localhost:8080";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL must be set when STORAGE_BACKEND is postgres")]
    MissingDatabaseUrl,

    #[error("Unknown STORAGE_BACKEND '{0}' (expected 'postgres' or 'memory')")]
    UnknownBackend(String),

    #[error("{name} has an invalid value '{value}'")]
    InvalidValue { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub from_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub storage: StorageBackend,
    /// `None` when SMTP is not configured.
    pub email: Option<EmailConfig>,
    pub staff_email: String,
    pub app_url: String,
    /// `None` when no completion API key is configured.
    pub ai: Option<AiConfig>,
    pub features: FeatureFlags,
    /// Conversation sessions untouched for this long are dropped.
    pub session_idle_ttl: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let storage = match var("STORAGE_BACKEND").as_deref().unwrap_or("postgres") {
            "postgres" => StorageBackend::Postgres {
                database_url: var("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?,
                max_connections: parse_or(
                    "DATABASE_MAX_CONNECTIONS",
                    var("DATABASE_MAX_CONNECTIONS"),
                    DEFAULT_MAX_CONNECTIONS,
                )?,
            },
            "memory" => StorageBackend::Memory,
            other => return Err(ConfigError::UnknownBackend(other.to_string())),
        };

        let email = match var("SMTP_HOST") {
            Some(smtp_host) => Some(EmailConfig {
                smtp_host,
                smtp_port: parse_or("SMTP_PORT", var("SMTP_PORT"), DEFAULT_SMTP_PORT)?,
                smtp_user: var("SMTP_USER"),
                smtp_password: var("SMTP_PASS"),
                from_address: var("SMTP_FROM").unwrap_or_else(|| DEFAULT_FROM_ADDRESS.into()),
            }),
            None => None,
        };

        let ai = var("OPENAI_API_KEY").map(|api_key| AiConfig {
            api_key,
            base_url: var("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.into()),
            model: var("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.into()),
        });

        let defaults = FeatureFlags::default();
        let features = FeatureFlags {
            enable_trial_booking: parse_or(
                "ENABLE_TRIAL_BOOKING",
                var("ENABLE_TRIAL_BOOKING"),
                defaults.enable_trial_booking,
            )?,
            enable_email_notifications: parse_or(
                "ENABLE_EMAIL_NOTIFICATIONS",
                var("ENABLE_EMAIL_NOTIFICATIONS"),
                defaults.enable_email_notifications,
            )?,
            enable_analytics: parse_or(
                "ENABLE_ANALYTICS",
                var("ENABLE_ANALYTICS"),
                defaults.enable_analytics,
            )?,
        };

        Ok(Self {
            port: parse_or("PORT", var("PORT"), DEFAULT_PORT)?,
            storage,
            email,
            staff_email: var("STAFF_EMAIL").unwrap_or_else(|| DEFAULT_STAFF_EMAIL.into()),
            app_url: var("APP_URL").unwrap_or_else(|| DEFAULT_APP_URL.into()),
            ai,
            features,
            session_idle_ttl: Duration::from_secs(parse_or(
                "SESSION_IDLE_SECS",
                var("SESSION_IDLE_SECS"),
                DEFAULT_SESSION_IDLE_SECS,
            )?),
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}
