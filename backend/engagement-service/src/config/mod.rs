use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub fcm: FcmConfig,
    pub scheduler: SchedulerConfig,
    pub workers: WorkerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub env: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmConfig {
    /// Path to the Firebase service account key JSON. When unset the service
    /// runs without a push client and every delivery attempt fails loudly.
    pub credentials_path: Option<String>,
}

/// Daily dispatch schedule. The offset is fixed (no DST handling); the
/// default of +05:00 matches the app's primary audience time zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub hour: u32,
    pub minute: u32,
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    pub poll_interval_secs: u64,
    pub batch_size: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Config {
            app: AppConfig {
                env: std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                port: parse_env("APP_PORT", 8000)?,
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .map_err(|_| AppError::Config("DATABASE_URL not set".to_string()))?,
                max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 10)?,
            },
            fcm: FcmConfig {
                credentials_path: std::env::var("FCM_CREDENTIALS_PATH").ok(),
            },
            scheduler: SchedulerConfig {
                enabled: parse_env_bool("ENGAGEMENT_SCHEDULE_ENABLED", true)?,
                hour: parse_env("ENGAGEMENT_SCHEDULE_HOUR", 10)?,
                minute: parse_env("ENGAGEMENT_SCHEDULE_MINUTE", 0)?,
                utc_offset_minutes: parse_env("ENGAGEMENT_UTC_OFFSET_MINUTES", 300)?,
            },
            workers: WorkerConfig {
                poll_interval_secs: parse_env("QUEUE_POLL_INTERVAL_SECS", 30)?,
                batch_size: parse_env("QUEUE_BATCH_SIZE", 100)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.scheduler.hour > 23 || self.scheduler.minute > 59 {
            return Err(AppError::Config(format!(
                "invalid schedule time {:02}:{:02}",
                self.scheduler.hour, self.scheduler.minute
            )));
        }
        if self.scheduler.utc_offset_minutes.abs() > 14 * 60 {
            return Err(AppError::Config(format!(
                "invalid UTC offset: {} minutes",
                self.scheduler.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| AppError::Config(format!("invalid value for {}: {}", name, raw))),
        Err(_) => Ok(default),
    }
}

/// Boolean env vars accept the spellings commonly found in container env
/// files, not just `true`/`false`.
fn parse_env_bool(name: &str, default: bool) -> Result<bool> {
    match std::env::var(name) {
        Ok(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" => Ok(false),
            _ => Err(AppError::Config(format!(
                "invalid value for {}: {} (expected true/false, 1/0, yes/no or on/off)",
                name, raw
            ))),
        },
        Err(_) => Ok(default),
    }
}
