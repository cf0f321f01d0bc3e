use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub targets: Vec<TargetConfig>,
    pub telegram: TelegramConfig,
    pub email: EmailConfig,
    pub notifications: NotificationConfig,
    pub fetch: FetchConfig,
    pub scheduler: SchedulerConfig,
    pub directories: DirectoryConfig,
    pub logging: LoggingConfig,
    pub timezone: String,
}

/// One monitored page, parsed from `WATCH_TARGETS` (`Name=url;...`).
#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: Option<i64>,
}

impl TelegramConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some() && self.chat_id.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub to: Option<String>,
}

impl EmailConfig {
    pub fn is_configured(&self) -> bool {
        self.host.is_some() && self.to.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub cooldown: Duration,
    pub max_retries: u32,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub cron_specs: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub logs_dir: String,
    pub data_dir: String,
    pub db_filename: String,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}
