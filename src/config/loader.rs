use std::{env, time::Duration};

use url::Url;

use super::env::{
    AppConfig, ConfigError, DirectoryConfig, EmailConfig, FetchConfig, LoggingConfig,
    NotificationConfig, SchedulerConfig, TargetConfig, TelegramConfig,
};

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let targets = parse_targets(
            &env::var("WATCH_TARGETS").map_err(|_| ConfigError::Missing("WATCH_TARGETS"))?,
        )?;

        let telegram = TelegramConfig {
            bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|v| !v.is_empty()),
            chat_id: parse_int("TELEGRAM_CHAT_ID"),
        };

        let email = EmailConfig {
            host: env::var("SMTP_HOST").ok().filter(|v| !v.is_empty()),
            port: env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(587),
            user: env::var("SMTP_USER").ok().filter(|v| !v.is_empty()),
            password: env::var("SMTP_PASSWORD").ok().filter(|v| !v.is_empty()),
            from: env::var("SMTP_FROM")
                .unwrap_or_else(|_| "Slipwatch <noreply@example.com>".to_string()),
            to: env::var("SMTP_TO").ok().filter(|v| !v.is_empty()),
        };

        let notifications = NotificationConfig {
            cooldown: Duration::from_secs(
                env::var("NOTIFICATION_COOLDOWN_MINUTES")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(10)
                    * 60,
            ),
            max_retries: env::var("MAX_NOTIFICATION_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
        };

        let fetch = FetchConfig {
            timeout: Duration::from_millis(
                env::var("PAGE_FETCH_TIMEOUT")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(30_000),
            ),
        };

        // Six-field cron specs (with seconds). Defaults keep the
        // original cadence: every 5 minutes during working hours,
        // every 3 minutes off-hours.
        let scheduler = SchedulerConfig {
            cron_specs: env::var("CHECK_CRONS")
                .map(|value| {
                    value
                        .split(';')
                        .map(|part| part.trim().to_string())
                        .filter(|part| !part.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "0 */5 7-17 * * *".to_string(),
                        "0 */3 0-6,18-23 * * *".to_string(),
                    ]
                }),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME").unwrap_or_else(|_| "slipwatch.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        };

        let timezone = env::var("MONITOR_TIMEZONE").unwrap_or_else(|_| "Europe/Berlin".to_string());

        Ok(Self {
            targets,
            telegram,
            email,
            notifications,
            fetch,
            scheduler,
            directories,
            logging,
            timezone,
        })
    }
}

/// `WATCH_TARGETS` format: `Name=https://url;Other Name=https://url2`.
fn parse_targets(raw: &str) -> Result<Vec<TargetConfig>, ConfigError> {
    let mut targets = Vec::new();
    for part in raw.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, url) = part.split_once('=').ok_or_else(|| ConfigError::Invalid {
            key: "WATCH_TARGETS",
            reason: format!("expected Name=url, got {part:?}"),
        })?;
        let name = name.trim();
        let url = url.trim();
        let parsed = Url::parse(url).map_err(|err| ConfigError::Invalid {
            key: "WATCH_TARGETS",
            reason: format!("invalid url {url:?}: {err}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                key: "WATCH_TARGETS",
                reason: format!("unsupported scheme in {url:?}"),
            });
        }
        if name.is_empty() {
            return Err(ConfigError::Invalid {
                key: "WATCH_TARGETS",
                reason: format!("empty target name in {part:?}"),
            });
        }
        targets.push(TargetConfig {
            name: name.to_string(),
            url: url.to_string(),
        });
    }
    if targets.is_empty() {
        return Err(ConfigError::Invalid {
            key: "WATCH_TARGETS",
            reason: "no targets configured".to_string(),
        });
    }
    Ok(targets)
}

fn parse_int(key: &str) -> Option<i64> {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiple_targets() {
        let targets =
            parse_targets("Hafen Nord=https://example.de/a;Hafen Süd=https://example.de/b")
                .unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].name, "Hafen Nord");
        assert_eq!(targets[1].url, "https://example.de/b");
    }

    #[test]
    fn rejects_entry_without_url() {
        assert!(parse_targets("nur-ein-name").is_err());
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(parse_targets("x=ftp://example.de").is_err());
    }

    #[test]
    fn rejects_empty_list() {
        assert!(parse_targets(" ; ").is_err());
    }
}
