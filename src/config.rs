//! Configuration for intake-bot.
//!
//! Everything comes from environment variables (a `.env` file is loaded
//! via dotenvy early in startup). Each section resolves independently
//! with sensible defaults so a bare environment still starts.

use std::path::PathBuf;

use chrono::{NaiveTime, Weekday};

use crate::error::ConfigError;
use crate::gateway::UserId;

/// Main configuration, assembled once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub admins: AdminConfig,
    pub mailing: MailingConfig,
    pub reminder: ReminderConfig,
    pub export: ExportConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            admins: AdminConfig::resolve()?,
            mailing: MailingConfig::resolve()?,
            reminder: ReminderConfig::resolve()?,
            export: ExportConfig::resolve(),
        })
    }
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Main administrator identities, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    pub main_admin_ids: Vec<UserId>,
}

impl AdminConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let Some(raw) = optional_env("MAIN_ADMIN_IDS") else {
            tracing::warn!("MAIN_ADMIN_IDS not set, starting without administrators");
            return Ok(Self {
                main_admin_ids: Vec::new(),
            });
        };

        let mut ids = Vec::new();
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let id = part.parse::<i64>().map_err(|e| ConfigError::Invalid {
                key: "MAIN_ADMIN_IDS",
                reason: format!("'{}': {}", part, e),
            })?;
            ids.push(UserId(id));
        }
        Ok(Self {
            main_admin_ids: ids,
        })
    }
}

/// Weekly digest defaults: Sunday at 12:00, enabled.
#[derive(Debug, Clone)]
pub struct MailingConfig {
    pub enabled: bool,
    pub day: Weekday,
    pub time: NaiveTime,
}

impl MailingConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let enabled = match optional_env("MAILING_ENABLED").as_deref() {
            None => true,
            Some("true") | Some("1") => true,
            Some("false") | Some("0") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "MAILING_ENABLED",
                    reason: format!("'{}' is not a boolean", other),
                })
            }
        };

        let day = match optional_env("MAILING_DAY") {
            None => Weekday::Sun,
            Some(raw) => crate::sched::parse_weekday(&raw).ok_or(ConfigError::Invalid {
                key: "MAILING_DAY",
                reason: format!("'{}' is not a weekday", raw),
            })?,
        };

        let time = match optional_env("MAILING_TIME") {
            None => NaiveTime::from_hms_opt(12, 0, 0).expect("valid constant time"),
            Some(raw) => {
                NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|e| ConfigError::Invalid {
                    key: "MAILING_TIME",
                    reason: format!("'{}': {}", raw, e),
                })?
            }
        };

        Ok(Self { enabled, day, time })
    }
}

/// Reminder defaults: no text, weekly cadence.
#[derive(Debug, Clone)]
pub struct ReminderConfig {
    pub text: Option<String>,
    pub frequency_weeks: u32,
}

impl ReminderConfig {
    pub fn resolve() -> Result<Self, ConfigError> {
        let frequency_weeks = match optional_env("REMINDER_FREQUENCY_WEEKS") {
            None => 1,
            Some(raw) => {
                let weeks = raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                    key: "REMINDER_FREQUENCY_WEEKS",
                    reason: format!("'{}': {}", raw, e),
                })?;
                if !(1..=3).contains(&weeks) {
                    return Err(ConfigError::Invalid {
                        key: "REMINDER_FREQUENCY_WEEKS",
                        reason: format!("{} is outside 1..=3", weeks),
                    });
                }
                weeks
            }
        };

        Ok(Self {
            text: optional_env("REMINDER_TEXT"),
            frequency_weeks,
        })
    }
}

/// Where report exports are spooled.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub dir: PathBuf,
}

impl ExportConfig {
    pub fn resolve() -> Self {
        let dir = optional_env("REPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        Self { dir }
    }
}
