//! Process configuration.
//!
//! Read once from the environment at startup (after an optional `.env` file
//! is loaded) into an immutable [`Config`], then published through a
//! process-wide `OnceCell`. Nothing mutates it afterwards.

use chrono::Duration as ChronoDuration;
use log::LevelFilter;
use once_cell::sync::OnceCell;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::storage::db::StoreSettings;
use crate::tickets::policy::{DuplicatePolicy, TicketPolicy, DEFAULT_REOPEN_WINDOW_HOURS};

/// Default database file path
pub const DEFAULT_DATABASE_PATH: &str = "unidesk.sqlite";

/// Default log file path
pub const DEFAULT_LOG_FILE_PATH: &str = "app.log";

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for Telegram Bot API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// How long shutdown waits for queued notifications to go out (in seconds)
    pub const SHUTDOWN_GRACE_SECS: u64 = 10;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }

    pub fn shutdown_grace() -> Duration {
        Duration::from_secs(SHUTDOWN_GRACE_SECS)
    }
}

/// Ticket text limits
pub mod limits {
    /// Telegram rejects messages above 4096 characters
    pub const TELEGRAM_MESSAGE_CHARS: usize = 4096;

    /// Outgoing texts are cut to this, leaving room for the truncation marker
    pub const MAX_MESSAGE_CHARS: usize = 4000;

    /// Longest accepted message body
    pub const MAX_BODY_CHARS: usize = 3500;

    /// Each message body on a ticket card is cut to this many characters
    pub const CARD_BODY_CHARS: usize = 300;

    /// Subject is the first line of the first message, cut to this many characters
    pub const MAX_SUBJECT_CHARS: usize = 100;

    /// Preview length used in notifications
    pub const PREVIEW_CHARS: usize = 200;

    /// Number of tickets shown in list views
    pub const LIST_LIMIT: usize = 15;

    /// Number of trailing messages shown on a ticket card
    pub const CARD_MESSAGES: usize = 5;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("configuration already initialized")]
    AlreadyInitialized,
}

/// Everything the bot needs to start
pub struct Config {
    pub bot_token: SecretString,
    /// Telegram ids always treated as admins
    pub admin_ids: Vec<i64>,
    pub database_path: String,
    pub log_level: LevelFilter,
    pub log_file_path: String,
    /// Custom Bot API server, if any
    pub bot_api_url: Option<String>,
    pub store: StoreSettings,
    pub policy: TicketPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("bot_token", &"[REDACTED]")
            .field("admin_ids", &self.admin_ids)
            .field("database_path", &self.database_path)
            .field("log_level", &self.log_level)
            .field("log_file_path", &self.log_file_path)
            .field("bot_api_url", &self.bot_api_url)
            .field("store", &self.store)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Recognised keys:
    /// - `BOT_TOKEN` (or `TELOXIDE_TOKEN`), required
    /// - `ADMIN_IDS`: comma/space separated Telegram ids
    /// - `DATABASE_URL` (`sqlite://path`) or `DATABASE_PATH`
    /// - `LOG_LEVEL`, `LOG_FILE_PATH`, `BOT_API_URL`
    /// - `DB_POOL_SIZE`, `DB_CONNECT_TIMEOUT_SECS`, `DB_BUSY_TIMEOUT_MS`
    /// - `REOPEN_WINDOW_HOURS`, `DUPLICATE_TICKET_POLICY`, `REOPEN_CLEARS_ASSIGNEE`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let bot_token = non_empty("BOT_TOKEN")
            .or_else(|| non_empty("TELOXIDE_TOKEN"))
            .ok_or(ConfigError::Missing("BOT_TOKEN"))?;

        let admin_ids = non_empty("ADMIN_IDS")
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let database_path = match non_empty("DATABASE_URL") {
            Some(url) => parse_database_url(&url)?,
            None => non_empty("DATABASE_PATH").unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
        };

        let log_level = match non_empty("LOG_LEVEL") {
            Some(raw) => LevelFilter::from_str(&raw).map_err(|e| ConfigError::Invalid {
                key: "LOG_LEVEL",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => LevelFilter::Info,
        };

        let defaults = StoreSettings::default();
        let store = StoreSettings {
            pool_size: parse_or("DB_POOL_SIZE", non_empty("DB_POOL_SIZE"), defaults.pool_size)?,
            connection_timeout: Duration::from_secs(parse_or(
                "DB_CONNECT_TIMEOUT_SECS",
                non_empty("DB_CONNECT_TIMEOUT_SECS"),
                defaults.connection_timeout.as_secs(),
            )?),
            busy_timeout: Duration::from_millis(parse_or(
                "DB_BUSY_TIMEOUT_MS",
                non_empty("DB_BUSY_TIMEOUT_MS"),
                u64::try_from(defaults.busy_timeout.as_millis()).unwrap_or(u64::MAX),
            )?),
        };
        if store.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "DB_POOL_SIZE",
                value: "0".to_string(),
                reason: "pool needs at least one connection".to_string(),
            });
        }

        let reopen_hours: i64 = parse_or(
            "REOPEN_WINDOW_HOURS",
            non_empty("REOPEN_WINDOW_HOURS"),
            DEFAULT_REOPEN_WINDOW_HOURS,
        )?;
        if reopen_hours < 0 {
            return Err(ConfigError::Invalid {
                key: "REOPEN_WINDOW_HOURS",
                value: reopen_hours.to_string(),
                reason: "must not be negative".to_string(),
            });
        }

        let policy = TicketPolicy::default()
            .reopen_window(ChronoDuration::hours(reopen_hours))
            .duplicate(parse_or(
                "DUPLICATE_TICKET_POLICY",
                non_empty("DUPLICATE_TICKET_POLICY"),
                DuplicatePolicy::default(),
            )?)
            .reopen_clears_assignee(parse_or(
                "REOPEN_CLEARS_ASSIGNEE",
                non_empty("REOPEN_CLEARS_ASSIGNEE"),
                false,
            )?);

        Ok(Self {
            bot_token: SecretString::from(bot_token),
            admin_ids,
            database_path,
            log_level,
            log_file_path: non_empty("LOG_FILE_PATH").unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string()),
            bot_api_url: non_empty("BOT_API_URL"),
            store,
            policy,
        })
    }

    pub fn bot_token(&self) -> &str {
        self.bot_token.expose_secret()
    }
}

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Publishes the configuration for the lifetime of the process.
///
/// Fails if called twice.
pub fn init(config: Config) -> Result<&'static Config, ConfigError> {
    CONFIG.set(config).map_err(|_| ConfigError::AlreadyInitialized)?;
    CONFIG.get().ok_or(ConfigError::AlreadyInitialized)
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}

/// Accepts `sqlite://path`, `sqlite:path` and the SQLAlchemy-style
/// `sqlite+aiosqlite:///./path` forms, plus bare paths.
fn parse_database_url(url: &str) -> Result<String, ConfigError> {
    let Some((scheme, rest)) = url.split_once(':') else {
        return Ok(url.to_string());
    };
    if !scheme.starts_with("sqlite") {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            value: url.to_string(),
            reason: "only sqlite databases are supported".to_string(),
        });
    }
    let path = rest.strip_prefix("///").or_else(|| rest.strip_prefix("//")).unwrap_or(rest);
    if path.is_empty() {
        return Err(ConfigError::Invalid {
            key: "DATABASE_URL",
            value: url.to_string(),
            reason: "missing database path".to_string(),
        });
    }
    Ok(path.to_string())
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.parse::<T>().map_err(|e| ConfigError::Invalid {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_missing_token_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("BOT_TOKEN")));
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(config.bot_token(), "123:abc");
        assert!(config.admin_ids.is_empty());
        assert_eq!(config.database_path, DEFAULT_DATABASE_PATH);
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.policy, TicketPolicy::default());
        assert_eq!(config.store.pool_size, StoreSettings::default().pool_size);
    }

    #[test]
    fn test_teloxide_token_fallback() {
        let config = Config::from_lookup(lookup(&[("TELOXIDE_TOKEN", "42:xyz")])).unwrap();
        assert_eq!(config.bot_token(), "42:xyz");
    }

    #[test]
    fn test_admin_ids_skip_garbage() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("ADMIN_IDS", "1, 2,abc\n3")])).unwrap();
        assert_eq!(config.admin_ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_database_url_forms() {
        assert_eq!(parse_database_url("sqlite://bot.db").unwrap(), "bot.db");
        assert_eq!(parse_database_url("sqlite+aiosqlite:///./bot.db").unwrap(), "./bot.db");
        assert_eq!(parse_database_url("sqlite:data/bot.db").unwrap(), "data/bot.db");
        assert_eq!(parse_database_url("bot.db").unwrap(), "bot.db");
        assert!(parse_database_url("postgres://localhost/bot").is_err());
        assert!(parse_database_url("sqlite://").is_err());
    }

    #[test]
    fn test_policy_from_env() {
        let config = Config::from_lookup(lookup(&[
            ("BOT_TOKEN", "t"),
            ("REOPEN_WINDOW_HOURS", "48"),
            ("DUPLICATE_TICKET_POLICY", "reject"),
            ("REOPEN_CLEARS_ASSIGNEE", "true"),
            ("LOG_LEVEL", "debug"),
        ]))
        .unwrap();
        assert_eq!(config.policy.reopen_window, ChronoDuration::hours(48));
        assert_eq!(config.policy.duplicate, DuplicatePolicy::Reject);
        assert!(config.policy.reopen_clears_assignee);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("DB_POOL_SIZE", "many")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "DB_POOL_SIZE", .. }));

        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("REOPEN_WINDOW_HOURS", "-1")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "REOPEN_WINDOW_HOURS", .. }));

        let err = Config::from_lookup(lookup(&[("BOT_TOKEN", "t"), ("LOG_LEVEL", "loud")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "LOG_LEVEL", .. }));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_lookup(lookup(&[("BOT_TOKEN", "very-secret")])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("REDACTED"));
    }
}
