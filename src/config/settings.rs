//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from a YAML file and environment variables.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Bearer secret for the admin HTTP routes.
    #[serde(default)]
    pub secret: String,
    /// Log level: debug, info, warn or error.
    #[serde(default = "default_verbose")]
    pub verbose: String,
    pub proxy: Option<ProxyConfig>,
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub captcha: CaptchaConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Optional SOCKS5 proxy for all outbound HTTP
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyConfig {
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelegramConfig {
    pub token: String,
    /// Long-poll timeout.
    #[serde(default = "default_poll_timeout")]
    pub timeout_seconds: u64,
    /// Monitored chat ids. Empty means every chat is allowed.
    #[serde(default)]
    pub chats: Vec<i64>,
    /// Bot administrator user ids.
    #[serde(default)]
    pub admins: Vec<i64>,
    /// If non-empty, only these sender ids are processed at all.
    #[serde(default)]
    pub whitelist: Vec<i64>,
    /// Sender ids whose updates are always dropped.
    #[serde(default)]
    pub blacklist: Vec<i64>,
    /// Drop messages sent through inline bots.
    #[serde(default)]
    pub ignore_via: bool,
}

/// Captcha challenge configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptchaConfig {
    #[serde(default = "default_captcha_length")]
    pub length: usize,
    #[serde(default = "default_captcha_width")]
    pub width: u32,
    #[serde(default = "default_captcha_height")]
    pub height: u32,
    #[serde(default = "default_captcha_expiration")]
    pub expiration_seconds: u64,
}

/// Admin HTTP API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
    #[serde(default = "default_api_read_timeout")]
    pub read_timeout_seconds: u64,
    #[serde(default = "default_api_read_timeout")]
    pub write_timeout_seconds: u64,
    #[serde(default = "default_api_idle_timeout")]
    pub idle_timeout_seconds: u64,
}

/// Database configuration
///
/// Supported drivers are "sqlite3" (alias "sqlite") and "postgres".
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_driver")]
    pub driver: String,
    #[serde(default = "default_database_connection")]
    pub connection: String,
    /// Log every executed statement at debug level.
    #[serde(default)]
    pub logging: bool,
}

/// Time-series metrics sink configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub org: String,
    #[serde(default)]
    pub bucket: String,
}

fn default_environment() -> String {
    "production".to_string()
}

fn default_verbose() -> String {
    "info".to_string()
}

fn default_poll_timeout() -> u64 {
    10
}

fn default_captcha_length() -> usize {
    6
}

fn default_captcha_width() -> u32 {
    480
}

fn default_captcha_height() -> u32 {
    180
}

fn default_captcha_expiration() -> u64 {
    600
}

fn default_api_host() -> String {
    "localhost".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_api_timeout() -> u64 {
    15
}

fn default_api_read_timeout() -> u64 {
    10
}

fn default_api_idle_timeout() -> u64 {
    15
}

fn default_database_driver() -> String {
    "sqlite3".to_string()
}

fn default_database_connection() -> String {
    ":memory:".to_string()
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            length: default_captcha_length(),
            width: default_captcha_width(),
            height: default_captcha_height(),
            expiration_seconds: default_captcha_expiration(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            timeout_seconds: default_api_timeout(),
            read_timeout_seconds: default_api_read_timeout(),
            write_timeout_seconds: default_api_read_timeout(),
            idle_timeout_seconds: default_api_idle_timeout(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_database_driver(),
            connection: default_database_connection(),
            logging: false,
        }
    }
}

impl CaptchaConfig {
    pub fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_seconds)
    }
}

impl MetricsConfig {
    /// The sink is only constructed when every field is present.
    pub fn is_valid(&self) -> bool {
        !self.url.is_empty() && !self.token.is_empty() && !self.org.is_empty() && !self.bucket.is_empty()
    }
}

impl TelegramConfig {
    /// Empty allowlist means every chat is monitored.
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        self.chats.is_empty() || self.chats.contains(&chat_id)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

impl Settings {
    /// Load settings from the YAML file at `$CONFIG_PATH` (default
    /// `./config.yml`), then let environment variables override.
    pub fn new() -> Result<Self, config::ConfigError> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yml".to_string());

        let settings = config::Config::builder()
            .add_source(config::File::new(&path, config::FileFormat::Yaml).required(false))
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::ChatWardenError> {
        super::validation::validate_settings(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telegram_config(chats: Vec<i64>) -> TelegramConfig {
        TelegramConfig {
            token: "token".to_string(),
            timeout_seconds: 10,
            chats,
            admins: vec![],
            whitelist: vec![],
            blacklist: vec![],
            ignore_via: false,
        }
    }

    #[test]
    fn test_captcha_defaults() {
        let config = CaptchaConfig::default();
        assert_eq!(config.length, 6);
        assert_eq!(config.width, 480);
        assert_eq!(config.height, 180);
        assert_eq!(config.expiration(), Duration::from_secs(600));
    }

    #[test]
    fn test_api_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.timeout_seconds, 15);
        assert_eq!(config.read_timeout_seconds, 10);
        assert_eq!(config.idle_timeout_seconds, 15);
    }

    #[test]
    fn test_empty_chat_allowlist_allows_all() {
        let config = telegram_config(vec![]);
        assert!(config.is_chat_allowed(-1001));
        assert!(config.is_chat_allowed(42));
    }

    #[test]
    fn test_chat_allowlist_filters() {
        let config = telegram_config(vec![-1001]);
        assert!(config.is_chat_allowed(-1001));
        assert!(!config.is_chat_allowed(-1002));
    }

    #[test]
    fn test_metrics_validity() {
        let mut config = MetricsConfig::default();
        assert!(!config.is_valid());
        config.url = "http://localhost:8086".to_string();
        config.token = "token".to_string();
        config.org = "org".to_string();
        assert!(!config.is_valid());
        config.bucket = "bucket".to_string();
        assert!(config.is_valid());
    }
}
