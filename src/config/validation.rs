//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{ChatWardenError, Result};

use super::Settings;

const SUPPORTED_DRIVERS: &[&str] = &["sqlite3", "sqlite", "postgres"];
const LOG_LEVELS: &[&str] = &["debug", "info", "warn", "error"];

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_verbose(&settings.verbose)?;
    validate_telegram_config(&settings.telegram)?;
    validate_captcha_config(&settings.captcha)?;
    validate_database_config(&settings.database)?;

    if let Some(ref proxy) = settings.proxy {
        validate_proxy_config(proxy)?;
    }

    Ok(())
}

fn validate_verbose(verbose: &str) -> Result<()> {
    if !LOG_LEVELS.contains(&verbose) {
        return Err(ChatWardenError::Config(format!(
            "Unknown log level '{verbose}', expected one of: {}",
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}

fn validate_telegram_config(config: &super::TelegramConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(ChatWardenError::Config("Telegram bot token is required".to_string()));
    }

    if config.timeout_seconds == 0 {
        return Err(ChatWardenError::Config(
            "Telegram poll timeout must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_captcha_config(config: &super::CaptchaConfig) -> Result<()> {
    if config.length == 0 || config.length > 10 {
        return Err(ChatWardenError::Config(
            "Captcha length must be between 1 and 10".to_string(),
        ));
    }

    if config.width == 0 || config.height == 0 {
        return Err(ChatWardenError::Config(
            "Captcha dimensions must be greater than 0".to_string(),
        ));
    }

    if config.expiration_seconds == 0 {
        return Err(ChatWardenError::Config(
            "Captcha expiration must be greater than 0".to_string(),
        ));
    }

    Ok(())
}

fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.connection.is_empty() {
        return Err(ChatWardenError::Config(
            "Database connection string is required".to_string(),
        ));
    }

    let driver = config.driver.to_lowercase();
    if !SUPPORTED_DRIVERS.contains(&driver.as_str()) {
        return Err(ChatWardenError::Config(format!(
            "Unsupported database driver '{}', expected one of: {}",
            config.driver,
            SUPPORTED_DRIVERS.join(", ")
        )));
    }

    Ok(())
}

fn validate_proxy_config(config: &super::ProxyConfig) -> Result<()> {
    if config.address.is_empty() {
        return Err(ChatWardenError::Config("Proxy address is required".to_string()));
    }

    if config.port == 0 {
        return Err(ChatWardenError::Config("Proxy port must be greater than 0".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaptchaConfig, DatabaseConfig, ProxyConfig, TelegramConfig};

    #[test]
    fn test_rejects_empty_token() {
        let config = TelegramConfig {
            token: String::new(),
            timeout_seconds: 10,
            chats: vec![],
            admins: vec![],
            whitelist: vec![],
            blacklist: vec![],
            ignore_via: false,
        };
        assert!(validate_telegram_config(&config).is_err());
    }

    #[test]
    fn test_rejects_mysql_driver() {
        let config = DatabaseConfig {
            driver: "mysql".to_string(),
            connection: "warden:warden@tcp(127.0.0.1:3306)/warden".to_string(),
            logging: false,
        };
        assert!(validate_database_config(&config).is_err());
    }

    #[test]
    fn test_accepts_supported_drivers() {
        for driver in ["sqlite3", "sqlite", "postgres"] {
            let config = DatabaseConfig {
                driver: driver.to_string(),
                connection: ":memory:".to_string(),
                logging: false,
            };
            assert!(validate_database_config(&config).is_ok(), "driver {driver}");
        }
    }

    #[test]
    fn test_rejects_oversized_captcha_length() {
        let config = CaptchaConfig {
            length: 11,
            ..CaptchaConfig::default()
        };
        assert!(validate_captcha_config(&config).is_err());
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        assert!(validate_verbose("trace").is_err());
        assert!(validate_verbose("info").is_ok());
    }

    #[test]
    fn test_rejects_proxy_without_port() {
        let config = ProxyConfig {
            address: "127.0.0.1".to_string(),
            port: 0,
            username: String::new(),
            password: String::new(),
        };
        assert!(validate_proxy_config(&config).is_err());
    }
}
