//! Configuration management module
//!
//! This module handles loading and validation of application configuration
//! from YAML files and environment variables.

pub mod settings;
pub mod validation;

pub use settings::{
    ApiConfig, CaptchaConfig, DatabaseConfig, MetricsConfig, ProxyConfig, Settings, TelegramConfig,
};
