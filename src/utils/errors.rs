//! Error handling for ChatWarden
//!
//! This module defines the main error types used throughout the application
//! and provides a unified error handling strategy.

use thiserror::Error;

/// Main error type for the ChatWarden application
#[derive(Error, Debug)]
pub enum ChatWardenError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Ban lookup error: {0}")]
    BanLookup(#[from] BanLookupError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Value encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Captcha rendering error: {0}")]
    CaptchaRender(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// External ban lookup specific errors
#[derive(Error, Debug)]
pub enum BanLookupError {
    #[error("Ban lookup request failed: {0}")]
    RequestFailed(String),

    #[error("Ban lookup timeout")]
    Timeout,

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(u16),

    #[error("Invalid ban lookup response: {0}")]
    InvalidResponse(String),

    #[error("Ban lookup service unavailable")]
    ServiceUnavailable,
}

impl From<config::ConfigError> for ChatWardenError {
    fn from(err: config::ConfigError) -> Self {
        ChatWardenError::Config(err.to_string())
    }
}

/// Result type alias for ChatWarden operations
pub type Result<T> = std::result::Result<T, ChatWardenError>;

impl ChatWardenError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            ChatWardenError::Database(_) => false,
            ChatWardenError::Telegram(_) => true,
            ChatWardenError::BanLookup(_) => true,
            ChatWardenError::Config(_) => false,
            ChatWardenError::Http(_) => true,
            ChatWardenError::Serialization(_) => false,
            ChatWardenError::Encoding(_) => false,
            ChatWardenError::Io(_) => true,
            ChatWardenError::CaptchaRender(_) => true,
            ChatWardenError::Authentication(_) => false,
            ChatWardenError::InvalidInput(_) => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ChatWardenError::Database(_) => ErrorSeverity::Critical,
            ChatWardenError::Config(_) => ErrorSeverity::Critical,
            ChatWardenError::Authentication(_) => ErrorSeverity::Warning,
            ChatWardenError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
