//! ChatWarden Telegram moderation bot
//!
//! A chat-moderation bot that admits verified users transparently,
//! re-bans known offenders and challenges unknown senders with a numeric
//! image captcha solved through inline-button taps. This library exposes
//! the admission pipeline, the captcha state machine, the cached storage
//! layer and the admin HTTP API.

#![allow(non_snake_case)]

pub mod config;
pub mod database;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod server;
pub mod services;
pub mod telegram;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use database::{Storage, UpsertMessageInput};
pub use telegram::{Dependencies, Gateway};
pub use utils::errors::{ChatWardenError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}
