//! Utility modules
//!
//! This module contains common utilities used throughout the application,
//! including error handling, logging setup and content hashing.

pub mod errors;
pub mod hash;
pub mod logging;

pub use errors::{BanLookupError, ChatWardenError, Result};
pub use hash::{ContentHash, FieldDigest};
