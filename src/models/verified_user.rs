//! Verified user model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user that passed verification. Verification is permanent: rows never
/// expire and are only removed when the user gets banned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedUser {
    /// The verified user's id.
    pub id: i64,
    pub verified_at: DateTime<Utc>,
    /// Why the user was verified ("admin/owner", "captcha", …).
    pub reason: String,
    pub updated_at: DateTime<Utc>,
}

impl VerifiedUser {
    pub const TABLE: &'static str = "verified";

    pub fn new(id: i64, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            verified_at: now,
            reason: reason.into(),
            updated_at: now,
        }
    }
}
