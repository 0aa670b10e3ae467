//! Banned user model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user banned from the monitored chats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BannedUser {
    /// The banned user's id.
    pub id: i64,
    pub banned_at: DateTime<Utc>,
    /// Why the user was banned ("external", admin note, …).
    pub reason: String,
    /// Expiry time of the ban; `None` means indefinite.
    pub expires_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl BannedUser {
    pub const TABLE: &'static str = "banned";

    pub fn new(id: i64, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            banned_at: now,
            reason: reason.into(),
            expires_at: None,
            updated_at: now,
        }
    }

    /// Whether a temporary ban has lapsed.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => expires_at <= Utc::now(),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_indefinite_ban_never_expires() {
        let ban = BannedUser::new(333, "external");
        assert!(!ban.is_expired());
    }

    #[test]
    fn test_past_expiry_is_expired() {
        let mut ban = BannedUser::new(333, "external");
        ban.expires_at = Some(Utc::now() - Duration::seconds(1));
        assert!(ban.is_expired());
    }

    #[test]
    fn test_future_expiry_is_active() {
        let mut ban = BannedUser::new(333, "external");
        ban.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!ban.is_expired());
    }
}
