//! User model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::hash::{ContentHash, FieldDigest};

/// A Telegram user or bot as observed in updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for this user or bot.
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    /// IETF language tag of the user's language.
    pub language_code: String,
    pub is_premium: bool,
    pub is_bot: bool,

    /// Time when the user was last seen posting.
    pub last_seen: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    pub extra: String,
}

impl User {
    pub const TABLE: &'static str = "users";

    pub fn from_telegram(user: &teloxide::types::User) -> Self {
        Self {
            id: user.id.0 as i64,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone().unwrap_or_default(),
            username: user.username.clone().unwrap_or_default(),
            language_code: user.language_code.clone().unwrap_or_default(),
            is_premium: user.is_premium,
            is_bot: user.is_bot,
            last_seen: None,
            updated_at: Utc::now(),
            deleted_at: None,
            extra: String::new(),
        }
    }

    /// Mark the user as seen right now.
    pub fn seen(mut self) -> Self {
        self.last_seen = Some(Utc::now());
        self
    }
}

impl ContentHash for User {
    // last_seen and the meta columns stay out of the hash so a mere
    // sighting does not force a rewrite of an unchanged profile.
    fn digest_fields(&self, digest: &mut FieldDigest) {
        digest.push_i64("id", self.id);
        digest.push_str("first_name", &self.first_name);
        digest.push_str("last_name", &self.last_name);
        digest.push_str("username", &self.username);
        digest.push_str("language_code", &self.language_code);
        digest.push_bool("is_premium", self.is_premium);
        digest.push_bool("is_bot", self.is_bot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 111,
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            username: "johndoe".to_string(),
            language_code: "en".to_string(),
            is_premium: false,
            is_bot: false,
            last_seen: None,
            updated_at: Utc::now(),
            deleted_at: None,
            extra: String::new(),
        }
    }

    #[test]
    fn test_hash_is_stable_across_calls() {
        let user = sample_user();
        assert_eq!(user.content_hash(), user.content_hash());
    }

    #[test]
    fn test_hash_ignores_last_seen() {
        let user = sample_user();
        let hash = user.content_hash();
        assert_eq!(user.seen().content_hash(), hash);
    }

    #[test]
    fn test_hash_tracks_profile_changes() {
        let user = sample_user();
        let hash = user.content_hash();

        let mut renamed = sample_user();
        renamed.username = "johnny".to_string();
        assert_ne!(renamed.content_hash(), hash);
    }
}
