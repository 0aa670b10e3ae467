//! Chat model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::hash::{ContentHash, FieldDigest};

/// A Telegram chat (private conversation, group, supergroup or channel).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier for the chat.
    pub id: i64,
    /// Chat type: "private", "group", "supergroup" or "channel".
    pub kind: String,
    pub title: String,
    pub username: String,
    pub is_private: bool,

    pub updated_at: DateTime<Utc>,
    /// Soft delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
    pub extra: String,
}

impl Chat {
    pub const TABLE: &'static str = "chats";

    pub fn from_telegram(chat: &teloxide::types::Chat) -> Self {
        let kind = if chat.is_private() {
            "private"
        } else if chat.is_group() {
            "group"
        } else if chat.is_supergroup() {
            "supergroup"
        } else {
            "channel"
        };

        Self {
            id: chat.id.0,
            kind: kind.to_string(),
            title: chat.title().unwrap_or_default().to_string(),
            username: chat.username().unwrap_or_default().to_string(),
            is_private: chat.is_private(),
            updated_at: Utc::now(),
            deleted_at: None,
            extra: String::new(),
        }
    }
}

impl ContentHash for Chat {
    fn digest_fields(&self, digest: &mut FieldDigest) {
        digest.push_i64("id", self.id);
        digest.push_str("type", &self.kind);
        digest.push_str("title", &self.title);
        digest.push_str("username", &self.username);
        digest.push_bool("is_private", self.is_private);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_chat() -> Chat {
        Chat {
            id: -1001,
            kind: "supergroup".to_string(),
            title: "Test Group".to_string(),
            username: String::new(),
            is_private: false,
            updated_at: Utc::now(),
            deleted_at: None,
            extra: String::new(),
        }
    }

    #[test]
    fn test_hash_is_stable() {
        let chat = sample_chat();
        assert_eq!(chat.content_hash(), chat.content_hash());
    }

    #[test]
    fn test_hash_tracks_title_change() {
        let chat = sample_chat();
        let mut renamed = sample_chat();
        renamed.title = "Renamed Group".to_string();
        assert_ne!(chat.content_hash(), renamed.content_hash());
    }
}
