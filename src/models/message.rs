//! Message model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::hash::{ContentHash, FieldDigest};

/// A stored chat message.
///
/// Replies form a self-referential graph through `reply_to_id`; the column
/// is nullable and dangling references are permitted, so deleting a message
/// never cascades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier.
    pub id: i64,
    pub sender_id: i64,
    pub chat_id: i64,
    pub text: String,
    /// Media caption, if any.
    pub caption: String,
    /// Media album the message belongs to, if any.
    pub album_id: String,
    /// Unix timestamp when the message was sent.
    pub unixtime: i64,
    /// Time of the last edit, if the message was edited.
    pub last_edit: Option<DateTime<Utc>>,
    pub is_forwarded: bool,
    /// Original message id for replies.
    pub reply_to_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Soft delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Message {
    pub const TABLE: &'static str = "messages";

    /// Build a message row from an incoming update. Returns `None` for
    /// service messages without a sender.
    pub fn from_telegram(msg: &teloxide::types::Message) -> Option<Self> {
        let sender = msg.from.as_ref()?;

        Some(Self {
            id: i64::from(msg.id.0),
            sender_id: sender.id.0 as i64,
            chat_id: msg.chat.id.0,
            text: msg.text().unwrap_or_default().to_string(),
            caption: msg.caption().unwrap_or_default().to_string(),
            album_id: msg.media_group_id().unwrap_or_default().to_string(),
            unixtime: msg.date.timestamp(),
            last_edit: msg.edit_date().copied(),
            is_forwarded: msg.forward_origin().is_some(),
            reply_to_id: msg.reply_to_message().map(|reply| i64::from(reply.id.0)),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        })
    }
}

impl ContentHash for Message {
    fn digest_fields(&self, digest: &mut FieldDigest) {
        digest.push_i64("id", self.id);
        digest.push_i64("sender_id", self.sender_id);
        digest.push_i64("chat_id", self.chat_id);
        digest.push_str("text", &self.text);
        digest.push_str("caption", &self.caption);
        digest.push_str("album_id", &self.album_id);
        digest.push_i64("unixtime", self.unixtime);
        digest.push_opt_i64("last_edit", self.last_edit.map(|t| t.timestamp()));
        digest.push_bool("is_forwarded", self.is_forwarded);
        digest.push_opt_i64("reply_to_id", self.reply_to_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_message() -> Message {
        Message {
            id: 100,
            sender_id: 222,
            chat_id: -1001,
            text: "hello".to_string(),
            caption: String::new(),
            album_id: String::new(),
            unixtime: 1_700_000_000,
            last_edit: None,
            is_forwarded: false,
            reply_to_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn test_hash_tracks_edits() {
        let msg = sample_message();
        let mut edited = sample_message();
        edited.text = "hello, edited".to_string();
        edited.last_edit = Some(Utc::now());
        assert_ne!(msg.content_hash(), edited.content_hash());
    }

    #[test]
    fn test_hash_distinguishes_missing_reply() {
        let msg = sample_message();
        let mut reply = sample_message();
        reply.reply_to_id = Some(0);
        assert_ne!(msg.content_hash(), reply.content_hash());
    }
}
