//! Forwarded-message origin model

use serde::{Deserialize, Serialize};
use teloxide::types::MessageOrigin as TgMessageOrigin;

/// Origin of a forwarded message.
///
/// Stored alongside the message itself; both sender and chat are optional
/// because hidden-user forwards expose neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageOrigin {
    pub id: i64,
    /// The forwarded message this origin belongs to.
    pub message_id: i64,
    pub original_chat_id: Option<i64>,
    pub original_sender_id: Option<i64>,
    pub original_text: String,
}

impl MessageOrigin {
    pub const TABLE: &'static str = "message_origins";

    /// Build an origin row for a forwarded message; `None` when the message
    /// is not a forward.
    pub fn from_telegram(msg: &teloxide::types::Message) -> Option<Self> {
        let origin = msg.forward_origin()?;

        let (original_sender_id, original_chat_id) = match origin {
            TgMessageOrigin::User { sender_user, .. } => (Some(sender_user.id.0 as i64), None),
            TgMessageOrigin::Chat { sender_chat, .. } => (None, Some(sender_chat.id.0)),
            TgMessageOrigin::Channel { chat, .. } => (None, Some(chat.id.0)),
            TgMessageOrigin::HiddenUser { .. } => (None, None),
        };

        Some(Self {
            id: i64::from(msg.id.0),
            message_id: i64::from(msg.id.0),
            original_chat_id,
            original_sender_id,
            original_text: msg.text().unwrap_or_default().to_string(),
        })
    }
}
