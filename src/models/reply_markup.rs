//! Inline keyboard markup model

use serde::{Deserialize, Serialize};

/// JSON-encoded inline keyboard attached to a stored message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplyMarkup {
    pub id: i64,
    pub message_id: i64,
    /// JSON-encoded reply markup.
    pub data: String,
}

impl ReplyMarkup {
    pub const TABLE: &'static str = "reply_markups";

    /// Capture the inline keyboard of a message, if it carries one.
    pub fn from_telegram(msg: &teloxide::types::Message) -> Option<Self> {
        let markup = msg.reply_markup()?;
        let data = serde_json::to_string(markup).ok()?;

        Some(Self {
            id: i64::from(msg.id.0),
            message_id: i64::from(msg.id.0),
            data,
        })
    }
}
