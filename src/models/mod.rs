//! Data models
//!
//! Entities persisted by the storage layer plus converters from the
//! Telegram wire types.

pub mod banned_user;
pub mod captcha;
pub mod chat;
pub mod kv;
pub mod message;
pub mod message_origin;
pub mod reply_markup;
pub mod user;
pub mod verified_user;

pub use banned_user::BannedUser;
pub use captcha::{Captcha, TapOutcome};
pub use chat::Chat;
pub use kv::KeyValue;
pub use message::Message;
pub use message_origin::MessageOrigin;
pub use reply_markup::ReplyMarkup;
pub use user::User;
pub use verified_user::VerifiedUser;
