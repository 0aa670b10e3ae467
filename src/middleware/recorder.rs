//! Message recorder
//!
//! Runs after admission. Collects the message and every user and chat
//! sighted in the update and hands them to storage on a detached task; the
//! pipeline never waits for persistence.

use teloxide::types::MessageOrigin as TgMessageOrigin;
use tracing::error;

use crate::database::UpsertMessageInput;
use crate::models::{Chat, Message, MessageOrigin, ReplyMarkup, User};
use crate::telegram::Dependencies;

/// Record the admitted message asynchronously.
pub fn record_message(deps: &Dependencies, msg: &teloxide::types::Message) {
    let Some(message) = Message::from_telegram(msg) else {
        return;
    };

    let input = UpsertMessageInput {
        message: Some(message),
        chats: sighted_chats(msg),
        users: sighted_users(msg),
        origin: MessageOrigin::from_telegram(msg),
        markup: ReplyMarkup::from_telegram(msg),
    };

    let storage = deps.storage.clone();
    let _ = deps.recorder_tasks.spawn(async move {
        if let Err(err) = storage.upsert_message(input).await {
            error!(error = %err, "Recording message failed");
        }
    });
}

/// The chat itself, the sender chat and the forward-origin chat.
fn sighted_chats(msg: &teloxide::types::Message) -> Vec<Chat> {
    let mut chats = vec![Chat::from_telegram(&msg.chat)];

    if let Some(sender_chat) = msg.sender_chat.as_ref() {
        chats.push(Chat::from_telegram(sender_chat));
    }

    match msg.forward_origin() {
        Some(TgMessageOrigin::Chat { sender_chat, .. }) => chats.push(Chat::from_telegram(sender_chat)),
        Some(TgMessageOrigin::Channel { chat, .. }) => chats.push(Chat::from_telegram(chat)),
        _ => {}
    }

    chats
}

/// The sender (marked seen), the forward-origin sender, the inline bot and
/// any joining or leaving members.
fn sighted_users(msg: &teloxide::types::Message) -> Vec<User> {
    let mut users = Vec::new();

    if let Some(sender) = msg.from.as_ref() {
        users.push(User::from_telegram(sender).seen());
    }

    if let Some(TgMessageOrigin::User { sender_user, .. }) = msg.forward_origin() {
        users.push(User::from_telegram(sender_user));
    }

    if let Some(via_bot) = msg.via_bot.as_ref() {
        users.push(User::from_telegram(via_bot));
    }

    if let Some(joined) = msg.new_chat_members() {
        users.extend(joined.iter().map(User::from_telegram));
    }

    if let Some(left) = msg.left_chat_member() {
        users.push(User::from_telegram(left));
    }

    users
}
