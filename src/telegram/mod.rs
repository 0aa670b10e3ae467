//! Telegram gateway
//!
//! The only module that speaks the Telegram API shape. Everything else goes
//! through [`Gateway`], so swapping the bot SDK or stubbing it for tests
//! touches this file alone.

pub mod keyboard;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::dispatching::{DefaultKey, Dispatcher};
use teloxide::error_handlers::LoggingErrorHandler;
use teloxide::prelude::*;
use teloxide::types::{
    ChatId, ChatPermissions, InputFile, InputMedia, InputMediaPhoto, MessageId, Update, UserId,
};

use crate::config::Settings;
use crate::database::Storage;
use crate::handlers;
use crate::models::User;
use crate::services::{BanLookupService, MetricsSink};
use crate::utils::errors::{ChatWardenError, Result};

/// Everything the update handlers need, constructed once in `main` and
/// injected through the dispatcher.
#[derive(Clone)]
pub struct Dependencies {
    pub settings: Arc<Settings>,
    pub storage: Storage,
    pub gateway: Gateway,
    pub ban_lookup: BanLookupService,
    pub metrics: MetricsSink,
    /// Tracks detached recorder tasks so shutdown can wait for them.
    pub recorder_tasks: tokio_util::task::TaskTracker,
}

/// Thin wrapper over the bot SDK.
#[derive(Debug, Clone)]
pub struct Gateway {
    bot: Bot,
}

impl Gateway {
    /// Build the bot over the shared outbound HTTP client, so the SOCKS5
    /// proxy configuration applies to Telegram traffic too.
    pub fn new(settings: &Settings, http_client: reqwest::Client) -> Self {
        Self {
            bot: Bot::with_client(settings.telegram.token.clone(), http_client),
        }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    /// The bot's own account, as a storable user.
    pub async fn me(&self) -> Result<User> {
        let me = self.bot.get_me().await?;
        Ok(User::from_telegram(&me.user).seen())
    }

    /// Send the captcha prompt photo with the keypad; returns the prompt's
    /// message id.
    pub async fn send_captcha_prompt(&self, chat_id: i64, caption: &str, png: Vec<u8>) -> Result<i64> {
        let photo = InputFile::memory(png).file_name("captcha.png");
        let message = self
            .bot
            .send_photo(ChatId(chat_id), photo)
            .caption(caption)
            .reply_markup(keyboard::captcha_keyboard())
            .await?;

        Ok(i64::from(message.id.0))
    }

    /// Replace the prompt's photo and caption (captcha refresh).
    pub async fn edit_captcha_photo(
        &self,
        chat_id: i64,
        message_id: i64,
        caption: &str,
        png: Vec<u8>,
    ) -> Result<()> {
        let photo = InputMediaPhoto::new(InputFile::memory(png).file_name("captcha.png")).caption(caption);
        self.bot
            .edit_message_media(ChatId(chat_id), MessageId(message_id as i32), InputMedia::Photo(photo))
            .reply_markup(keyboard::captcha_keyboard())
            .await?;

        Ok(())
    }

    /// Update the prompt's caption after a keypad tap.
    pub async fn edit_captcha_caption(&self, chat_id: i64, message_id: i64, caption: &str) -> Result<()> {
        self.bot
            .edit_message_caption(ChatId(chat_id), MessageId(message_id as i32))
            .caption(caption)
            .reply_markup(keyboard::captcha_keyboard())
            .await?;

        Ok(())
    }

    pub async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id as i32))
            .await?;
        Ok(())
    }

    /// Answer a callback query; an empty text is a bare acknowledgement.
    pub async fn respond_to_callback(&self, callback_id: &str, text: &str) -> Result<()> {
        let mut request = self.bot.answer_callback_query(callback_id.to_string());
        if !text.is_empty() {
            request = request.text(text);
        }
        request.await?;
        Ok(())
    }

    pub async fn send_notice(&self, chat_id: i64, text: &str) -> Result<()> {
        self.bot.send_message(ChatId(chat_id), text).await?;
        Ok(())
    }

    pub async fn ban_user(&self, chat_id: i64, user_id: i64, revoke_messages: bool) -> Result<()> {
        self.bot
            .ban_chat_member(ChatId(chat_id), UserId(user_id as u64))
            .revoke_messages(revoke_messages)
            .await?;
        Ok(())
    }

    pub async fn restrict_user(
        &self,
        chat_id: i64,
        user_id: i64,
        permissions: ChatPermissions,
        until: DateTime<Utc>,
    ) -> Result<()> {
        self.bot
            .restrict_chat_member(ChatId(chat_id), UserId(user_id as u64), permissions)
            .until_date(until)
            .await?;
        Ok(())
    }

    /// Whether the user is the chat's owner or an administrator.
    pub async fn is_chat_admin(&self, chat_id: i64, user_id: i64) -> Result<bool> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id as u64))
            .await?;
        Ok(member.is_privileged())
    }
}

/// Build the update dispatcher: message updates run the admission pipeline,
/// callback updates go straight to the captcha keypad handler.
pub fn build_dispatcher(deps: Dependencies) -> Dispatcher<Bot, ChatWardenError, DefaultKey> {
    let bot = deps.gateway.bot();

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::messages::handle_message))
        .branch(Update::filter_edited_message().endpoint(handlers::messages::handle_message))
        .branch(Update::filter_callback_query().endpoint(handlers::callbacks::handle_callback_query));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![deps])
        .default_handler(|update| async move {
            tracing::debug!(update_id = update.id.0, "Unhandled update kind");
        })
        .error_handler(LoggingErrorHandler::with_custom_text("Update handler error"))
        .build()
}
