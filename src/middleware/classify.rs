//! Classifier stage
//!
//! Decides whether an update needs verification at all: service updates,
//! bots, private chats and disallowed chats are dropped; verified users and
//! chat admins pass straight through; everyone else has their message
//! deleted and carries on to the ban and captcha stages.

use tracing::{error, warn};

use crate::models::VerifiedUser;

use super::{StageFlow, UpdateContext};

pub async fn classify(ctx: &mut UpdateContext<'_>) -> StageFlow {
    ctx.should_verify = true;

    let Some(sender) = ctx.sender() else {
        return StageFlow::Stop;
    };

    let sender_id = sender.id.0 as i64;
    let chat = &ctx.msg.chat;

    if sender_id == 0 || chat.id.0 == 0 || sender_id == chat.id.0 || sender.is_bot || chat.is_private() {
        return StageFlow::Stop;
    }

    if !ctx.deps.settings.telegram.is_chat_allowed(chat.id.0) {
        return StageFlow::Stop;
    }

    match ctx.deps.storage.is_verified_user(sender_id).await {
        Ok(true) => {
            ctx.should_verify = false;
            return StageFlow::Continue;
        }
        Ok(false) => {}
        Err(err) => {
            error!(error = %err, user_id = sender_id, "Verified-user lookup failed");
            return StageFlow::Stop;
        }
    }

    // Chat admins and owners are granted verification on first sight.
    match ctx.deps.gateway.is_chat_admin(chat.id.0, sender_id).await {
        Ok(true) => {
            let verified = VerifiedUser::new(sender_id, "admin/owner");
            if let Err(err) = ctx.deps.storage.verify_user(&verified).await {
                error!(error = %err, user_id = sender_id, "Persisting admin verification failed");
            }
            ctx.should_verify = false;
            return StageFlow::Continue;
        }
        Ok(false) => {}
        Err(err) => {
            error!(error = %err, user_id = sender_id, chat_id = chat.id.0, "Chat member lookup failed");
            return StageFlow::Stop;
        }
    }

    ctx.should_verify = true;

    // The sender is unverified; their message leaves the chat regardless of
    // how the remaining stages decide.
    if let Err(err) = ctx.deps.gateway.delete_message(chat.id.0, ctx.message_id()).await {
        warn!(error = %err, chat_id = chat.id.0, "Deleting unverified message failed");
    }

    StageFlow::Continue
}
