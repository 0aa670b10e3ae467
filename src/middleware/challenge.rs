//! Captcha challenge stage
//!
//! Issues the challenge for unverified senders. If a live challenge
//! already exists the stage does nothing; otherwise it renders a fresh
//! code, posts the prompt and persists the row. A failed persist removes
//! the prompt again so no message lingers without state behind it.

use tracing::{error, warn};

use crate::models::Captcha;

use super::{StageFlow, UpdateContext};

pub async fn issue_challenge(ctx: &mut UpdateContext<'_>) -> StageFlow {
    if !ctx.should_verify {
        return StageFlow::Continue;
    }

    let Some(sender) = ctx.sender() else {
        return StageFlow::Stop;
    };
    let user_id = sender.id.0 as i64;

    match ctx.deps.storage.captcha_for_user(user_id).await {
        Ok(Some(ref captcha)) if !captcha.expired() => {
            // The prompt is already on screen; nothing to do.
            return StageFlow::Stop;
        }
        Ok(_) => {}
        Err(err) => {
            error!(error = %err, user_id, "Captcha lookup failed");
        }
    }

    let (mut captcha, png) = match Captcha::generate(&ctx.deps.settings.captcha) {
        Ok(generated) => generated,
        Err(err) => {
            error!(error = %err, user_id, "Captcha generation failed");
            return StageFlow::Stop;
        }
    };

    let caption = captcha.caption(sender.username.as_deref().unwrap_or(""));
    let message_id = match ctx
        .deps
        .gateway
        .send_captcha_prompt(ctx.chat_id(), &caption, png)
        .await
    {
        Ok(message_id) => message_id,
        Err(err) => {
            error!(error = %err, user_id, "Sending captcha prompt failed");
            return StageFlow::Stop;
        }
    };

    captcha.user_id = user_id;
    captcha.chat_id = ctx.chat_id();
    captcha.message_id = message_id;

    if let Err(err) = ctx.deps.storage.upsert_captcha(&captcha).await {
        error!(error = %err, user_id, "Persisting captcha failed");
        if let Err(err) = ctx.deps.gateway.delete_message(ctx.chat_id(), message_id).await {
            warn!(error = %err, user_id, "Removing orphan captcha prompt failed");
        }
    }

    StageFlow::Stop
}
