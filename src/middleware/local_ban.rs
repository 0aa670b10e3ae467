//! Local ban stage
//!
//! Consults the `banned` table. Known banned users are re-banned in the
//! chat with their messages revoked; expired bans are cleaned up by the
//! storage read itself.

use tracing::{error, warn};

use super::{StageFlow, UpdateContext};

pub async fn check_local_ban(ctx: &mut UpdateContext<'_>) -> StageFlow {
    if !ctx.should_verify {
        return StageFlow::Continue;
    }

    let Some(user_id) = ctx.sender_id() else {
        return StageFlow::Stop;
    };

    match ctx.deps.storage.is_banned_user(user_id).await {
        Ok(false) => StageFlow::Continue,
        Ok(true) => {
            if let Err(err) = ctx.deps.gateway.ban_user(ctx.chat_id(), user_id, true).await {
                error!(error = %err, user_id, "Re-banning locally banned user failed");
            }

            let notice = format!("User {user_id} is banned in local db");
            if let Err(err) = ctx.deps.gateway.send_notice(ctx.chat_id(), &notice).await {
                warn!(error = %err, user_id, "Sending local-ban notice failed");
            }

            StageFlow::Stop
        }
        Err(err) => {
            error!(error = %err, user_id, "Banned-user lookup failed");
            StageFlow::Stop
        }
    }
}
