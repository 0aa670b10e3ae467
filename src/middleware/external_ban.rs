//! External ban stage
//!
//! One registry lookup per unverified sender. A hit bans the user in the
//! chat and persists a local ban row so the next sighting short-circuits at
//! the local stage. Lookup failures drop the update.

use tracing::{error, warn};

use crate::models::BannedUser;

use super::{StageFlow, UpdateContext};

pub async fn check_external_ban(ctx: &mut UpdateContext<'_>) -> StageFlow {
    if !ctx.should_verify {
        return StageFlow::Continue;
    }

    let Some(user_id) = ctx.sender_id() else {
        return StageFlow::Stop;
    };

    let verdict = match ctx.deps.ban_lookup.check_user(user_id).await {
        Ok(verdict) => verdict,
        Err(err) => {
            error!(error = %err, user_id, "External ban lookup failed");
            return StageFlow::Stop;
        }
    };

    if !verdict.is_banned {
        return StageFlow::Continue;
    }

    if let Err(err) = ctx.deps.gateway.ban_user(ctx.chat_id(), user_id, true).await {
        error!(error = %err, user_id, "Banning externally flagged user failed");
    }

    let notice = format!("User {user_id} is banned by external ban service");
    if let Err(err) = ctx.deps.gateway.send_notice(ctx.chat_id(), &notice).await {
        warn!(error = %err, user_id, "Sending external-ban notice failed");
    }

    if let Err(err) = ctx.deps.storage.ban_user(&BannedUser::new(user_id, "external")).await {
        error!(error = %err, user_id, "Persisting external ban failed");
    }

    StageFlow::Stop
}
