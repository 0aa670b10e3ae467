//! Message update handler
//!
//! Entry point for every message update: applies the sender filters, runs
//! the admission pipeline and records admitted messages.

use teloxide::types::Message;
use tracing::debug;

use crate::middleware::{challenge, classify, external_ban, local_ban, recorder, StageFlow, UpdateContext};
use crate::telegram::Dependencies;
use crate::utils::errors::Result;

pub async fn handle_message(msg: Message, deps: Dependencies) -> Result<()> {
    let telegram = &deps.settings.telegram;

    if telegram.ignore_via && msg.via_bot.is_some() {
        return Ok(());
    }

    if let Some(sender) = msg.from.as_ref() {
        let sender_id = sender.id.0 as i64;

        if telegram.blacklist.contains(&sender_id) {
            debug!(user_id = sender_id, "Sender is blacklisted, update dropped");
            return Ok(());
        }

        if !telegram.whitelist.is_empty() && !telegram.whitelist.contains(&sender_id) {
            debug!(user_id = sender_id, "Sender is not whitelisted, update dropped");
            return Ok(());
        }
    }

    let mut ctx = UpdateContext::new(&deps, &msg);

    if classify::classify(&mut ctx).await == StageFlow::Stop {
        return Ok(());
    }
    if local_ban::check_local_ban(&mut ctx).await == StageFlow::Stop {
        return Ok(());
    }
    if external_ban::check_external_ban(&mut ctx).await == StageFlow::Stop {
        return Ok(());
    }
    if challenge::issue_challenge(&mut ctx).await == StageFlow::Stop {
        return Ok(());
    }

    recorder::record_message(&deps, &msg);

    Ok(())
}
