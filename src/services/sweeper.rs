//! Captcha expiry sweeper
//!
//! Reconciles the captcha table with the chat: expired rows are deleted and
//! their prompt messages removed. Failures are logged and retried by the
//! next tick, never in-band.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::database::Storage;
use crate::telegram::Gateway;

/// Spawn the periodic sweep; returns once the shutdown token fires.
pub fn spawn_sweeper(
    storage: Storage,
    gateway: Gateway,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(interval) => sweep_once(&storage, &gateway).await,
            }
        }
    })
}

/// One reconciliation pass: delete each expired row, then its prompt.
pub async fn sweep_once(storage: &Storage, gateway: &Gateway) {
    let captchas = match storage.outdated_captchas().await {
        Ok(captchas) => captchas,
        Err(err) => {
            error!(error = %err, "Loading outdated captchas failed");
            return;
        }
    };

    for captcha in captchas {
        if let Err(err) = storage.delete_captcha_by_id(captcha.id).await {
            error!(error = %err, id = captcha.id, "Deleting outdated captcha failed");
            continue;
        }

        if let Err(err) = gateway.delete_message(captcha.chat_id, captcha.message_id).await {
            error!(error = %err, id = captcha.id, "Deleting outdated captcha prompt failed");
            continue;
        }

        info!(id = captcha.id, user_id = captcha.user_id, "Outdated captcha deleted");
    }
}
