//! Captcha keypad callback handler
//!
//! Single dispatch point for inline-button taps under the captcha
//! namespace. Applies the state-machine transition for the tapped token and
//! mirrors the result onto the prompt message. Every mutation is persisted
//! before the visible edit; a failed edit is reported but never rolled
//! back.

use teloxide::types::{CallbackQuery, MaybeInaccessibleMessage};
use tracing::{error, warn};

use crate::models::{TapOutcome, VerifiedUser};
use crate::services::metrics::FieldValue;
use crate::telegram::keyboard::{parse_callback_data, KeypadAction};
use crate::telegram::Dependencies;
use crate::utils::errors::Result;

const TEXT_VERIFIED: &str = "You have been verified!";
const TEXT_INVALID: &str = "Invalid captcha code. Please try again.";
const TEXT_NOT_OWNER: &str = "Only the original user can interact";

pub async fn handle_callback_query(query: CallbackQuery, deps: Dependencies) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let username = query.from.username.clone().unwrap_or_default();

    let action = query.data.as_deref().and_then(parse_callback_data);
    let Some(action) = action else {
        // Not our keyboard; acknowledge so the client stops its spinner.
        respond(&deps, &query.id, "").await;
        return Ok(());
    };

    let (chat_id, message_id) = match query.message {
        Some(MaybeInaccessibleMessage::Regular(ref msg)) => (msg.chat.id.0, i64::from(msg.id.0)),
        _ => {
            respond(&deps, &query.id, "").await;
            return Ok(());
        }
    };

    let captcha = match deps.storage.captcha_for_user(user_id).await {
        Ok(captcha) => captcha,
        Err(err) => {
            error!(error = %err, user_id, "Captcha lookup failed");
            respond(&deps, &query.id, "").await;
            return Ok(());
        }
    };

    let Some(mut captcha) = captcha else {
        // The tapper has no pending challenge, so this prompt is not theirs.
        respond(&deps, &query.id, TEXT_NOT_OWNER).await;
        return Ok(());
    };

    if captcha.expired() {
        if let Err(err) = deps.storage.delete_captcha_by_id(captcha.id).await {
            error!(error = %err, user_id, "Deleting expired captcha failed");
        }
        if let Err(err) = deps.gateway.delete_message(chat_id, message_id).await {
            warn!(error = %err, user_id, "Deleting expired captcha prompt failed");
        }
        respond(&deps, &query.id, "").await;
        return Ok(());
    }

    if captcha.message_id != message_id {
        // A late tap on a prompt that was refreshed away. Ignore it.
        respond(&deps, &query.id, "").await;
        return Ok(());
    }

    match action {
        KeypadAction::Refresh => {
            let png = match captcha.refresh(&deps.settings.captcha) {
                Ok(png) => png,
                Err(err) => {
                    error!(error = %err, user_id, "Captcha refresh failed");
                    respond(&deps, &query.id, "").await;
                    return Ok(());
                }
            };

            if let Err(err) = deps.storage.upsert_captcha(&captcha).await {
                error!(error = %err, user_id, "Persisting refreshed captcha failed");
                respond(&deps, &query.id, "").await;
                return Ok(());
            }

            let caption = captcha.caption(&username);
            if let Err(err) = deps
                .gateway
                .edit_captcha_photo(chat_id, message_id, &caption, png)
                .await
            {
                warn!(error = %err, user_id, "Editing refreshed captcha prompt failed");
            }

            deps.metrics.log_chat_event(
                "captcha_refreshed",
                chat_id,
                &[("user_id", FieldValue::Int(user_id))],
            );
            respond(&deps, &query.id, "").await;
        }

        KeypadAction::Digit(_) | KeypadAction::Backspace => {
            let outcome = match action {
                KeypadAction::Digit(digit) => captcha.tap_digit(digit),
                _ => captcha.tap_backspace(),
            };

            match outcome {
                TapOutcome::Solved => {
                    let verified = VerifiedUser::new(user_id, "captcha");
                    if let Err(err) = deps.storage.verify_user(&verified).await {
                        warn!(error = %err, user_id, "Persisting captcha verification failed");
                    }

                    respond(&deps, &query.id, TEXT_VERIFIED).await;

                    if let Err(err) = deps.gateway.delete_message(chat_id, message_id).await {
                        warn!(error = %err, user_id, "Deleting solved captcha prompt failed");
                    }
                    if let Err(err) = deps.storage.delete_captcha_by_id(captcha.id).await {
                        warn!(error = %err, user_id, "Deleting solved captcha failed");
                    }

                    deps.metrics.log_chat_event(
                        "captcha_solved",
                        chat_id,
                        &[("user_id", FieldValue::Int(user_id))],
                    );
                }

                TapOutcome::Failed => {
                    respond(&deps, &query.id, TEXT_INVALID).await;
                    captcha.touch();

                    if let Err(err) = deps.storage.upsert_captcha(&captcha).await {
                        error!(error = %err, user_id, "Persisting failed captcha attempt failed");
                        return Ok(());
                    }

                    edit_caption(&deps, &captcha, chat_id, message_id, &username).await;

                    deps.metrics.log_chat_event(
                        "captcha_failed",
                        chat_id,
                        &[("user_id", FieldValue::Int(user_id))],
                    );
                }

                TapOutcome::Edited => {
                    captcha.touch();

                    if let Err(err) = deps.storage.upsert_captcha(&captcha).await {
                        error!(error = %err, user_id, "Persisting captcha input failed");
                        respond(&deps, &query.id, "").await;
                        return Ok(());
                    }

                    edit_caption(&deps, &captcha, chat_id, message_id, &username).await;
                    respond(&deps, &query.id, "").await;

                    deps.metrics.log_chat_event(
                        "captcha_edited",
                        chat_id,
                        &[("user_id", FieldValue::Int(user_id))],
                    );
                }

                TapOutcome::Ignored => {
                    respond(&deps, &query.id, "").await;
                }
            }
        }
    }

    Ok(())
}

async fn edit_caption(deps: &Dependencies, captcha: &crate::models::Captcha, chat_id: i64, message_id: i64, username: &str) {
    let caption = captcha.caption(username);
    if let Err(err) = deps.gateway.edit_captcha_caption(chat_id, message_id, &caption).await {
        warn!(error = %err, user_id = captcha.user_id, "Editing captcha caption failed");
    }
}

/// Acknowledge the callback; an empty text is a bare acknowledgement so the
/// client stops showing its progress state.
async fn respond(deps: &Dependencies, callback_id: &str, text: &str) {
    if let Err(err) = deps.gateway.respond_to_callback(callback_id, text).await {
        warn!(error = %err, "Answering callback query failed");
    }
}
