//! Captcha lifecycle tests: issue, tap persistence, solve, the stale
//! message guard and the expiry sweep, all against in-memory storage.

use chrono::Utc;

use ChatWarden::config::{CaptchaConfig, DatabaseConfig};
use ChatWarden::database::Storage;
use ChatWarden::models::{Captcha, TapOutcome, VerifiedUser};

async fn test_storage() -> Storage {
    Storage::new(&DatabaseConfig::default())
        .await
        .expect("in-memory storage")
}

fn issued_captcha(user_id: i64, chat_id: i64, message_id: i64) -> Captcha {
    let (mut captcha, _png) = Captcha::generate(&CaptchaConfig::default()).expect("generate captcha");
    captcha.user_id = user_id;
    captcha.chat_id = chat_id;
    captcha.message_id = message_id;
    captcha
}

#[tokio::test]
async fn issued_captcha_round_trips() {
    let storage = test_storage().await;

    let captcha = issued_captcha(222, -1001, 10);
    storage.upsert_captcha(&captcha).await.unwrap();

    let stored = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert_eq!(stored.id, captcha.id);
    assert_eq!(stored.digits, captcha.digits);
    assert_eq!(stored.message_id, 10);
    assert!(stored.input.is_empty());
    assert!(!stored.expired());
}

#[tokio::test]
async fn at_most_one_captcha_per_user() {
    let storage = test_storage().await;

    storage.upsert_captcha(&issued_captcha(222, -1001, 10)).await.unwrap();
    let replacement = issued_captcha(222, -1001, 11);
    storage.upsert_captcha(&replacement).await.unwrap();

    let stored = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert_eq!(stored.id, replacement.id);
    assert_eq!(stored.message_id, 11);
}

#[tokio::test]
async fn taps_are_persisted_before_edits() {
    let storage = test_storage().await;

    storage.upsert_captcha(&issued_captcha(222, -1001, 10)).await.unwrap();

    // Each tap loads the committed row, mutates it and persists it again;
    // a reader never observes uncommitted input.
    let mut captcha = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert_eq!(captcha.tap_digit('1'), TapOutcome::Edited);
    captcha.touch();
    storage.upsert_captcha(&captcha).await.unwrap();

    let stored = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert_eq!(stored.input, "1");
}

#[tokio::test]
async fn solving_verifies_and_removes_the_row() {
    let storage = test_storage().await;

    let mut captcha = issued_captcha(222, -1001, 10);
    storage.upsert_captcha(&captcha).await.unwrap();

    let digits = captcha.digits.clone();
    let mut outcome = TapOutcome::Ignored;
    for digit in digits.chars() {
        outcome = captcha.tap_digit(digit);
    }
    assert_eq!(outcome, TapOutcome::Solved);

    storage.verify_user(&VerifiedUser::new(222, "captcha")).await.unwrap();
    storage.delete_captcha_by_id(captcha.id).await.unwrap();

    assert!(storage.is_verified_user(222).await.unwrap());
    assert!(storage.captcha_for_user(222).await.unwrap().is_none());
}

#[tokio::test]
async fn failed_attempt_keeps_the_row_with_cleared_input() {
    let storage = test_storage().await;

    let mut captcha = issued_captcha(222, -1001, 10);
    captcha.digits = "654321".to_string();
    storage.upsert_captcha(&captcha).await.unwrap();

    let mut captcha = storage.captcha_for_user(222).await.unwrap().unwrap();
    let mut outcome = TapOutcome::Ignored;
    for digit in "123456".chars() {
        outcome = captcha.tap_digit(digit);
    }
    assert_eq!(outcome, TapOutcome::Failed);

    let before_expiry = captcha.expires_at;
    captcha.touch();
    storage.upsert_captcha(&captcha).await.unwrap();

    let stored = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert!(stored.input.is_empty());
    assert!(stored.expires_at >= before_expiry);
    assert!(!storage.is_verified_user(222).await.unwrap());
}

#[tokio::test]
async fn stale_message_taps_are_detectable() {
    let storage = test_storage().await;

    // A refresh re-persists the row under the same message id; taps that
    // reference any other message id must be ignored by the handler.
    let mut captcha = issued_captcha(222, -1001, 10);
    storage.upsert_captcha(&captcha).await.unwrap();

    captcha.refresh(&CaptchaConfig::default()).unwrap();
    storage.upsert_captcha(&captcha).await.unwrap();

    let stored = storage.captcha_for_user(222).await.unwrap().unwrap();
    assert_eq!(stored.message_id, 10);
    assert_ne!(stored.message_id, 9);
    assert!(stored.input.is_empty());
}

#[tokio::test]
async fn sweeper_collects_only_expired_rows() {
    let storage = test_storage().await;

    let mut expired = issued_captcha(222, -1001, 10);
    expired.expires_at = Utc::now() - chrono::Duration::seconds(1);
    storage.upsert_captcha(&expired).await.unwrap();

    let live = issued_captcha(333, -1001, 11);
    storage.upsert_captcha(&live).await.unwrap();

    let outdated = storage.outdated_captchas().await.unwrap();
    assert_eq!(outdated.len(), 1);
    assert_eq!(outdated[0].id, expired.id);

    storage.delete_captcha_by_id(expired.id).await.unwrap();

    // Next tick has nothing to do.
    assert!(storage.outdated_captchas().await.unwrap().is_empty());
    assert!(storage.captcha_for_user(333).await.unwrap().is_some());
}
