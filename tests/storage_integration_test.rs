//! Storage integration tests against an in-memory sqlite database.

use chrono::{Duration, Utc};

use ChatWarden::config::DatabaseConfig;
use ChatWarden::database::{Storage, UpsertMessageInput};
use ChatWarden::models::{BannedUser, Chat, Message, User, VerifiedUser};

async fn test_storage() -> Storage {
    Storage::new(&DatabaseConfig::default())
        .await
        .expect("in-memory storage")
}

fn test_user(id: i64) -> User {
    User {
        id,
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        username: format!("user{id}"),
        language_code: "en".to_string(),
        is_premium: false,
        is_bot: false,
        last_seen: None,
        updated_at: Utc::now(),
        deleted_at: None,
        extra: String::new(),
    }
}

fn test_chat(id: i64) -> Chat {
    Chat {
        id,
        kind: "supergroup".to_string(),
        title: "Test Group".to_string(),
        username: String::new(),
        is_private: false,
        updated_at: Utc::now(),
        deleted_at: None,
        extra: String::new(),
    }
}

fn test_message(id: i64, sender_id: i64, chat_id: i64) -> Message {
    Message {
        id,
        sender_id,
        chat_id,
        text: "hello".to_string(),
        caption: String::new(),
        album_id: String::new(),
        unixtime: Utc::now().timestamp(),
        last_edit: None,
        is_forwarded: false,
        reply_to_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        deleted_at: None,
    }
}

#[tokio::test]
async fn verify_user_removes_ban() {
    let storage = test_storage().await;

    storage.ban_user(&BannedUser::new(111, "external")).await.unwrap();
    assert!(storage.is_banned_user(111).await.unwrap());

    storage.verify_user(&VerifiedUser::new(111, "captcha")).await.unwrap();

    assert!(storage.is_verified_user(111).await.unwrap());
    assert!(!storage.is_banned_user(111).await.unwrap());
}

#[tokio::test]
async fn ban_user_removes_verification() {
    let storage = test_storage().await;

    storage.verify_user(&VerifiedUser::new(222, "captcha")).await.unwrap();
    assert!(storage.is_verified_user(222).await.unwrap());

    storage.ban_user(&BannedUser::new(222, "external")).await.unwrap();

    assert!(storage.is_banned_user(222).await.unwrap());
    assert!(!storage.is_verified_user(222).await.unwrap());
}

#[tokio::test]
async fn expired_ban_is_deleted_on_read() {
    let storage = test_storage().await;

    let mut ban = BannedUser::new(333, "external");
    ban.expires_at = Some(Utc::now() - Duration::seconds(1));
    storage.ban_user(&ban).await.unwrap();

    assert!(!storage.is_banned_user(333).await.unwrap());
    assert!(storage.banned_user(333).await.unwrap().is_none());
}

#[tokio::test]
async fn indefinite_ban_survives_reads() {
    let storage = test_storage().await;

    storage.ban_user(&BannedUser::new(334, "external")).await.unwrap();

    assert!(storage.is_banned_user(334).await.unwrap());
    assert!(storage.is_banned_user(334).await.unwrap());
    assert!(storage.banned_user(334).await.unwrap().is_some());
}

#[tokio::test]
async fn unchanged_user_upsert_is_skipped_by_hash() {
    let storage = test_storage().await;

    let first_seen = Utc::now() - Duration::minutes(10);
    let mut user = test_user(444);
    user.last_seen = Some(first_seen);
    storage.upsert_user(&user).await.unwrap();

    // Same profile, newer sighting: the content hash is unchanged, so the
    // cached entry suppresses the write and the stored row keeps the old
    // last_seen.
    let mut resighted = test_user(444);
    resighted.last_seen = Some(Utc::now());
    storage.upsert_user(&resighted).await.unwrap();

    let stored = storage.user_by_id(444).await.unwrap().unwrap();
    assert_eq!(
        stored.last_seen.map(|t| t.timestamp()),
        Some(first_seen.timestamp())
    );

    // A profile change flips the hash and goes through.
    let mut renamed = test_user(444);
    renamed.username = "renamed".to_string();
    renamed.last_seen = Some(Utc::now());
    storage.upsert_user(&renamed).await.unwrap();

    let stored = storage.user_by_id(444).await.unwrap().unwrap();
    assert_eq!(stored.username, "renamed");
    assert_ne!(
        stored.last_seen.map(|t| t.timestamp()),
        Some(first_seen.timestamp())
    );
}

#[tokio::test]
async fn upsert_message_persists_participants_atomically() {
    let storage = test_storage().await;

    let input = UpsertMessageInput {
        message: Some(test_message(100, 555, -1001)),
        chats: vec![test_chat(-1001)],
        users: vec![test_user(555)],
        origin: None,
        markup: None,
    };
    storage.upsert_message(input).await.unwrap();

    assert!(storage.message_by_id(100).await.unwrap().is_some());
    assert!(storage.user_by_id(555).await.unwrap().is_some());
}

#[tokio::test]
async fn upsert_message_without_sender_row_persists_nothing() {
    let storage = test_storage().await;

    // The sender is missing from the batch, so the foreign key fails and
    // the whole transaction rolls back.
    let input = UpsertMessageInput {
        message: Some(test_message(101, 999, -1002)),
        chats: vec![test_chat(-1002)],
        users: vec![],
        origin: None,
        markup: None,
    };

    assert!(storage.upsert_message(input).await.is_err());
    assert!(storage.message_by_id(101).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_message_without_message_is_a_noop() {
    let storage = test_storage().await;

    let input = UpsertMessageInput {
        message: None,
        chats: vec![test_chat(-1003)],
        users: vec![test_user(666)],
        origin: None,
        markup: None,
    };
    storage.upsert_message(input).await.unwrap();

    assert!(storage.user_by_id(666).await.unwrap().is_none());
}

#[tokio::test]
async fn verify_users_bulk_from_api() {
    let storage = test_storage().await;

    storage.ban_user(&BannedUser::new(2, "external")).await.unwrap();
    storage
        .verify_users("Verified from API", &[1, 2, 3])
        .await
        .unwrap();

    for id in [1, 2, 3] {
        assert!(storage.is_verified_user(id).await.unwrap(), "user {id}");
        assert!(!storage.is_banned_user(id).await.unwrap(), "user {id}");
    }
}

#[tokio::test]
async fn kv_round_trip() {
    let storage = test_storage().await;

    storage.kv_set("numbers", &vec![1u64, 2, 3]).await.unwrap();

    let kv = storage.kv_get("numbers").await.unwrap().unwrap();
    assert_eq!(kv.decode::<Vec<u64>>().unwrap(), vec![1, 2, 3]);

    // A cold read (cache cleared) goes to the database and agrees.
    storage.clear_cache();
    let kv = storage.kv_get("numbers").await.unwrap().unwrap();
    assert_eq!(kv.decode::<Vec<u64>>().unwrap(), vec![1, 2, 3]);

    storage.kv_delete("numbers").await.unwrap();
    assert!(storage.kv_get("numbers").await.unwrap().is_none());
}

#[tokio::test]
async fn verified_probe_caches_both_outcomes() {
    let storage = test_storage().await;

    assert!(!storage.is_verified_user(777).await.unwrap());
    // Second read is served from cache and must agree.
    assert!(!storage.is_verified_user(777).await.unwrap());

    storage.verify_user(&VerifiedUser::new(777, "captcha")).await.unwrap();
    assert!(storage.is_verified_user(777).await.unwrap());

    // A cold probe against the database agrees with the cached one.
    storage.clear_cache();
    assert!(storage.is_verified_user(777).await.unwrap());
}
