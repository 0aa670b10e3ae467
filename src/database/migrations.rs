//! Schema auto-migration
//!
//! The whole schema is expressed as idempotent `CREATE TABLE IF NOT EXISTS`
//! statements executed at boot, so a fresh database and an up-to-date one
//! take the same path. The statement set is shared between sqlite and
//! postgres; the only backend-specific piece is the byte-array column type.

use std::time::Duration;

use crate::database::connection::DatabasePool;
use crate::utils::errors::Result;

const MIGRATION_TIMEOUT: Duration = Duration::from_secs(15 * 60);

const STATEMENTS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id BIGINT PRIMARY KEY,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        username TEXT NOT NULL DEFAULT '',
        language_code TEXT NOT NULL DEFAULT '',
        is_premium BOOLEAN NOT NULL DEFAULT FALSE,
        is_bot BOOLEAN NOT NULL DEFAULT FALSE,
        last_seen BIGINT,
        updated_at BIGINT NOT NULL,
        deleted_at BIGINT,
        extra TEXT NOT NULL DEFAULT ''
    )",
    "CREATE INDEX IF NOT EXISTS idx_users_deleted_at ON users (deleted_at)",
    "CREATE TABLE IF NOT EXISTS chats (
        id BIGINT PRIMARY KEY,
        type TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        username TEXT NOT NULL DEFAULT '',
        is_private BOOLEAN NOT NULL DEFAULT FALSE,
        updated_at BIGINT NOT NULL,
        deleted_at BIGINT,
        extra TEXT NOT NULL DEFAULT ''
    )",
    "CREATE INDEX IF NOT EXISTS idx_chats_deleted_at ON chats (deleted_at)",
    "CREATE TABLE IF NOT EXISTS messages (
        id BIGINT PRIMARY KEY,
        sender_id BIGINT REFERENCES users (id) ON DELETE SET NULL ON UPDATE CASCADE,
        chat_id BIGINT REFERENCES chats (id) ON DELETE SET NULL ON UPDATE CASCADE,
        text TEXT NOT NULL DEFAULT '',
        caption TEXT NOT NULL DEFAULT '',
        album_id TEXT NOT NULL DEFAULT '',
        unixtime BIGINT NOT NULL DEFAULT 0,
        last_edit BIGINT,
        is_forwarded BOOLEAN NOT NULL DEFAULT FALSE,
        reply_to_id BIGINT,
        created_at BIGINT NOT NULL,
        updated_at BIGINT NOT NULL,
        deleted_at BIGINT
    )",
    "CREATE INDEX IF NOT EXISTS idx_messages_sender_id ON messages (sender_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_chat_id ON messages (chat_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_reply_to_id ON messages (reply_to_id)",
    "CREATE INDEX IF NOT EXISTS idx_messages_deleted_at ON messages (deleted_at)",
    "CREATE TABLE IF NOT EXISTS message_origins (
        id BIGINT PRIMARY KEY,
        message_id BIGINT NOT NULL,
        original_chat_id BIGINT,
        original_sender_id BIGINT,
        original_text TEXT NOT NULL DEFAULT ''
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_message_origins_message_id ON message_origins (message_id)",
    "CREATE TABLE IF NOT EXISTS reply_markups (
        id BIGINT PRIMARY KEY,
        message_id BIGINT NOT NULL,
        data TEXT NOT NULL DEFAULT ''
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_reply_markups_message_id ON reply_markups (message_id)",
    "CREATE TABLE IF NOT EXISTS captchas (
        id BIGINT PRIMARY KEY,
        user_id BIGINT NOT NULL,
        chat_id BIGINT NOT NULL DEFAULT 0,
        message_id BIGINT NOT NULL DEFAULT 0,
        digits TEXT NOT NULL DEFAULT '',
        input TEXT NOT NULL DEFAULT '',
        length BIGINT NOT NULL DEFAULT 0,
        width BIGINT NOT NULL DEFAULT 0,
        height BIGINT NOT NULL DEFAULT 0,
        expiration BIGINT NOT NULL DEFAULT 0,
        expires_at BIGINT NOT NULL DEFAULT 0,
        updated_at BIGINT NOT NULL
    )",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_captchas_user_id ON captchas (user_id)",
    "CREATE INDEX IF NOT EXISTS idx_captchas_expires_at ON captchas (expires_at)",
    "CREATE TABLE IF NOT EXISTS verified (
        id BIGINT PRIMARY KEY,
        verified_at BIGINT NOT NULL,
        reason TEXT NOT NULL DEFAULT '',
        updated_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS banned (
        id BIGINT PRIMARY KEY,
        banned_at BIGINT NOT NULL,
        reason TEXT NOT NULL DEFAULT '',
        expires_at BIGINT,
        updated_at BIGINT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS kv (
        key TEXT PRIMARY KEY,
        value {BYTES} NOT NULL,
        updated_at BIGINT NOT NULL
    )",
];

/// Run the idempotent schema migration, bounded by a 15-minute timeout.
pub async fn auto_migrate(pool: &DatabasePool, driver: &str) -> Result<()> {
    let bytes_type = match driver.to_lowercase().as_str() {
        "postgres" => "BYTEA",
        _ => "BLOB",
    };

    let migrate = async {
        for statement in STATEMENTS {
            let sql = statement.replace("{BYTES}", bytes_type);
            sqlx::query(&sql).execute(pool).await?;
        }
        Ok::<(), crate::utils::errors::ChatWardenError>(())
    };

    tokio::time::timeout(MIGRATION_TIMEOUT, migrate)
        .await
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::TimedOut, "database migration timed out"))?
}
