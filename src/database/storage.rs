//! Storage facade
//!
//! Wraps the relational database with the write-through entity cache. All
//! reads and writes of persisted state go through this type; the cache is
//! keyed by per-entity content hashes so unchanged rows are skipped without
//! a round trip.

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sqlx::{Row, Transaction};
use tracing::debug;

use crate::config::DatabaseConfig;
use crate::database::cache::{CacheValue, EntityCache};
use crate::database::connection::{create_pool, DatabasePool};
use crate::database::migrations::auto_migrate;
use crate::models::{BannedUser, Captcha, Chat, KeyValue, Message, MessageOrigin, ReplyMarkup, User, VerifiedUser};
use crate::utils::errors::Result;
use crate::utils::hash::ContentHash;

type AnyTransaction<'a> = Transaction<'a, sqlx::Any>;

/// Cache entries staged during a transaction and applied after commit, so
/// no transaction is held open across cache writes.
type StagedCache = Vec<(String, String)>;

/// Input for [`Storage::upsert_message`]: the message plus every chat and
/// user sighted in the same update. Persisted atomically.
#[derive(Debug, Default)]
pub struct UpsertMessageInput {
    pub message: Option<Message>,
    pub chats: Vec<Chat>,
    pub users: Vec<User>,
    pub origin: Option<MessageOrigin>,
    pub markup: Option<ReplyMarkup>,
}

#[derive(Clone)]
pub struct Storage {
    pool: DatabasePool,
    cache: EntityCache,
}

impl Storage {
    /// Connect, migrate and build the cache.
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        let pool = create_pool(config).await?;
        auto_migrate(&pool, &config.driver).await?;

        Ok(Self {
            pool,
            cache: EntityCache::new(),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Health probe for the admin API.
    pub async fn status(&self) -> Result<&'static str> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok("ok")
    }

    // --- users ---------------------------------------------------------

    pub async fn user_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, first_name, last_name, username, language_code, is_premium, is_bot, \
             last_seen, updated_at, deleted_at, extra FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| user_from_row(&row)).transpose()?)
    }

    /// Insert or update a single user.
    pub async fn upsert_user(&self, user: &User) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let staged = self.upsert_users(&mut tx, std::slice::from_ref(user)).await?;
        tx.commit().await?;
        self.apply_staged(staged);
        Ok(())
    }

    /// Batched hash-gated upsert. Users whose content hash matches the
    /// cached one are skipped; the rest go out as one bulk statement.
    /// Returns the cache entries to apply after the transaction commits.
    pub async fn upsert_users(&self, tx: &mut AnyTransaction<'_>, users: &[User]) -> Result<StagedCache> {
        let mut staged = StagedCache::new();
        let mut batch: Vec<&User> = Vec::new();

        for user in dedup_by_id(users, |u| u.id) {
            let key = EntityCache::user_key(user.id);
            let hash = user.content_hash();
            match self.cache.get(&key) {
                Some(CacheValue::Text(cached)) if cached == hash => continue,
                _ => {
                    staged.push((key, hash));
                    batch.push(user);
                }
            }
        }

        if batch.is_empty() {
            return Ok(staged);
        }

        let mut sql = String::from(
            "INSERT INTO users (id, first_name, last_name, username, language_code, \
             is_premium, is_bot, last_seen, updated_at, deleted_at, extra) VALUES ",
        );
        sql.push_str(&values_placeholders(batch.len(), 11));
        sql.push_str(
            " ON CONFLICT (id) DO UPDATE SET first_name = excluded.first_name, \
             last_name = excluded.last_name, username = excluded.username, \
             language_code = excluded.language_code, is_premium = excluded.is_premium, \
             is_bot = excluded.is_bot, last_seen = excluded.last_seen, \
             updated_at = excluded.updated_at, deleted_at = excluded.deleted_at, \
             extra = excluded.extra",
        );

        let mut query = sqlx::query(&sql);
        for user in &batch {
            query = query
                .bind(user.id)
                .bind(&user.first_name)
                .bind(&user.last_name)
                .bind(&user.username)
                .bind(&user.language_code)
                .bind(user.is_premium)
                .bind(user.is_bot)
                .bind(user.last_seen.map(|t| t.timestamp()))
                .bind(Utc::now().timestamp())
                .bind(user.deleted_at.map(|t| t.timestamp()))
                .bind(&user.extra);
        }
        query.execute(&mut **tx).await?;

        debug!(count = batch.len(), "Upserted users");
        Ok(staged)
    }

    // --- chats ---------------------------------------------------------

    /// Batched hash-gated chat upsert; same shape as [`Self::upsert_users`].
    pub async fn upsert_chats(&self, tx: &mut AnyTransaction<'_>, chats: &[Chat]) -> Result<StagedCache> {
        let mut staged = StagedCache::new();
        let mut batch: Vec<&Chat> = Vec::new();

        for chat in dedup_by_id(chats, |c| c.id) {
            let key = EntityCache::chat_key(chat.id);
            let hash = chat.content_hash();
            match self.cache.get(&key) {
                Some(CacheValue::Text(cached)) if cached == hash => continue,
                _ => {
                    staged.push((key, hash));
                    batch.push(chat);
                }
            }
        }

        if batch.is_empty() {
            return Ok(staged);
        }

        let mut sql = String::from(
            "INSERT INTO chats (id, type, title, username, is_private, updated_at, deleted_at, extra) VALUES ",
        );
        sql.push_str(&values_placeholders(batch.len(), 8));
        sql.push_str(
            " ON CONFLICT (id) DO UPDATE SET type = excluded.type, title = excluded.title, \
             username = excluded.username, is_private = excluded.is_private, \
             updated_at = excluded.updated_at, deleted_at = excluded.deleted_at, \
             extra = excluded.extra",
        );

        let mut query = sqlx::query(&sql);
        for chat in &batch {
            query = query
                .bind(chat.id)
                .bind(&chat.kind)
                .bind(&chat.title)
                .bind(&chat.username)
                .bind(chat.is_private)
                .bind(Utc::now().timestamp())
                .bind(chat.deleted_at.map(|t| t.timestamp()))
                .bind(&chat.extra);
        }
        query.execute(&mut **tx).await?;

        debug!(count = batch.len(), "Upserted chats");
        Ok(staged)
    }

    // --- messages ------------------------------------------------------

    /// Persist a message together with its participants in one transaction.
    /// Either everything lands or nothing does.
    pub async fn upsert_message(&self, input: UpsertMessageInput) -> Result<()> {
        let message = match input.message {
            Some(ref message) if message.id != 0 => message,
            _ => return Ok(()),
        };

        let mut tx = self.pool.begin().await?;

        let mut staged = self.upsert_chats(&mut tx, &input.chats).await?;
        staged.extend(self.upsert_users(&mut tx, &input.users).await?);

        sqlx::query(
            "INSERT INTO messages (id, sender_id, chat_id, text, caption, album_id, unixtime, \
             last_edit, is_forwarded, reply_to_id, created_at, updated_at, deleted_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (id) DO UPDATE SET sender_id = excluded.sender_id, \
             chat_id = excluded.chat_id, text = excluded.text, caption = excluded.caption, \
             album_id = excluded.album_id, unixtime = excluded.unixtime, \
             last_edit = excluded.last_edit, is_forwarded = excluded.is_forwarded, \
             reply_to_id = excluded.reply_to_id, updated_at = excluded.updated_at, \
             deleted_at = excluded.deleted_at",
        )
        .bind(message.id)
        .bind(message.sender_id)
        .bind(message.chat_id)
        .bind(&message.text)
        .bind(&message.caption)
        .bind(&message.album_id)
        .bind(message.unixtime)
        .bind(message.last_edit.map(|t| t.timestamp()))
        .bind(message.is_forwarded)
        .bind(message.reply_to_id)
        .bind(message.created_at.timestamp())
        .bind(Utc::now().timestamp())
        .bind(message.deleted_at.map(|t| t.timestamp()))
        .execute(&mut *tx)
        .await?;

        if let Some(ref origin) = input.origin {
            sqlx::query(
                "INSERT INTO message_origins (id, message_id, original_chat_id, original_sender_id, original_text) \
                 VALUES ($1, $2, $3, $4, $5) \
                 ON CONFLICT (message_id) DO UPDATE SET original_chat_id = excluded.original_chat_id, \
                 original_sender_id = excluded.original_sender_id, original_text = excluded.original_text",
            )
            .bind(origin.id)
            .bind(origin.message_id)
            .bind(origin.original_chat_id)
            .bind(origin.original_sender_id)
            .bind(&origin.original_text)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(ref markup) = input.markup {
            sqlx::query(
                "INSERT INTO reply_markups (id, message_id, data) VALUES ($1, $2, $3) \
                 ON CONFLICT (message_id) DO UPDATE SET data = excluded.data",
            )
            .bind(markup.id)
            .bind(markup.message_id)
            .bind(&markup.data)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        self.apply_staged(staged);

        Ok(())
    }

    pub async fn message_by_id(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, sender_id, chat_id, text, caption, album_id, unixtime, last_edit, \
             is_forwarded, reply_to_id, created_at, updated_at, deleted_at FROM messages WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| message_from_row(&row)).transpose()?)
    }

    // --- verification --------------------------------------------------

    /// Cached existence probe against the `verified` table.
    pub async fn is_verified_user(&self, user_id: i64) -> Result<bool> {
        let key = EntityCache::verified_key(user_id);
        if let Some(CacheValue::Flag(verified)) = self.cache.get(&key) {
            return Ok(verified);
        }

        let present = sqlx::query("SELECT 1 FROM verified WHERE id = $1 LIMIT 1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();

        self.cache.set(key, CacheValue::Flag(present));
        Ok(present)
    }

    /// Uncached ban check. Expired bans are deleted on read and report as
    /// not banned.
    pub async fn is_banned_user(&self, user_id: i64) -> Result<bool> {
        let row = sqlx::query(
            "SELECT id, banned_at, reason, expires_at, updated_at FROM banned WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let banned = match row {
            Some(ref row) => banned_from_row(row)?,
            None => return Ok(false),
        };

        if banned.is_expired() {
            sqlx::query("DELETE FROM banned WHERE id = $1")
                .bind(user_id)
                .execute(&self.pool)
                .await?;
            return Ok(false);
        }

        Ok(true)
    }

    pub async fn banned_user(&self, user_id: i64) -> Result<Option<BannedUser>> {
        let row = sqlx::query(
            "SELECT id, banned_at, reason, expires_at, updated_at FROM banned WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| banned_from_row(&row)).transpose()?)
    }

    /// Mark a user verified, removing any ban in the same transaction. The
    /// verification flag is cached optimistically and rolled back on error.
    pub async fn verify_user(&self, verified: &VerifiedUser) -> Result<()> {
        let key = EntityCache::verified_key(verified.id);
        self.cache.set(key.clone(), CacheValue::Flag(true));

        let result: Result<()> = async {
            let mut tx = self.pool.begin().await?;
            sqlx::query("DELETE FROM banned WHERE id = $1")
                .bind(verified.id)
                .execute(&mut *tx)
                .await?;
            upsert_verified_row(&mut tx, verified).await?;
            tx.commit().await?;
            Ok(())
        }
        .await;

        if result.is_err() {
            self.cache.delete(&key);
        }

        result
    }

    /// Bulk verification for the admin API. One transaction for all ids.
    pub async fn verify_users(&self, reason: &str, ids: &[i64]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for &id in ids {
            sqlx::query("DELETE FROM banned WHERE id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            upsert_verified_row(&mut tx, &VerifiedUser::new(id, reason)).await?;
        }

        tx.commit().await?;

        for &id in ids {
            self.cache.set(EntityCache::verified_key(id), CacheValue::Flag(true));
        }

        Ok(())
    }

    /// Ban a user, removing any verification in the same transaction.
    pub async fn ban_user(&self, banned: &BannedUser) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM verified WHERE id = $1")
            .bind(banned.id)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO banned (id, banned_at, reason, expires_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (id) DO UPDATE SET banned_at = excluded.banned_at, \
             reason = excluded.reason, expires_at = excluded.expires_at, \
             updated_at = excluded.updated_at",
        )
        .bind(banned.id)
        .bind(banned.banned_at.timestamp())
        .bind(&banned.reason)
        .bind(banned.expires_at.map(|t| t.timestamp()))
        .bind(Utc::now().timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.cache
            .set(EntityCache::verified_key(banned.id), CacheValue::Flag(false));

        Ok(())
    }

    // --- captchas ------------------------------------------------------

    /// Insert or replace the captcha for its user. The unique index on
    /// `user_id` collapses the issue race into a row replacement.
    pub async fn upsert_captcha(&self, captcha: &Captcha) -> Result<()> {
        sqlx::query(
            "INSERT INTO captchas (id, user_id, chat_id, message_id, digits, input, length, \
             width, height, expiration, expires_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             ON CONFLICT (user_id) DO UPDATE SET id = excluded.id, \
             chat_id = excluded.chat_id, message_id = excluded.message_id, \
             digits = excluded.digits, input = excluded.input, length = excluded.length, \
             width = excluded.width, height = excluded.height, \
             expiration = excluded.expiration, expires_at = excluded.expires_at, \
             updated_at = excluded.updated_at",
        )
        .bind(captcha.id)
        .bind(captcha.user_id)
        .bind(captcha.chat_id)
        .bind(captcha.message_id)
        .bind(&captcha.digits)
        .bind(&captcha.input)
        .bind(captcha.length as i64)
        .bind(i64::from(captcha.width))
        .bind(i64::from(captcha.height))
        .bind(captcha.expiration.as_secs() as i64)
        .bind(captcha.expires_at.timestamp())
        .bind(captcha.updated_at.timestamp())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn captcha_for_user(&self, user_id: i64) -> Result<Option<Captcha>> {
        let row = sqlx::query(
            "SELECT id, user_id, chat_id, message_id, digits, input, length, width, height, \
             expiration, expires_at, updated_at FROM captchas WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| captcha_from_row(&row)).transpose()?)
    }

    pub async fn delete_captcha_by_id(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM captchas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Captchas whose expiry is in the past, for the sweeper.
    pub async fn outdated_captchas(&self) -> Result<Vec<Captcha>> {
        let rows = sqlx::query(
            "SELECT id, user_id, chat_id, message_id, digits, input, length, width, height, \
             expiration, expires_at, updated_at FROM captchas WHERE expires_at < $1",
        )
        .bind(Utc::now().timestamp())
        .fetch_all(&self.pool)
        .await?;

        let captchas = rows
            .iter()
            .map(captcha_from_row)
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;
        Ok(captchas)
    }

    // --- key-value -----------------------------------------------------

    /// Serialise and store a value under `key`, write-through to the cache.
    pub async fn kv_set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let kv = KeyValue::new(key, value)?;
        let cache_key = EntityCache::kv_key(key);
        self.cache.set(cache_key.clone(), CacheValue::Bytes(kv.value.clone()));

        let result = sqlx::query(
            "INSERT INTO kv (key, value, updated_at) VALUES ($1, $2, $3) \
             ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        )
        .bind(&kv.key)
        .bind(&kv.value)
        .bind(kv.updated_at.timestamp())
        .execute(&self.pool)
        .await;

        if let Err(err) = result {
            self.cache.delete(&cache_key);
            return Err(err.into());
        }

        Ok(())
    }

    pub async fn kv_get(&self, key: &str) -> Result<Option<KeyValue>> {
        let cache_key = EntityCache::kv_key(key);
        if let Some(CacheValue::Bytes(value)) = self.cache.get(&cache_key) {
            return Ok(Some(KeyValue {
                key: key.to_string(),
                value,
                updated_at: Utc::now(),
            }));
        }

        let row = sqlx::query("SELECT key, value, updated_at FROM kv WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let kv = match row {
            Some(ref row) => KeyValue {
                key: row.try_get::<String, _>("key")?,
                value: row.try_get::<Vec<u8>, _>("value")?,
                updated_at: from_epoch(row.try_get::<i64, _>("updated_at")?),
            },
            None => return Ok(None),
        };

        self.cache.set(cache_key, CacheValue::Bytes(kv.value.clone()));
        Ok(Some(kv))
    }

    pub async fn kv_delete(&self, key: &str) -> Result<()> {
        self.cache.delete(&EntityCache::kv_key(key));
        sqlx::query("DELETE FROM kv WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn apply_staged(&self, staged: StagedCache) {
        for (key, hash) in staged {
            self.cache.set(key, CacheValue::Text(hash));
        }
    }
}

async fn upsert_verified_row(tx: &mut AnyTransaction<'_>, verified: &VerifiedUser) -> Result<()> {
    sqlx::query(
        "INSERT INTO verified (id, verified_at, reason, updated_at) VALUES ($1, $2, $3, $4) \
         ON CONFLICT (id) DO UPDATE SET verified_at = excluded.verified_at, \
         reason = excluded.reason, updated_at = excluded.updated_at",
    )
    .bind(verified.id)
    .bind(verified.verified_at.timestamp())
    .bind(&verified.reason)
    .bind(Utc::now().timestamp())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Keep the last occurrence of every id, preserving first-seen order.
fn dedup_by_id<'a, T, F: Fn(&T) -> i64>(items: &'a [T], id_of: F) -> Vec<&'a T> {
    let mut order: Vec<i64> = Vec::new();
    let mut by_id: std::collections::HashMap<i64, &T> = std::collections::HashMap::new();

    for item in items {
        let id = id_of(item);
        if by_id.insert(id, item).is_none() {
            order.push(id);
        }
    }

    order.into_iter().filter_map(|id| by_id.get(&id).copied()).collect()
}

/// `($1, …, $n), ($n+1, …), …` for a bulk insert.
fn values_placeholders(rows: usize, columns: usize) -> String {
    let mut sql = String::new();
    let mut index = 1;

    for row in 0..rows {
        if row > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for column in 0..columns {
            if column > 0 {
                sql.push_str(", ");
            }
            sql.push('$');
            sql.push_str(&index.to_string());
            index += 1;
        }
        sql.push(')');
    }

    sql
}

fn from_epoch(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn opt_from_epoch(secs: Option<i64>) -> Option<DateTime<Utc>> {
    secs.map(from_epoch)
}

fn user_from_row(row: &sqlx::any::AnyRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        username: row.try_get("username")?,
        language_code: row.try_get("language_code")?,
        is_premium: row.try_get("is_premium")?,
        is_bot: row.try_get("is_bot")?,
        last_seen: opt_from_epoch(row.try_get("last_seen")?),
        updated_at: from_epoch(row.try_get("updated_at")?),
        deleted_at: opt_from_epoch(row.try_get("deleted_at")?),
        extra: row.try_get("extra")?,
    })
}

fn message_from_row(row: &sqlx::any::AnyRow) -> std::result::Result<Message, sqlx::Error> {
    Ok(Message {
        id: row.try_get("id")?,
        sender_id: row.try_get::<Option<i64>, _>("sender_id")?.unwrap_or_default(),
        chat_id: row.try_get::<Option<i64>, _>("chat_id")?.unwrap_or_default(),
        text: row.try_get("text")?,
        caption: row.try_get("caption")?,
        album_id: row.try_get("album_id")?,
        unixtime: row.try_get("unixtime")?,
        last_edit: opt_from_epoch(row.try_get("last_edit")?),
        is_forwarded: row.try_get("is_forwarded")?,
        reply_to_id: row.try_get("reply_to_id")?,
        created_at: from_epoch(row.try_get("created_at")?),
        updated_at: from_epoch(row.try_get("updated_at")?),
        deleted_at: opt_from_epoch(row.try_get("deleted_at")?),
    })
}

fn banned_from_row(row: &sqlx::any::AnyRow) -> std::result::Result<BannedUser, sqlx::Error> {
    Ok(BannedUser {
        id: row.try_get("id")?,
        banned_at: from_epoch(row.try_get("banned_at")?),
        reason: row.try_get("reason")?,
        expires_at: opt_from_epoch(row.try_get("expires_at")?),
        updated_at: from_epoch(row.try_get("updated_at")?),
    })
}

fn captcha_from_row(row: &sqlx::any::AnyRow) -> std::result::Result<Captcha, sqlx::Error> {
    Ok(Captcha {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        chat_id: row.try_get("chat_id")?,
        message_id: row.try_get("message_id")?,
        digits: row.try_get("digits")?,
        input: row.try_get("input")?,
        length: row.try_get::<i64, _>("length")?.max(0) as usize,
        width: row.try_get::<i64, _>("width")?.max(0) as u32,
        height: row.try_get::<i64, _>("height")?.max(0) as u32,
        expiration: std::time::Duration::from_secs(row.try_get::<i64, _>("expiration")?.max(0) as u64),
        expires_at: from_epoch(row.try_get("expires_at")?),
        updated_at: from_epoch(row.try_get("updated_at")?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_placeholders_single_row() {
        assert_eq!(values_placeholders(1, 3), "($1, $2, $3)");
    }

    #[test]
    fn test_values_placeholders_numbers_continue_across_rows() {
        assert_eq!(values_placeholders(2, 2), "($1, $2), ($3, $4)");
    }

    #[test]
    fn test_dedup_keeps_last_occurrence() {
        let items = vec![(1i64, "a"), (2, "b"), (1, "c")];
        let deduped = dedup_by_id(&items, |(id, _)| *id);
        assert_eq!(deduped.len(), 2);
        assert_eq!(*deduped[0], (1, "c"));
        assert_eq!(*deduped[1], (2, "b"));
    }
}
