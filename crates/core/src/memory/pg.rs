use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Persistence, StoreError};
use crate::types::{Message, Relationship};

/// Postgres-backed persistence. Tables come from `migrations/`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Internal row type for sqlx deserialization.
#[derive(sqlx::FromRow)]
struct MessageRow {
    id: Uuid,
    channel: String,
    author: String,
    content: String,
    is_bot: bool,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            channel: row.channel,
            author: row.author,
            content: row.content,
            is_bot: row.is_bot,
            timestamp: row.created_at,
        }
    }
}

#[async_trait::async_trait]
impl Persistence for PgStore {
    async fn append_message(&self, msg: &Message) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO messages (id, channel, author, content, is_bot, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(msg.id)
        .bind(&msg.channel)
        .bind(&msg.author)
        .bind(&msg.content)
        .bind(msg.is_bot)
        .bind(msg.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn last_messages(&self, channel: &str, limit: i64) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, channel, author, content, is_bot, created_at \
             FROM messages WHERE channel = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(channel)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().rev().map(Into::into).collect())
    }

    async fn messages_after(
        &self,
        channel: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<Message>, StoreError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, channel, author, content, is_bot, created_at \
             FROM messages WHERE channel = $1 AND created_at > $2 ORDER BY created_at ASC",
        )
        .bind(channel)
        .bind(after)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn relationships(&self, channel: &str) -> Result<HashMap<String, Relationship>, StoreError> {
        let rows: Vec<(String, i64, i64)> = sqlx::query_as(
            "SELECT username, positive, negative FROM relationships WHERE channel = $1",
        )
        .bind(channel)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(user, positive, negative)| (user, Relationship { positive, negative }))
            .collect())
    }

    async fn record_interaction(
        &self,
        channel: &str,
        user: &str,
        positive: bool,
    ) -> Result<Relationship, StoreError> {
        let (pos, neg) = if positive { (1_i64, 0_i64) } else { (0, 1) };
        let (positive, negative): (i64, i64) = sqlx::query_as(
            "INSERT INTO relationships (channel, username, positive, negative, updated_at) \
             VALUES ($1, $2, $3, $4, now()) \
             ON CONFLICT (channel, username) DO UPDATE SET \
               positive = relationships.positive + EXCLUDED.positive, \
               negative = relationships.negative + EXCLUDED.negative, \
               updated_at = now() \
             RETURNING positive, negative",
        )
        .bind(channel)
        .bind(user.to_lowercase())
        .bind(pos)
        .bind(neg)
        .fetch_one(&self.pool)
        .await?;

        Ok(Relationship { positive, negative })
    }

    async fn record_emote_usage(&self, channel: &str, emote: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO emote_usage (channel, emote, uses, last_used_at) VALUES ($1, $2, 1, now()) \
             ON CONFLICT (channel, emote) DO UPDATE SET \
               uses = emote_usage.uses + 1, last_used_at = now()",
        )
        .bind(channel)
        .bind(emote)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn top_emotes(&self, channel: &str, limit: i64) -> Result<Vec<(String, i64)>, StoreError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT emote, uses FROM emote_usage WHERE channel = $1 \
             ORDER BY uses DESC, emote ASC LIMIT $2",
        )
        .bind(channel)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn add_fact(&self, channel: &str, user: &str, fact: &str, cap: usize) -> Result<(), StoreError> {
        let user = user.to_lowercase();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO user_facts (channel, username, fact, created_at) VALUES ($1, $2, $3, now())",
        )
        .bind(channel)
        .bind(&user)
        .bind(fact)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM user_facts WHERE id IN ( \
               SELECT id FROM user_facts WHERE channel = $1 AND username = $2 \
               ORDER BY created_at DESC, id DESC OFFSET $3)",
        )
        .bind(channel)
        .bind(&user)
        .bind(cap as i64)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn facts(&self, channel: &str, user: &str, limit: i64) -> Result<Vec<String>, StoreError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT fact FROM user_facts WHERE channel = $1 AND username = $2 \
             ORDER BY created_at DESC, id DESC LIMIT $3",
        )
        .bind(channel)
        .bind(user.to_lowercase())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(f,)| f).collect())
    }
}
