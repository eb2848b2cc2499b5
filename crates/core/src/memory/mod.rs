//! Durable chat memory: message log, relationship and emote counters, and
//! short per-user facts. Postgres when available, in-process otherwise.

mod ephemeral;
pub mod facts;
mod pg;

pub use ephemeral::EphemeralStore;
pub use pg::PgStore;

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::types::{Message, Relationship};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait::async_trait]
pub trait Persistence: Send + Sync {
    async fn append_message(&self, msg: &Message) -> Result<(), StoreError>;

    /// Newest `limit` messages of a channel, oldest first.
    async fn last_messages(&self, channel: &str, limit: i64) -> Result<Vec<Message>, StoreError>;

    /// Messages newer than `after`, oldest first.
    async fn messages_after(
        &self,
        channel: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<Message>, StoreError>;

    async fn relationships(&self, channel: &str) -> Result<HashMap<String, Relationship>, StoreError>;

    /// Bump one counter and return the updated pair.
    async fn record_interaction(
        &self,
        channel: &str,
        user: &str,
        positive: bool,
    ) -> Result<Relationship, StoreError>;

    async fn record_emote_usage(&self, channel: &str, emote: &str) -> Result<(), StoreError>;

    /// Emotes the bot used most in a channel, with counts.
    async fn top_emotes(&self, channel: &str, limit: i64) -> Result<Vec<(String, i64)>, StoreError>;

    /// Store a fact, evicting the oldest beyond `cap` for that user.
    async fn add_fact(&self, channel: &str, user: &str, fact: &str, cap: usize) -> Result<(), StoreError>;

    /// Newest facts about a user, newest first.
    async fn facts(&self, channel: &str, user: &str, limit: i64) -> Result<Vec<String>, StoreError>;
}
