use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::{Persistence, StoreError};
use crate::types::{Message, Relationship};

/// Messages kept per channel unless a cap is given.
const DEFAULT_MESSAGE_CAP: usize = 1000;

#[derive(Debug, Default)]
struct Inner {
    messages: HashMap<String, VecDeque<Message>>,
    relationships: HashMap<(String, String), Relationship>,
    emote_usage: HashMap<(String, String), i64>,
    facts: HashMap<(String, String), VecDeque<String>>,
}

/// In-process persistence for runs without a database. Nothing survives a
/// restart, and each channel keeps only its newest `message_cap` messages.
#[derive(Debug)]
pub struct EphemeralStore {
    inner: Mutex<Inner>,
    message_cap: usize,
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::with_message_cap(DEFAULT_MESSAGE_CAP)
    }
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message_cap(cap: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            message_cap: cap.max(1),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn key(channel: &str, user: &str) -> (String, String) {
    (channel.to_owned(), user.to_lowercase())
}

#[async_trait::async_trait]
impl Persistence for EphemeralStore {
    async fn append_message(&self, msg: &Message) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let log = inner.messages.entry(msg.channel.clone()).or_default();
        log.push_back(msg.clone());
        while log.len() > self.message_cap {
            log.pop_front();
        }
        Ok(())
    }

    async fn last_messages(&self, channel: &str, limit: i64) -> Result<Vec<Message>, StoreError> {
        let inner = self.lock();
        let Some(all) = inner.messages.get(channel) else {
            return Ok(Vec::new());
        };
        let skip = all.len().saturating_sub(limit.max(0) as usize);
        Ok(all.iter().skip(skip).cloned().collect())
    }

    async fn messages_after(
        &self,
        channel: &str,
        after: DateTime<Utc>,
    ) -> Result<Vec<Message>, StoreError> {
        Ok(self
            .lock()
            .messages
            .get(channel)
            .map(|all| all.iter().filter(|m| m.timestamp > after).cloned().collect())
            .unwrap_or_default())
    }

    async fn relationships(&self, channel: &str) -> Result<HashMap<String, Relationship>, StoreError> {
        Ok(self
            .lock()
            .relationships
            .iter()
            .filter(|((ch, _), _)| ch == channel)
            .map(|((_, user), r)| (user.clone(), *r))
            .collect())
    }

    async fn record_interaction(
        &self,
        channel: &str,
        user: &str,
        positive: bool,
    ) -> Result<Relationship, StoreError> {
        let mut inner = self.lock();
        let rel = inner.relationships.entry(key(channel, user)).or_default();
        rel.record(positive);
        Ok(*rel)
    }

    async fn record_emote_usage(&self, channel: &str, emote: &str) -> Result<(), StoreError> {
        *self
            .lock()
            .emote_usage
            .entry((channel.to_owned(), emote.to_owned()))
            .or_default() += 1;
        Ok(())
    }

    async fn top_emotes(&self, channel: &str, limit: i64) -> Result<Vec<(String, i64)>, StoreError> {
        let mut rows: Vec<(String, i64)> = self
            .lock()
            .emote_usage
            .iter()
            .filter(|((ch, _), _)| ch == channel)
            .map(|((_, emote), uses)| (emote.clone(), *uses))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }

    async fn add_fact(&self, channel: &str, user: &str, fact: &str, cap: usize) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let list = inner.facts.entry(key(channel, user)).or_default();
        list.push_back(fact.to_owned());
        while list.len() > cap {
            list.pop_front();
        }
        Ok(())
    }

    async fn facts(&self, channel: &str, user: &str, limit: i64) -> Result<Vec<String>, StoreError> {
        Ok(self
            .lock()
            .facts
            .get(&key(channel, user))
            .map(|list| list.iter().rev().take(limit.max(0) as usize).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn last_messages_oldest_first() {
        let store = EphemeralStore::new();
        for i in 0..5 {
            store.append_message(&Message::chat("#c", "u", format!("m{i}"))).await.unwrap();
        }
        store.append_message(&Message::chat("#other", "u", "x")).await.unwrap();
        let last: Vec<_> = store
            .last_messages("#c", 2)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(last, vec!["m3", "m4"]);
    }

    #[tokio::test]
    async fn messages_after_filters_by_time() {
        let store = EphemeralStore::new();
        let now = Utc::now();
        store
            .append_message(&Message::at("#c", "u", "old", false, now - Duration::hours(2)))
            .await
            .unwrap();
        store.append_message(&Message::at("#c", "u", "new", false, now)).await.unwrap();
        let recent = store.messages_after("#c", now - Duration::hours(1)).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].content, "new");
    }

    #[tokio::test]
    async fn message_log_is_capped_per_channel() {
        let store = EphemeralStore::with_message_cap(3);
        for i in 0..10 {
            store.append_message(&Message::chat("#c", "u", format!("m{i}"))).await.unwrap();
        }
        store.append_message(&Message::chat("#d", "u", "kept")).await.unwrap();

        let kept: Vec<_> = store
            .last_messages("#c", 100)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(kept, vec!["m7", "m8", "m9"]);
        assert_eq!(store.last_messages("#d", 100).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn interactions_accumulate_case_insensitively() {
        let store = EphemeralStore::new();
        store.record_interaction("#c", "Alice", true).await.unwrap();
        let rel = store.record_interaction("#c", "alice", false).await.unwrap();
        assert_eq!(rel, Relationship { positive: 1, negative: 1 });
        let all = store.relationships("#c").await.unwrap();
        assert_eq!(all.get("alice"), Some(&rel));
        assert!(store.relationships("#other").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn facts_are_capped_oldest_out() {
        let store = EphemeralStore::new();
        for i in 0..12 {
            store.add_fact("#c", "bob", &format!("fact {i}"), 10).await.unwrap();
        }
        let facts = store.facts("#c", "BOB", 20).await.unwrap();
        assert_eq!(facts.len(), 10);
        assert_eq!(facts[0], "fact 11");
        assert!(!facts.contains(&"fact 1".to_owned()));
    }

    #[tokio::test]
    async fn top_emotes_by_use() {
        let store = EphemeralStore::new();
        for e in ["Kappa", "LUL", "Kappa"] {
            store.record_emote_usage("#c", e).await.unwrap();
        }
        let top = store.top_emotes("#c", 1).await.unwrap();
        assert_eq!(top, vec![("Kappa".to_owned(), 2)]);
    }
}
