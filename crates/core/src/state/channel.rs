use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};

use super::ring::RingBuffer;
use crate::config::LurkerCfg;
use crate::sensory::relevance::mentions_handle;
use crate::types::{Message, Relationship, clamp_scalar};

/// Mutable per-channel record. Owned by one channel worker at a time.
#[derive(Debug, Clone)]
pub struct ChannelState {
    pub name: String,
    pub mood: f64,
    pub energy: f64,
    pub last_response_at: Option<DateTime<Utc>>,
    pub last_message_at: Option<DateTime<Utc>>,
    pub messages_since_response: u32,
    pub history: RingBuffer<Message>,
    pub recent_responses: RingBuffer<String>,
    pub recent_used_emotes: RingBuffer<String>,
    pub known_emotes: HashSet<String>,
    pub popular_emotes: Vec<String>,
    /// Words chat has been using a lot lately.
    pub trending_words: Vec<String>,
    pub busy_until: Option<DateTime<Utc>>,
    pub afk_until: Option<DateTime<Utc>>,
    /// Lines sent since the fatigue counter last reset.
    pub recent_sent: u32,
    pub last_sent_at: Option<DateTime<Utc>>,
    /// Send time of the bot line whose reactions are being counted.
    pub awaiting_reactions: Option<DateTime<Utc>>,
    pub reactions: u32,
    pub last_silence_break_at: Option<DateTime<Utc>>,
    pub relationships: HashMap<String, Relationship>,
    reaction_window: Duration,
}

impl ChannelState {
    pub fn new(name: impl Into<String>, cfg: &LurkerCfg) -> Self {
        Self {
            name: name.into(),
            mood: clamp_scalar(cfg.mood_neutral),
            energy: clamp_scalar(cfg.energy_day),
            last_response_at: None,
            last_message_at: None,
            messages_since_response: 0,
            history: RingBuffer::new(cfg.history_cap),
            recent_responses: RingBuffer::new(cfg.recent_responses_cap),
            recent_used_emotes: RingBuffer::new(cfg.emote_cooldown_cap),
            known_emotes: HashSet::new(),
            popular_emotes: Vec::new(),
            trending_words: Vec::new(),
            busy_until: None,
            afk_until: None,
            recent_sent: 0,
            last_sent_at: None,
            awaiting_reactions: None,
            reactions: 0,
            last_silence_break_at: None,
            relationships: HashMap::new(),
            reaction_window: Duration::seconds(cfg.reaction_window_secs),
        }
    }

    /// Append an inbound line. Chat lines bump the since-response counter and,
    /// when they address `nick` inside the reaction window, count as a reaction.
    pub fn record_inbound(&mut self, msg: Message, nick: &str) {
        self.last_message_at = Some(msg.timestamp);
        if !msg.is_bot {
            self.messages_since_response = self.messages_since_response.saturating_add(1);
            if let Some(sent_at) = self.awaiting_reactions {
                if msg.timestamp - sent_at <= self.reaction_window
                    && mentions_handle(&msg.content, nick)
                {
                    self.reactions += 1;
                }
            }
        }
        self.history.push(msg);
    }

    /// Record a line the bot just sent.
    pub fn record_outbound(&mut self, msg: Message, emotes_used: &[String]) {
        let now = msg.timestamp;
        self.messages_since_response = 0;
        self.last_response_at = Some(now);
        self.last_message_at = Some(now);
        self.recent_sent = self.recent_sent.saturating_add(1);
        self.last_sent_at = Some(now);
        self.recent_responses.push(msg.content.clone());
        for emote in emotes_used {
            self.recent_used_emotes.push(emote.clone());
        }
        self.awaiting_reactions = Some(now);
        self.reactions = 0;
        self.history.push(msg);
    }

    /// Record a follow-up line (typo correction) without touching cooldowns.
    pub fn record_followup(&mut self, msg: Message) {
        self.last_message_at = Some(msg.timestamp);
        self.history.push(msg);
    }

    pub fn is_away(&self, now: DateTime<Utc>) -> bool {
        self.afk_until.is_some_and(|t| t > now) || self.busy_until.is_some_and(|t| t > now)
    }

    /// Drop expired AFK/busy flags. Returns true if anything was cleared.
    pub fn clear_expired_away(&mut self, now: DateTime<Utc>) -> bool {
        let mut cleared = false;
        if self.afk_until.is_some_and(|t| t <= now) {
            self.afk_until = None;
            cleared = true;
        }
        if self.busy_until.is_some_and(|t| t <= now) {
            self.busy_until = None;
            cleared = true;
        }
        cleared
    }

    /// Chat lines (bot lines excluded) in the minute before `now`.
    pub fn messages_per_minute(&self, now: DateTime<Utc>) -> usize {
        let since = now - Duration::seconds(60);
        self.history
            .iter()
            .filter(|m| !m.is_bot && m.timestamp > since && m.timestamp <= now)
            .count()
    }

    pub fn relationship(&self, user: &str) -> Relationship {
        self.relationships
            .get(&user.to_lowercase())
            .copied()
            .unwrap_or_default()
    }

    pub fn relationship_mut(&mut self, user: &str) -> &mut Relationship {
        self.relationships.entry(user.to_lowercase()).or_default()
    }

    pub fn set_mood(&mut self, v: f64) {
        self.mood = clamp_scalar(v);
    }

    pub fn set_energy(&mut self, v: f64) {
        self.energy = clamp_scalar(v);
    }
}
