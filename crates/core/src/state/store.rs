use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use super::channel::ChannelState;
use crate::config::LurkerCfg;
use crate::types::Message;

/// Shared handle to one channel's state.
pub type ChannelHandle = Arc<tokio::sync::Mutex<ChannelState>>;

/// Registry of per-channel state. Unknown channels are created on first access.
#[derive(Debug)]
pub struct StateStore {
    cfg: Arc<LurkerCfg>,
    nick: String,
    channels: Mutex<HashMap<String, ChannelHandle>>,
}

impl StateStore {
    pub fn new(cfg: Arc<LurkerCfg>, nick: impl Into<String>) -> Self {
        Self {
            cfg,
            nick: nick.into(),
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// Handle for `channel`, creating default state if it does not exist yet.
    pub fn get(&self, channel: &str) -> ChannelHandle {
        let mut map = self
            .channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(channel.to_owned())
            .or_insert_with(|| {
                tracing::debug!(channel = %channel, "initialising channel state");
                Arc::new(tokio::sync::Mutex::new(ChannelState::new(channel, &self.cfg)))
            })
            .clone()
    }

    pub async fn record_inbound(&self, channel: &str, message: Message) {
        let handle = self.get(channel);
        handle.lock().await.record_inbound(message, &self.nick);
    }

    /// Record a sent line and return it as a bot `Message`.
    pub async fn record_outbound(&self, channel: &str, text: &str, emotes_used: &[String]) -> Message {
        let handle = self.get(channel);
        let msg = Message::at(channel, self.nick.as_str(), text, true, Utc::now());
        handle.lock().await.record_outbound(msg.clone(), emotes_used);
        msg
    }

    /// Names of every channel seen so far.
    pub fn channels(&self) -> Vec<String> {
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}
