use std::sync::Mutex;

use chrono::{DateTime, Utc};

/// One line read from chat.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundLine {
    pub channel: String,
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundLine {
    pub fn new(channel: impl Into<String>, author: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            author: author.into(),
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// One line the bot put into chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundLine {
    pub channel: String,
    pub text: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,
    #[error("send failed: {0}")]
    Send(String),
}

/// Outbound half of a chat connection.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, channel: &str, text: &str) -> Result<(), TransportError>;
}

/// Keeps every sent line in memory. Used by tests and dry runs.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundLine>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundLine> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, channel: &str, text: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(OutboundLine { channel: channel.to_owned(), text: text.to_owned() });
        Ok(())
    }
}
