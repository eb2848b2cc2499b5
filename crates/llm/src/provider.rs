use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A single turn handed to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Sampling constraints for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constraints {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for Constraints {
    fn default() -> Self {
        Self { max_tokens: 200, temperature: 0.9 }
    }
}

/// Generation request: system prompt first, then context turns, then the
/// line being answered.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub constraints: Constraints,
}

impl CompletionRequest {
    /// The system prompt, if the first message carries one.
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Error type for generation calls.
///
/// Only [`LlmError::RateLimited`] is worth retrying; everything else fails fast.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LlmError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),
    #[error("quota exceeded")]
    RateLimited,
    #[error("request failed: {0}")]
    RequestFailed(String),
}

impl LlmError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

/// Trait for generation backends (OpenAI-compatible, Anthropic, mocks).
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>>;
}

/// Mock provider for tests and offline runs.
///
/// Replays a scripted queue of outcomes; once the queue is drained it keeps
/// answering with the fallback text.
#[derive(Debug)]
pub struct MockProvider {
    fallback: String,
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self::scripted(response, Vec::new())
    }

    /// Outcomes are returned in order before falling back to `fallback`.
    pub fn scripted(fallback: impl Into<String>, script: Vec<Result<String, LlmError>>) -> Self {
        Self {
            fallback: fallback.into(),
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Number of `complete` calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Copy of the most recent request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LlmProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request);
        let next = self
            .script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
            .unwrap_or_else(|| Ok(self.fallback.clone()));
        Box::pin(async move {
            next.map(|content| CompletionResponse {
                content,
                input_tokens: 10,
                output_tokens: 20,
            })
        })
    }
}
