//! Chat-completion backends reached over HTTP.
//!
//! Two wire dialects are spoken: the OpenAI-style `/chat/completions` shape,
//! which Gemini, DeepSeek and most local servers also accept, and Anthropic's
//! Messages API.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::provider::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, Role};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request/response shape spoken by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    ChatCompletions,
    Messages,
}

/// Where a model lives, guessed from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backend {
    pub label: &'static str,
    pub dialect: Dialect,
    pub base_url: &'static str,
}

impl Backend {
    pub fn for_model(model: &str) -> Self {
        let m = model.to_ascii_lowercase();
        let (label, dialect, base_url) = if m.starts_with("gemini") || m.starts_with("gemma") {
            (
                "gemini",
                Dialect::ChatCompletions,
                "https://generativelanguage.googleapis.com/v1beta/openai",
            )
        } else if m.starts_with("claude") {
            ("anthropic", Dialect::Messages, "https://api.anthropic.com/v1")
        } else if m.starts_with("deepseek") {
            ("deepseek", Dialect::ChatCompletions, "https://api.deepseek.com")
        } else {
            ("openai", Dialect::ChatCompletions, "https://api.openai.com/v1")
        };
        Self { label, dialect, base_url }
    }
}

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<Turn<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Turn<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct MessagesReply {
    #[serde(default)]
    content: Vec<Block>,
    usage: Option<MessagesUsage>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Block {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Generator that talks to a hosted (or local) model over HTTP.
pub struct HttpProvider {
    backend: Backend,
    model: String,
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let model = model.into();
        let backend = Backend::for_model(&model);
        let base_url = base_url
            .as_deref()
            .unwrap_or(backend.base_url)
            .trim_end_matches('/')
            .to_owned();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();
        Self {
            backend,
            model,
            api_key: api_key.into(),
            base_url,
            client,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        match self.backend.dialect {
            Dialect::ChatCompletions => format!("{}/chat/completions", self.base_url),
            Dialect::Messages => format!("{}/messages", self.base_url),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(&self, body: &B) -> Result<R, LlmError> {
        let mut req = self.client.post(self.url()).json(body);
        req = match self.backend.dialect {
            Dialect::ChatCompletions => req.bearer_auth(&self.api_key),
            Dialect::Messages => req
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        };

        let resp = req.send().await.map_err(|e| LlmError::Unavailable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, backend = self.backend.label, "generation request rejected");
            return Err(classify(status, &text));
        }
        resp.json().await.map_err(|e| LlmError::RequestFailed(e.to_string()))
    }

    async fn chat(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = ChatBody {
            model: &self.model,
            messages: request.messages.iter().map(|m| Turn { role: role_name(m.role), content: &m.content }).collect(),
            max_tokens: request.constraints.max_tokens,
            temperature: request.constraints.temperature,
        };
        let reply: ChatReply = self.post(&body).await?;
        let usage = reply.usage.map_or((0, 0), |u| (u.prompt_tokens, u.completion_tokens));
        let content = reply
            .choices
            .into_iter()
            .find_map(|c| c.message.content)
            .unwrap_or_default();
        Ok(CompletionResponse { content, input_tokens: usage.0, output_tokens: usage.1 })
    }

    async fn messages(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        // system prompt travels as a top-level field here
        let body = MessagesBody {
            model: &self.model,
            system: request.system_prompt(),
            messages: request
                .messages
                .iter()
                .filter(|m| m.role != Role::System)
                .map(|m| Turn { role: role_name(m.role), content: &m.content })
                .collect(),
            max_tokens: request.constraints.max_tokens,
            temperature: request.constraints.temperature,
        };
        let reply: MessagesReply = self.post(&body).await?;
        let usage = reply.usage.map_or((0, 0), |u| (u.input_tokens, u.output_tokens));
        let content: String = reply
            .content
            .into_iter()
            .filter_map(|b| match b {
                Block::Text { text } => Some(text),
                Block::Other => None,
            })
            .collect();
        Ok(CompletionResponse { content, input_tokens: usage.0, output_tokens: usage.1 })
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

/// HTTP 429 and Gemini's `RESOURCE_EXHAUSTED` body (sent under various status
/// codes) are quota errors; 5xx means the backend is down.
fn classify(status: reqwest::StatusCode, body: &str) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || body.contains("RESOURCE_EXHAUSTED") {
        LlmError::RateLimited
    } else if status.is_server_error() {
        LlmError::Unavailable(format!("{status}: {body}"))
    } else {
        LlmError::RequestFailed(format!("{status}: {body}"))
    }
}

impl LlmProvider for HttpProvider {
    fn name(&self) -> &str {
        self.backend.label
    }

    fn complete(
        &self,
        request: CompletionRequest,
    ) -> Pin<Box<dyn Future<Output = Result<CompletionResponse, LlmError>> + Send + '_>> {
        match self.backend.dialect {
            Dialect::ChatCompletions => Box::pin(self.chat(request)),
            Dialect::Messages => Box::pin(self.messages(request)),
        }
    }
}

/// Provider configured by `LURKER_LLM_MODEL` and `LURKER_LLM_API_KEY`, with an
/// optional `LURKER_LLM_BASE_URL`. `None` when either required variable is unset.
pub fn from_env() -> Option<HttpProvider> {
    let model = std::env::var("LURKER_LLM_MODEL").ok()?;
    let api_key = std::env::var("LURKER_LLM_API_KEY").ok()?;
    let base_url = std::env::var("LURKER_LLM_BASE_URL").ok().filter(|s| !s.trim().is_empty());
    tracing::info!(model = %model, "generator configured from environment");
    Some(HttpProvider::new(model, api_key, base_url))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn backends_follow_model_names() {
        assert_eq!(Backend::for_model("gemini-2.0-flash").label, "gemini");
        assert_eq!(Backend::for_model("Gemma-3-27b-it").label, "gemini");
        assert_eq!(Backend::for_model("claude-haiku").dialect, Dialect::Messages);
        assert_eq!(Backend::for_model("deepseek-chat").label, "deepseek");
        assert_eq!(Backend::for_model("llama3:8b").dialect, Dialect::ChatCompletions);
    }

    #[test]
    fn urls_per_dialect() {
        let gemini = HttpProvider::new("gemini-2.0-flash", "k", None);
        assert_eq!(
            gemini.url(),
            "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
        );
        assert_eq!(gemini.name(), "gemini");

        let claude = HttpProvider::new("claude-haiku", "k", None);
        assert_eq!(claude.url(), "https://api.anthropic.com/v1/messages");

        let local = HttpProvider::new("qwen", "none", Some("http://127.0.0.1:11434/v1/".into()));
        assert_eq!(local.url(), "http://127.0.0.1:11434/v1/chat/completions");
    }

    #[test]
    fn quota_responses_are_rate_limited() {
        assert_eq!(classify(StatusCode::TOO_MANY_REQUESTS, ""), LlmError::RateLimited);
        assert_eq!(
            classify(StatusCode::BAD_REQUEST, r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#),
            LlmError::RateLimited
        );
        assert!(matches!(classify(StatusCode::SERVICE_UNAVAILABLE, "down"), LlmError::Unavailable(_)));
        assert!(matches!(classify(StatusCode::UNAUTHORIZED, "bad key"), LlmError::RequestFailed(_)));
    }

    #[test]
    fn chat_reply_tolerates_missing_content() {
        let reply: ChatReply = serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(reply.choices[0].message.content.is_none());
        assert!(reply.usage.is_none());
    }
}
