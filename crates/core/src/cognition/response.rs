use std::sync::Arc;
use std::time::Duration;

use crate::affect::{energy, mood};
use crate::config::LurkerCfg;
use crate::emotes::DEFAULT_EMOTES;
use crate::state::ChannelState;
use crate::types::{Message, RelationshipLevel};
use lurker_llm::provider::{ChatMessage, CompletionRequest, Constraints, LlmProvider};

/// Persona sections, joined with blank lines. `{name}` is the persona name.
const PERSONA_SECTIONS: &[&str] = &[
    "You are {name}, a regular viewer hanging out in a live stream chat. \
    You are a person, not a bot or an assistant. If someone asks whether you are a bot, dodge it casually.",
    "Write like chat: short lines, lowercase is fine, slang is fine. \
    Sometimes a single word or an emote is the whole reply.",
    "Use only the text emotes listed below, at the end of a line, and never the same one twice in a row. \
    No unicode emoji.",
];

const TASK_SUFFIX: &str = "Reply to the last message. Keep it short and natural. \
If there is nothing to say, make a joke or just drop an emote.";

/// Tasks for breaking a long silence. One is picked at random.
pub const SILENCE_TASKS: &[&str] = &[
    "Ask chat a short question about games, movies or anything fun. No greetings.",
    "Say something funny or ask something to get chat talking. Keep it short.",
    "Write something to start a conversation. A question or just a passing thought.",
];

/// Stand-in for the last user turn when nobody has said anything.
pub const SILENCE_MARKER: &str = "[chat has been quiet for a while]";

/// What the prompt may say about the person being answered.
#[derive(Debug, Clone, Default)]
pub struct AuthorContext {
    pub name: String,
    pub level: Option<RelationshipLevel>,
    pub facts: Vec<String>,
}

/// Emotes offered to the model: popular ones first, the defaults otherwise.
pub fn prompt_emotes(st: &ChannelState, cfg: &LurkerCfg) -> Vec<String> {
    if st.popular_emotes.is_empty() {
        DEFAULT_EMOTES.iter().map(|e| (*e).to_owned()).collect()
    } else {
        st.popular_emotes.iter().take(cfg.prompt_emote_count).cloned().collect()
    }
}

pub fn build_system_prompt(
    persona_name: &str,
    st: &ChannelState,
    author: Option<&AuthorContext>,
    task: Option<&str>,
    cfg: &LurkerCfg,
) -> String {
    let mut sections: Vec<String> = PERSONA_SECTIONS
        .iter()
        .map(|s| s.replace("{name}", persona_name))
        .collect();

    sections.push(format!(
        "Right now you feel {} and {}.",
        mood::describe(st.mood),
        energy::describe(st.energy)
    ));

    if let Some(author) = author {
        let mut about = String::new();
        if let Some(level) = author.level {
            about.push_str(&format!("Your relationship with {}: {}.", author.name, level.as_str()));
        }
        if !author.facts.is_empty() {
            if !about.is_empty() {
                about.push(' ');
            }
            about.push_str(&format!("You know about {}: {}.", author.name, author.facts.join("; ")));
        }
        if !about.is_empty() {
            sections.push(about);
        }
    }

    sections.push(format!("Available emotes: {}", prompt_emotes(st, cfg).join(", ")));

    if !st.trending_words.is_empty() {
        sections.push(format!("Chat keeps talking about: {}", st.trending_words.join(", ")));
    }

    match task {
        Some(task) => sections.push(task.to_owned()),
        None => sections.push(TASK_SUFFIX.to_owned()),
    }

    sections.join("\n\n")
}

/// System prompt, then context turns, then the line being answered.
///
/// Bot lines in the context become assistant turns; everything else is an
/// `author: text` user turn.
pub fn build_messages(system: String, context: &[Message], current: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(context.len() + 2);
    messages.push(ChatMessage::system(system));
    for msg in context {
        if msg.is_bot {
            messages.push(ChatMessage::assistant(msg.content.clone()));
        } else {
            messages.push(ChatMessage::user(format!("{}: {}", msg.author, msg.content)));
        }
    }
    messages.push(ChatMessage::user(current));
    messages
}

/// Calls the generator with bounded retries on quota errors.
pub struct ResponseRequester {
    provider: Arc<dyn LlmProvider>,
    constraints: Constraints,
    max_attempts: u32,
    base_delay: Duration,
}

impl ResponseRequester {
    pub fn new(provider: Arc<dyn LlmProvider>, cfg: &LurkerCfg) -> Self {
        Self {
            provider,
            constraints: Constraints { max_tokens: cfg.max_tokens, temperature: cfg.temperature },
            max_attempts: cfg.retry_max_attempts.max(1),
            base_delay: Duration::from_millis(cfg.retry_base_delay_ms),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Generated text, or `None` when the call failed or came back blank.
    pub async fn request(&self, messages: Vec<ChatMessage>) -> Option<String> {
        for attempt in 0..self.max_attempts {
            let request = CompletionRequest {
                messages: messages.clone(),
                constraints: self.constraints,
            };
            match self.provider.complete(request).await {
                Ok(resp) => {
                    let text = resp.content.trim();
                    tracing::debug!(
                        provider = self.provider.name(),
                        input_tokens = resp.input_tokens,
                        output_tokens = resp.output_tokens,
                        "generation finished"
                    );
                    return (!text.is_empty()).then(|| text.to_owned());
                }
                Err(e) if e.is_quota_exceeded() && attempt + 1 < self.max_attempts => {
                    let delay = self.base_delay * 2u32.saturating_pow(attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "generation quota exceeded, backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempt = attempt + 1, "generation failed");
                    return None;
                }
            }
        }
        None
    }
}
