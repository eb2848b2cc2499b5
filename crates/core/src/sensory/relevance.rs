use std::collections::HashSet;

use crate::config::LurkerCfg;
use crate::types::Message;

/// Words shorter than this (in characters) carry no topic signal.
const MIN_CONTENT_WORD_CHARS: usize = 4;

/// Case-insensitive substring match on the handle; `@nick` matches too.
pub fn mentions_handle(text: &str, nick: &str) -> bool {
    !nick.is_empty() && text.to_lowercase().contains(&nick.to_lowercase())
}

pub fn has_topic_change(text: &str, cfg: &LurkerCfg) -> bool {
    let lower = text.to_lowercase();
    cfg.topic_change_keywords
        .iter()
        .any(|k| !k.is_empty() && lower.contains(&k.to_lowercase()))
}

/// Lowercased alphabetic runs longer than three characters.
pub fn content_words(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|w| w.chars().count() >= MIN_CONTENT_WORD_CHARS)
        .map(str::to_lowercase)
        .collect()
}

/// Pick the history lines that relate to `text`, oldest first.
///
/// `history` must not contain the line being answered.
pub fn select(text: &str, nick: &str, history: &[Message], cfg: &LurkerCfg) -> Vec<Message> {
    if mentions_handle(text, nick) {
        let k = if has_topic_change(text, cfg) {
            cfg.mention_topic_window
        } else {
            cfg.mention_window
        };
        return tail(history, k).to_vec();
    }

    let current = content_words(text);
    if current.is_empty() {
        return Vec::new();
    }

    tail(history, cfg.relevance_scan)
        .iter()
        .filter(|m| !content_words(&m.content).is_disjoint(&current))
        .cloned()
        .collect()
}

fn tail(history: &[Message], n: usize) -> &[Message] {
    &history[history.len().saturating_sub(n)..]
}
