use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\x{FE0F}\x{200D}\x{1F1E6}-\x{1F1FF}\x{1F3FB}-\x{1F3FF}]+")
        .expect("emoji pattern")
});

static ARTIFACT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[/?s\]|\[/?INST\]|\[/?USER\]|\[/?ASSISTANT\]|<s>|</s>|<\|.*?\|>")
        .expect("artifact pattern")
});

const QUOTES: &[char] = &['"', '\'', '«', '»', '“', '”', '`'];

/// Remove generation artifacts: emoji, role tags, a leading `name:` echo and
/// surrounding quotes. Whitespace is collapsed.
pub fn strip_artifacts(text: &str, names: &[&str]) -> String {
    let text = EMOJI_RE.replace_all(text, "");
    let text = ARTIFACT_RE.replace_all(&text, "");
    let mut text = text.trim().trim_matches(QUOTES).trim().to_owned();

    for name in names.iter().filter(|n| !n.is_empty()) {
        let prefix = format!("{}:", name.to_lowercase());
        if text.to_lowercase().starts_with(&prefix) {
            text = text.chars().skip(prefix.chars().count()).collect::<String>();
            text = text.trim().trim_matches(QUOTES).trim().to_owned();
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// CamelCase or all-caps ASCII token such as `PogChamp` or `KEKW`.
pub fn looks_like_emote(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    first.is_ascii_uppercase()
        && !rest.is_empty()
        && rest.iter().all(|c| c.is_ascii_alphanumeric())
        && rest.iter().any(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Drop emote-shaped tokens the channel does not know.
pub fn drop_unknown_emotes(text: &str, known: &HashSet<String>) -> String {
    text.split_whitespace()
        .filter(|w| !looks_like_emote(w) || known.contains(*w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_role_tags_and_emoji() {
        let out = strip_artifacts("[INST] so true 😂🔥 </s>", &[]);
        assert_eq!(out, "so true");
        assert_eq!(strip_artifacts("<|im_end|>hi<|eot|>", &[]), "hi");
    }

    #[test]
    fn strips_name_echo_and_quotes() {
        assert_eq!(strip_artifacts("Lurker: \"hey chat\"", &["lurker"]), "hey chat");
        assert_eq!(strip_artifacts("«Alina: привет»", &["lurker", "alina"]), "привет");
        assert_eq!(strip_artifacts("lurkers: are cool", &["lurker"]), "lurkers: are cool");
    }

    #[test]
    fn cyrillic_survives_emoji_strip() {
        assert_eq!(strip_artifacts("ну да 👍 конечно", &[]), "ну да конечно");
    }

    #[test]
    fn emote_shape() {
        assert!(looks_like_emote("PogChamp"));
        assert!(looks_like_emote("KEKW"));
        assert!(looks_like_emote("Pog4"));
        assert!(!looks_like_emote("Hello"));
        assert!(!looks_like_emote("monkaS"));
        assert!(!looks_like_emote("I"));
        assert!(!looks_like_emote("Kappa,"));
    }

    #[test]
    fn unknown_emotes_are_dropped() {
        let known: HashSet<String> = ["KEKW".to_owned()].into();
        assert_eq!(
            drop_unknown_emotes("Hello there KEKW FakeEmote ok", &known),
            "Hello there KEKW ok"
        );
    }
}
