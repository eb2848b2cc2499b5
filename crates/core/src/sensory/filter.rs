use std::sync::LazyLock;

use regex::Regex;

use crate::config::LurkerCfg;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:https?://|www\.)\S+").expect("url pattern")
});

/// Latin and digit look-alikes folded onto Cyrillic before matching.
const LOOKALIKES: &[(char, char)] = &[
    ('a', 'а'), ('b', 'б'), ('c', 'с'), ('e', 'е'), ('h', 'н'), ('k', 'к'), ('m', 'м'),
    ('o', 'о'), ('p', 'р'), ('t', 'т'), ('x', 'х'), ('y', 'у'), ('g', 'г'), ('i', 'и'),
    ('l', 'л'), ('n', 'н'), ('r', 'р'), ('u', 'у'), ('z', 'з'), ('d', 'д'),
    ('3', 'з'), ('0', 'о'), ('1', 'л'), ('4', 'ч'), ('6', 'б'), ('8', 'в'),
];

/// Replace URLs with a `[link]` marker.
pub fn scrub_urls(text: &str) -> String {
    URL_RE.replace_all(text, "[link]").into_owned()
}

pub fn contains_url(text: &str) -> bool {
    URL_RE.is_match(text)
}

fn fold_cyrillic(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| {
            LOOKALIKES
                .iter()
                .find(|(from, _)| *from == c)
                .map(|(_, to)| *to)
                .unwrap_or(c)
        })
        .filter(|c| ('а'..='я').contains(c) || *c == 'ё')
        .collect()
}

fn letters_only(text: &str) -> String {
    text.to_lowercase().chars().filter(|c| c.is_alphabetic()).collect()
}

/// True if `text` contains a filtered word, also after look-alike folding and
/// with separators removed.
pub fn is_forbidden(text: &str, cfg: &LurkerCfg) -> bool {
    if cfg.forbidden_words.is_empty() {
        return false;
    }
    let plain = letters_only(text);
    let folded = fold_cyrillic(text);
    cfg.forbidden_words.iter().any(|w| {
        let w = w.to_lowercase();
        !w.is_empty() && (plain.contains(&w) || folded.contains(&w))
    })
}

/// Reply to a chat command, if it is one we answer.
pub fn command_reply(author: &str, text: &str) -> Option<String> {
    let cmd = text.trim().split_whitespace().next()?;
    match cmd.to_lowercase().as_str() {
        "!ping" => Some(format!("@{author}, Pong!")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg_with(words: &[&str]) -> LurkerCfg {
        LurkerCfg {
            forbidden_words: words.iter().map(|w| (*w).to_owned()).collect(),
            ..LurkerCfg::default()
        }
    }

    #[test]
    fn urls_become_markers() {
        assert_eq!(
            scrub_urls("look https://example.com/a?b=1 and www.test.org now"),
            "look [link] and [link] now"
        );
        assert!(contains_url("http://x.y"));
        assert!(!contains_url("no links here"));
    }

    #[test]
    fn empty_filter_allows_everything() {
        assert!(!is_forbidden("anything at all", &LurkerCfg::default()));
    }

    #[test]
    fn filter_sees_through_separators() {
        let cfg = cfg_with(&["badword"]);
        assert!(is_forbidden("you b.a.d w o r d", &cfg));
        assert!(!is_forbidden("good words only", &cfg));
    }

    #[test]
    fn filter_folds_lookalikes() {
        let cfg = cfg_with(&["дурак"]);
        assert!(is_forbidden("ты dypak", &cfg));
        assert!(is_forbidden("ДУРАК", &cfg));
    }

    #[test]
    fn ping_answers_author() {
        assert_eq!(command_reply("alice", "!ping"), Some("@alice, Pong!".to_owned()));
        assert_eq!(command_reply("alice", "  !PING now"), Some("@alice, Pong!".to_owned()));
        assert_eq!(command_reply("alice", "!uptime"), None);
    }
}
