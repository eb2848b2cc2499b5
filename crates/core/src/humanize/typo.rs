use std::collections::HashSet;
use std::time::Duration;

use crate::config::LurkerCfg;
use crate::entropy::Entropy;
use crate::sensory::filter::contains_url;
use crate::types::Correction;

/// Whole-word misspellings keyed by lowercase form.
const WORD_TYPOS: &[(&str, &str)] = &[
    ("the", "teh"),
    ("you", "yuo"),
    ("what", "waht"),
    ("because", "becuase"),
    ("really", "realy"),
    ("definitely", "definately"),
    ("probably", "probly"),
    ("should", "shoud"),
    ("which", "wich"),
    ("something", "somthing"),
    ("что", "чо"),
    ("сейчас", "щас"),
    ("привет", "превет"),
    ("конечно", "канешно"),
    ("вообще", "вобще"),
    ("нормально", "нормальна"),
    ("может", "мож"),
    ("почему", "пачему"),
];

/// Keyboard rows used for neighbour substitutions.
const ROWS: &[&str] = &[
    "qwertyuiop",
    "asdfghjkl",
    "zxcvbnm",
    "йцукенгшщзхъ",
    "фывапролджэ",
    "ячсмитьбю",
];

/// Marks the start of a protected-token placeholder.
const PLACEHOLDER: char = '\u{E000}';

/// Typo injection result: the new text and the word it broke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Typo {
    pub text: String,
    pub original_word: String,
}

/// Typo chance for a mood value; happier means sloppier.
pub fn typo_chance(mood: f64, cfg: &LurkerCfg) -> f64 {
    (cfg.typo_base_chance * (0.5 + mood / 100.0)).clamp(0.0, 1.0)
}

/// Swap URLs, @mentions and known emotes for placeholders.
fn protect(text: &str, known_emotes: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    let mut saved = Vec::new();
    let words = text
        .split_whitespace()
        .map(|w| {
            if w.starts_with('@') || contains_url(w) || known_emotes.contains(w) {
                saved.push(w.to_owned());
                format!("{PLACEHOLDER}{}", saved.len() - 1)
            } else {
                w.to_owned()
            }
        })
        .collect();
    (words, saved)
}

fn restore(words: &[String], saved: &[String]) -> String {
    words
        .iter()
        .map(|w| match w.strip_prefix(PLACEHOLDER) {
            Some(idx) => idx
                .parse::<usize>()
                .ok()
                .and_then(|i| saved.get(i))
                .cloned()
                .unwrap_or_else(|| w.clone()),
            None => w.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a word into its letter core and trailing punctuation.
fn split_trailing(word: &str) -> (&str, &str) {
    let end = word
        .char_indices()
        .rev()
        .take_while(|(_, c)| !c.is_alphanumeric())
        .last()
        .map(|(i, _)| i)
        .unwrap_or(word.len());
    word.split_at(end)
}

fn mutable_word(word: &str) -> bool {
    let (core, _) = split_trailing(word);
    !word.starts_with(PLACEHOLDER) && core.chars().count() >= 3 && core.chars().all(char::is_alphabetic)
}

fn match_case(template: &str, replacement: &str) -> String {
    if template.chars().count() > 1 && template.chars().all(|c| !c.is_lowercase()) {
        return replacement.to_uppercase();
    }
    let mut chars = replacement.chars();
    match (template.chars().next(), chars.next()) {
        (Some(t), Some(r)) if t.is_uppercase() => r.to_uppercase().chain(chars).collect(),
        _ => replacement.to_owned(),
    }
}

fn neighbours(c: char) -> Vec<char> {
    let lower = c.to_lowercase().next().unwrap_or(c);
    for row in ROWS {
        let keys: Vec<char> = row.chars().collect();
        if let Some(i) = keys.iter().position(|k| *k == lower) {
            let mut out = Vec::with_capacity(2);
            if i > 0 {
                out.push(keys[i - 1]);
            }
            if i + 1 < keys.len() {
                out.push(keys[i + 1]);
            }
            return out;
        }
    }
    Vec::new()
}

fn with_case_of(original: char, replacement: char) -> char {
    if original.is_uppercase() {
        replacement.to_uppercase().next().unwrap_or(replacement)
    } else {
        replacement
    }
}

/// One character-level slip: swap two adjacent letters or hit a neighbouring key.
fn mutate_chars(core: &str, entropy: &mut dyn Entropy) -> String {
    let mut chars: Vec<char> = core.chars().collect();
    let pos = 1 + entropy.index(chars.len() - 1);
    if entropy.chance(0.5) && pos + 1 < chars.len() && chars[pos] != chars[pos + 1] {
        chars.swap(pos, pos + 1);
    } else {
        let options = neighbours(chars[pos]);
        if !options.is_empty() {
            let pick = options[entropy.index(options.len())];
            chars[pos] = with_case_of(chars[pos], pick);
        }
    }
    chars.into_iter().collect()
}

/// Maybe break one word. Protected tokens are never touched and the result
/// never exceeds `limit` characters.
pub fn maybe_typo(
    text: &str,
    mood: f64,
    limit: usize,
    known_emotes: &HashSet<String>,
    cfg: &LurkerCfg,
    entropy: &mut dyn Entropy,
) -> Option<Typo> {
    if !entropy.chance(typo_chance(mood, cfg)) {
        return None;
    }
    let (mut words, saved) = protect(text, known_emotes);
    let candidates: Vec<usize> = (0..words.len()).filter(|&i| mutable_word(&words[i])).collect();
    if candidates.is_empty() {
        return None;
    }
    let idx = candidates[entropy.index(candidates.len())];
    let (core, trailing) = split_trailing(&words[idx]);
    let (core, trailing) = (core.to_owned(), trailing.to_owned());

    let table_hit = WORD_TYPOS
        .iter()
        .find(|(k, _)| *k == core.to_lowercase())
        .map(|(_, v)| *v);
    let broken = match table_hit {
        Some(v) if entropy.chance(cfg.typo_word_swap_chance) => match_case(&core, v),
        _ => mutate_chars(&core, entropy),
    };
    if broken == core {
        return None;
    }

    words[idx] = format!("{broken}{trailing}");
    let out = restore(&words, &saved);
    if out.chars().count() > limit {
        return None;
    }
    Some(Typo { text: out, original_word: core })
}

/// Maybe schedule a `*word` follow-up for a typo.
pub fn maybe_correction(typo: &Typo, cfg: &LurkerCfg, entropy: &mut dyn Entropy) -> Option<Correction> {
    if !entropy.chance(cfg.correction_chance) {
        return None;
    }
    let lo = cfg.correction_min_delay_ms as i64;
    let hi = cfg.correction_max_delay_ms as i64;
    let delay = entropy.between(lo, hi).max(0) as u64;
    Some(Correction {
        text: format!("*{}", typo.original_word.to_lowercase()),
        delay: Duration::from_millis(delay),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;

    #[test]
    fn chance_scales_with_mood() {
        let cfg = LurkerCfg::default();
        assert!((typo_chance(50.0, &cfg) - 0.08).abs() < 1e-9);
        assert!(typo_chance(100.0, &cfg) > typo_chance(0.0, &cfg));
    }

    #[test]
    fn no_roll_no_typo() {
        let cfg = LurkerCfg::default();
        let mut e = ScriptedEntropy::constant(0.99);
        assert!(maybe_typo("what a game", 50.0, 160, &HashSet::new(), &cfg, &mut e).is_none());
    }

    #[test]
    fn table_swap_keeps_case_and_punctuation() {
        let cfg = LurkerCfg::default();
        // roll, pick candidate 0, take table
        let mut e = ScriptedEntropy::new(vec![0.0, 0.0, 0.0]);
        let typo = maybe_typo("Really, nice play", 50.0, 160, &HashSet::new(), &cfg, &mut e).unwrap();
        assert_eq!(typo.text, "Realy, nice play");
        assert_eq!(typo.original_word, "Really");
    }

    #[test]
    fn protected_tokens_survive() {
        let cfg = LurkerCfg::default();
        let known: HashSet<String> = ["PogChamp".to_owned()].into();
        for seed in [0.0, 0.3, 0.6, 0.9] {
            let mut e = ScriptedEntropy::new(vec![0.0, seed, 0.9, 0.4, 0.2]);
            let text = "@someone https://example.com PogChamp amazing";
            if let Some(typo) = maybe_typo(text, 50.0, 160, &known, &cfg, &mut e) {
                assert!(typo.text.starts_with("@someone https://example.com PogChamp "));
                assert_eq!(typo.original_word, "amazing");
                assert_ne!(typo.text, text);
            }
        }
    }

    #[test]
    fn only_protected_tokens_means_no_typo() {
        let cfg = LurkerCfg::default();
        let known: HashSet<String> = ["KEKW".to_owned()].into();
        let mut e = ScriptedEntropy::constant(0.0);
        assert!(maybe_typo("@bob KEKW", 50.0, 160, &known, &cfg, &mut e).is_none());
    }

    #[test]
    fn char_slip_changes_one_word_only() {
        let cfg = LurkerCfg::default();
        // roll, candidate 1 of 2, position, transpose
        let mut e = ScriptedEntropy::new(vec![0.0, 0.9, 0.0, 0.0]);
        let typo = maybe_typo("great stream", 50.0, 160, &HashSet::new(), &cfg, &mut e).unwrap();
        assert_eq!(typo.text, "great srteam");
        assert_eq!(typo.original_word, "stream");
    }

    #[test]
    fn correction_uses_star_and_delay_window() {
        let cfg = LurkerCfg::default();
        let typo = Typo { text: "teh end".into(), original_word: "The".into() };
        let mut e = ScriptedEntropy::new(vec![0.0, 1.0]);
        let c = maybe_correction(&typo, &cfg, &mut e).unwrap();
        assert_eq!(c.text, "*the");
        assert_eq!(c.delay, Duration::from_millis(cfg.correction_max_delay_ms));
        let mut never = ScriptedEntropy::constant(0.9);
        assert!(maybe_correction(&typo, &cfg, &mut never).is_none());
    }
}
