use std::collections::HashSet;

use crate::config::LurkerCfg;
use crate::emotes::DEFAULT_EMOTES;
use crate::entropy::Entropy;
use crate::state::RingBuffer;

/// Upper bound on cooldown-clearing rounds before falling back to defaults.
const MAX_CLEAR_ROUNDS: usize = 4;

fn pick(pool: &[String], entropy: &mut dyn Entropy) -> Option<String> {
    if pool.is_empty() {
        None
    } else {
        Some(pool[entropy.index(pool.len())].clone())
    }
}

fn available(pool: &[String], cooldown: &RingBuffer<String>) -> Vec<String> {
    pool.iter().filter(|e| !cooldown.contains(e)).cloned().collect()
}

/// Choose an emote not in cooldown.
///
/// Popular first, then any known emote, then the oldest half of the cooldown
/// buffer is released and both are tried again. Falls back to the built-in
/// set, so this always returns something. The cooldown buffer itself is only
/// cleared here; the pick is recorded when the line is actually sent.
pub fn choose(
    known: &HashSet<String>,
    popular: &[String],
    cooldown: &mut RingBuffer<String>,
    entropy: &mut dyn Entropy,
) -> String {
    let mut known_sorted: Vec<String> = known.iter().cloned().collect();
    known_sorted.sort();

    for _ in 0..MAX_CLEAR_ROUNDS {
        if let Some(e) = pick(&available(popular, cooldown), entropy) {
            return e;
        }
        if let Some(e) = pick(&available(&known_sorted, cooldown), entropy) {
            return e;
        }
        if cooldown.is_empty() || (popular.is_empty() && known_sorted.is_empty()) {
            break;
        }
        let release = (cooldown.len() / 2).max(1);
        let freed = cooldown.drain_oldest(release);
        tracing::trace!(freed = freed.len(), "emote cooldown partially cleared");
    }

    let defaults: Vec<String> = DEFAULT_EMOTES.iter().map(|e| (*e).to_owned()).collect();
    pick(&available(&defaults, cooldown), entropy)
        .or_else(|| pick(&defaults, entropy))
        .unwrap_or_else(|| "Kappa".to_owned())
}

/// Maybe append an emote. Skipped when the text already ends with a known
/// emote or when the emote would not fit within `limit`.
pub fn maybe_attach(
    text: &str,
    limit: usize,
    known: &HashSet<String>,
    popular: &[String],
    cooldown: &mut RingBuffer<String>,
    cfg: &LurkerCfg,
    entropy: &mut dyn Entropy,
) -> (String, Option<String>) {
    let ends_with_emote = text
        .split_whitespace()
        .last()
        .is_some_and(|w| known.contains(w) || DEFAULT_EMOTES.contains(&w));
    if ends_with_emote || !entropy.chance(cfg.emote_chance) {
        return (text.to_owned(), None);
    }

    let emote = choose(known, popular, cooldown, entropy);
    let out = format!("{text} {emote}");
    if out.chars().count() > limit {
        return (text.to_owned(), None);
    }
    (out, Some(emote))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::entropy::ScriptedEntropy;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    fn full_cooldown(emotes: &[String]) -> RingBuffer<String> {
        let mut ring = RingBuffer::new(8);
        for e in emotes {
            ring.push(e.clone());
        }
        ring
    }

    #[test]
    fn popular_preferred_over_known() {
        let known: HashSet<String> = names(&["Aaa1", "Bbb2", "Hot1"]).into_iter().collect();
        let popular = names(&["Hot1"]);
        let mut ring = RingBuffer::new(8);
        let mut e = ScriptedEntropy::constant(0.5);
        assert_eq!(choose(&known, &popular, &mut ring, &mut e), "Hot1");
    }

    #[test]
    fn full_cooldown_draws_from_remainder() {
        let cooled = names(&["E1", "E2", "E3", "E4", "E5", "E6", "E7", "E8"]);
        let mut known: HashSet<String> = cooled.iter().cloned().collect();
        known.insert("Fresh".to_owned());
        let mut ring = full_cooldown(&cooled);
        for v in [0.0, 0.5, 0.99] {
            let mut e = ScriptedEntropy::constant(v);
            assert_eq!(choose(&known, &cooled, &mut ring, &mut e), "Fresh");
        }
        assert_eq!(ring.len(), 8);
    }

    #[test]
    fn exhausted_pool_clears_oldest_half() {
        let cooled = names(&["E1", "E2", "E3", "E4", "E5", "E6", "E7", "E8"]);
        let known: HashSet<String> = cooled.iter().cloned().collect();
        let mut ring = full_cooldown(&cooled);
        let mut e = ScriptedEntropy::constant(0.0);
        let picked = choose(&known, &[], &mut ring, &mut e);
        assert_eq!(ring.len(), 4);
        assert!(["E1", "E2", "E3", "E4"].contains(&picked.as_str()));
        assert!(!ring.contains(&picked));
    }

    #[test]
    fn empty_catalog_falls_back_to_defaults() {
        let mut ring = RingBuffer::new(8);
        let mut e = ScriptedEntropy::constant(0.0);
        let picked = choose(&HashSet::new(), &[], &mut ring, &mut e);
        assert!(DEFAULT_EMOTES.contains(&picked.as_str()));
    }

    #[test]
    fn attach_skips_when_already_ending_with_emote() {
        let cfg = LurkerCfg::default();
        let known: HashSet<String> = names(&["KEKW"]).into_iter().collect();
        let mut ring = RingBuffer::new(8);
        let mut e = ScriptedEntropy::constant(0.0);
        let (out, used) = maybe_attach("so good KEKW", 160, &known, &[], &mut ring, &cfg, &mut e);
        assert_eq!(out, "so good KEKW");
        assert!(used.is_none());
    }

    #[test]
    fn attach_respects_limit() {
        let cfg = LurkerCfg::default();
        let known: HashSet<String> = names(&["PogChamp"]).into_iter().collect();
        let mut ring = RingBuffer::new(8);
        let mut e = ScriptedEntropy::constant(0.0);
        let (out, used) = maybe_attach("twelve chars", 15, &known, &[], &mut ring, &cfg, &mut e);
        assert_eq!(out, "twelve chars");
        assert!(used.is_none());
        let (out, used) = maybe_attach("twelve chars", 40, &known, &[], &mut ring, &cfg, &mut e);
        assert_eq!(out, "twelve chars PogChamp");
        assert_eq!(used.as_deref(), Some("PogChamp"));
    }
}
