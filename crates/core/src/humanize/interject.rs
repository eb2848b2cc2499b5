use crate::config::LurkerCfg;
use crate::entropy::Entropy;

fn bare(marker: &str) -> String {
    marker
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

fn starts_with_marker(text: &str, markers: &[String]) -> bool {
    let first = text
        .split_whitespace()
        .next()
        .map(bare)
        .unwrap_or_default();
    markers.iter().any(|m| !m.is_empty() && bare(m) == first)
}

/// Maybe prefix a discourse marker. Returns the new text and the marker used.
pub fn maybe_interject(
    text: &str,
    limit: usize,
    cfg: &LurkerCfg,
    entropy: &mut dyn Entropy,
) -> (String, Option<String>) {
    if cfg.interjections.is_empty()
        || text.chars().count() < cfg.interjection_min_len
        || starts_with_marker(text, &cfg.interjections)
        || !entropy.chance(cfg.interjection_chance)
    {
        return (text.to_owned(), None);
    }

    let marker = &cfg.interjections[entropy.index(cfg.interjections.len())];
    let out = format!("{marker} {}", soften_first_letter(text));
    if out.chars().count() > limit {
        return (text.to_owned(), None);
    }
    (out, Some(marker.clone()))
}

/// Lowercase the first letter unless the first word is shouting or an emote.
fn soften_first_letter(text: &str) -> String {
    let first_word = text.split_whitespace().next().unwrap_or_default();
    let rest_has_upper = first_word.chars().skip(1).any(char::is_uppercase);
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if !rest_has_upper => c.to_lowercase().chain(chars).collect(),
        _ => text.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::ScriptedEntropy;

    fn cfg() -> LurkerCfg {
        LurkerCfg {
            interjections: vec!["hmm".into(), "well,".into()],
            ..LurkerCfg::default()
        }
    }

    #[test]
    fn prefixes_when_chance_hits() {
        let mut e = ScriptedEntropy::new(vec![0.0, 0.9]);
        let (out, used) = maybe_interject("That sounds like a plan", 160, &cfg(), &mut e);
        assert_eq!(out, "well, that sounds like a plan");
        assert_eq!(used.as_deref(), Some("well,"));
    }

    #[test]
    fn skips_short_text() {
        let mut e = ScriptedEntropy::constant(0.0);
        let (out, used) = maybe_interject("yes", 160, &cfg(), &mut e);
        assert_eq!(out, "yes");
        assert!(used.is_none());
    }

    #[test]
    fn skips_existing_marker() {
        let mut e = ScriptedEntropy::constant(0.0);
        let (out, used) = maybe_interject("Well that escalated quickly", 160, &cfg(), &mut e);
        assert_eq!(out, "Well that escalated quickly");
        assert!(used.is_none());
    }

    #[test]
    fn respects_limit() {
        let mut e = ScriptedEntropy::constant(0.0);
        let text = "exactly twenty chars";
        let (out, used) = maybe_interject(text, 20, &cfg(), &mut e);
        assert_eq!(out, text);
        assert!(used.is_none());
    }

    #[test]
    fn keeps_shouted_first_word() {
        let mut e = ScriptedEntropy::constant(0.0);
        let (out, _) = maybe_interject("KEKW that was wild", 160, &cfg(), &mut e);
        assert_eq!(out, "hmm KEKW that was wild");
    }
}
