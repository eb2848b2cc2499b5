use std::collections::HashSet;

fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// `|A∩B| / max(|A|, |B|)` over lowercase whitespace-separated words.
pub fn overlap(a: &str, b: &str) -> f64 {
    let (a, b) = (word_set(a), word_set(b));
    let denom = a.len().max(b.len());
    if denom == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / denom as f64
}

pub fn is_repetitive<'a>(
    candidate: &str,
    recent: impl IntoIterator<Item = &'a String>,
    threshold: f64,
) -> bool {
    recent.into_iter().any(|prev| overlap(candidate, prev) > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_strings_overlap_fully() {
        assert_eq!(overlap("hello there chat", "hello there chat"), 1.0);
        let recent = vec!["hello there chat".to_owned()];
        assert!(is_repetitive("Hello there chat", &recent, 0.6));
    }

    #[test]
    fn partial_overlap() {
        // 2 shared of max(4, 3)
        assert_eq!(overlap("a b c d", "a b x"), 0.5);
        let recent = vec!["a b x".to_owned()];
        assert!(!is_repetitive("a b c d", &recent, 0.6));
    }

    #[test]
    fn empty_never_repeats() {
        assert_eq!(overlap("", "anything"), 0.0);
        assert!(!is_repetitive("fresh words", std::iter::empty(), 0.6));
    }
}
