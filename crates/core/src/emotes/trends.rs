use std::collections::{HashMap, HashSet};

/// Filler words never reported as trending.
const STOP_WORDS: &[&str] = &[
    "the", "and", "you", "that", "this", "for", "are", "with", "just", "what", "was", "but",
    "not", "have", "lol", "что", "это", "как", "так", "все", "там", "тут", "уже", "еще", "ещё",
    "[link]",
];

/// Most used known emotes and words in a batch of messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trends {
    pub emotes: Vec<String>,
    pub words: Vec<String>,
}

fn top_n(counts: HashMap<String, usize>, n: usize) -> Vec<String> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    // ties broken alphabetically so results are stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(n).map(|(w, _)| w).collect()
}

/// Count emote and word use over `contents`.
pub fn compute<'a>(
    contents: impl IntoIterator<Item = &'a str>,
    known_emotes: &HashSet<String>,
    forbidden: &[String],
    n: usize,
) -> Trends {
    let mut emotes: HashMap<String, usize> = HashMap::new();
    let mut words: HashMap<String, usize> = HashMap::new();

    for content in contents {
        for token in content.split_whitespace() {
            if known_emotes.contains(token) {
                *emotes.entry(token.to_owned()).or_default() += 1;
                continue;
            }
            let word: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.chars().count() > 2
                && !STOP_WORDS.contains(&word.as_str())
                && !forbidden.iter().any(|f| f.eq_ignore_ascii_case(&word))
            {
                *words.entry(word).or_default() += 1;
            }
        }
    }

    Trends { emotes: top_n(emotes, n), words: top_n(words, n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranks_known_emotes_by_count() {
        let known: HashSet<String> = ["KEKW", "Pog", "Sadge"].iter().map(|s| (*s).to_owned()).collect();
        let lines = ["KEKW KEKW", "Pog what", "KEKW nice Pog", "Sadge"];
        let t = compute(lines, &known, &[], 2);
        assert_eq!(t.emotes, vec!["KEKW", "Pog"]);
    }

    #[test]
    fn words_skip_stop_words_and_forbidden() {
        let lines = ["the raid was huge", "huge raid incoming", "badword badword badword"];
        let t = compute(lines, &HashSet::new(), &["badword".to_owned()], 3);
        assert_eq!(t.words, vec!["huge", "raid", "incoming"]);
    }

    #[test]
    fn empty_input_gives_empty_trends() {
        let t = compute(std::iter::empty(), &HashSet::new(), &[], 8);
        assert_eq!(t, Trends::default());
    }
}
