//! Short self-descriptions pulled out of chat lines ("likes tea", "is from Oslo").

use std::sync::LazyLock;

use regex::Regex;

/// Longest fact body kept, in characters.
const MAX_FACT_CHARS: usize = 60;

static PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"(?i)\bmy name is\s+([^.,!?]+)", "is called"),
        (r"(?i)\bi(?:'m| am) from\s+([^.,!?]+)", "is from"),
        (r"(?i)\bi (?:really )?(?:like|love)\s+([^.,!?]+)", "likes"),
        (r"(?i)\bi (?:really )?hate\s+([^.,!?]+)", "hates"),
        (r"(?i)меня зовут\s+([^.,!?]+)", "is called"),
        (r"(?i)\bя из\s+([^.,!?]+)", "is from"),
        (r"(?i)\bя (?:очень )?(?:люблю|обожаю)\s+([^.,!?]+)", "likes"),
        (r"(?i)\bя ненавижу\s+([^.,!?]+)", "hates"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).expect("fact pattern"), label))
    .collect()
});

/// Facts stated in `text`, in pattern order. Empty for most lines.
pub fn extract(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for (re, label) in PATTERNS.iter() {
        let Some(caps) = re.captures(text) else {
            continue;
        };
        let Some(body) = caps.get(1) else {
            continue;
        };
        let body: String = body.as_str().trim().chars().take(MAX_FACT_CHARS).collect();
        let body = body.trim_end();
        if body.is_empty() {
            continue;
        }
        let fact = format!("{label} {body}");
        if !out.contains(&fact) {
            out.push(fact);
        }
    }
    out
}
