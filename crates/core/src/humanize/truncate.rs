use crate::types::Rejection;

const SENTENCE_END: &[char] = &['.', '!', '?', '…'];
const DANGLING: &[char] = &[',', ';', ':', '-', '–'];

/// Bring `text` within `limit` characters without cutting a word.
///
/// Prefers the last sentence end when it falls past half the limit, otherwise
/// the last whitespace. A single word longer than the limit is rejected.
pub fn truncate(text: &str, limit: usize) -> Result<String, Rejection> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= limit {
        return Ok(text.to_owned());
    }

    // punctuation inside a token (12.5, www.example.com) is not a sentence end
    let sentence_end = (0..limit).rev().find(|&i| {
        SENTENCE_END.contains(&chars[i]) && chars.get(i + 1).is_none_or(|c| c.is_whitespace())
    });
    if let Some(i) = sentence_end {
        if i > limit / 2 {
            return Ok(chars[..=i].iter().collect());
        }
    }

    // a space exactly at `limit` means the prefix ends on a word boundary
    let cut = chars[..=limit]
        .iter()
        .rposition(|c| c.is_whitespace())
        .filter(|&p| p > 0)
        .ok_or(Rejection::Unbreakable)?;

    let out: String = chars[..cut].iter().collect();
    let out = out.trim_end().trim_end_matches(DANGLING).trim_end();
    if out.is_empty() {
        return Err(Rejection::Unbreakable);
    }
    Ok(out.to_owned())
}
