use std::time::Duration;

use super::transport::{Transport, TransportError};

/// Split `text` into pieces of at most `max` characters, breaking on whitespace.
/// A single word longer than `max` is cut by characters.
pub fn split(text: &str, max: usize) -> Vec<String> {
    let max = max.max(1);
    if text.chars().count() <= max {
        return vec![text.to_owned()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };
        if needed <= max {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            current_len = needed;
            continue;
        }
        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if word_len <= max {
            current.push_str(word);
            current_len = word_len;
        } else {
            let chars: Vec<char> = word.chars().collect();
            let mut pieces = chars.chunks(max).map(|c| c.iter().collect::<String>()).peekable();
            while let Some(piece) = pieces.next() {
                if pieces.peek().is_some() {
                    chunks.push(piece);
                } else {
                    current_len = piece.chars().count();
                    current = piece;
                }
            }
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Send `text`, split to the transport limit, pausing `delay` between pieces.
pub async fn deliver(
    transport: &dyn Transport,
    channel: &str,
    text: &str,
    max: usize,
    delay: Duration,
) -> Result<(), TransportError> {
    let chunks = split(text, max);
    let last = chunks.len().saturating_sub(1);
    for (i, chunk) in chunks.iter().enumerate() {
        transport.send(channel, chunk).await?;
        if i < last {
            tokio::time::sleep(delay).await;
        }
    }
    Ok(())
}
