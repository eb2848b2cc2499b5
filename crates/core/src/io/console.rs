use tokio::sync::mpsc;

use super::transport::{InboundLine, OutboundLine, Transport, TransportError};

/// Author used for console lines that don't name one.
pub const CONSOLE_AUTHOR: &str = "viewer";

/// Transport that hands outbound lines to the REPL for printing.
#[derive(Debug, Clone)]
pub struct ConsoleTransport {
    tx: mpsc::Sender<OutboundLine>,
}

impl ConsoleTransport {
    pub fn new(buffer: usize) -> (Self, mpsc::Receiver<OutboundLine>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx }, rx)
    }
}

#[async_trait::async_trait]
impl Transport for ConsoleTransport {
    async fn send(&self, channel: &str, text: &str) -> Result<(), TransportError> {
        self.tx
            .send(OutboundLine { channel: channel.to_owned(), text: text.to_owned() })
            .await
            .map_err(|_| TransportError::Closed)
    }
}

/// Parse a console line: `[#channel] [author:] text`.
///
/// Returns `None` for blank input.
pub fn parse_line(line: &str, default_channel: &str) -> Option<InboundLine> {
    let mut rest = line.trim();
    if rest.is_empty() {
        return None;
    }

    let mut channel = default_channel.to_owned();
    if rest.starts_with('#') {
        let (ch, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        channel = ch.to_owned();
        rest = tail.trim_start();
    }

    let (author, text) = match rest.split_once(':') {
        Some((author, text))
            if !author.is_empty() && !author.contains(char::is_whitespace) =>
        {
            (author, text.trim())
        }
        _ => (CONSOLE_AUTHOR, rest),
    };
    if text.is_empty() {
        return None;
    }
    Some(InboundLine::new(channel, author, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_form() {
        let line = parse_line("#games ann: hi @lurker", "#main").unwrap();
        assert_eq!(line.channel, "#games");
        assert_eq!(line.author, "ann");
        assert_eq!(line.text, "hi @lurker");
    }

    #[test]
    fn defaults_fill_in() {
        let line = parse_line("just chatting", "#main").unwrap();
        assert_eq!(line.channel, "#main");
        assert_eq!(line.author, CONSOLE_AUTHOR);
        assert_eq!(line.text, "just chatting");
    }

    #[test]
    fn colon_inside_sentence_is_not_an_author() {
        let line = parse_line("note this: it works", "#main").unwrap();
        assert_eq!(line.author, CONSOLE_AUTHOR);
        assert_eq!(line.text, "note this: it works");
    }

    #[test]
    fn blank_lines_are_skipped() {
        assert!(parse_line("   ", "#main").is_none());
        assert!(parse_line("#main", "#main").is_none());
        assert!(parse_line("ann:", "#main").is_none());
    }

    #[tokio::test]
    async fn sends_reach_the_receiver() {
        let (t, mut rx) = ConsoleTransport::new(4);
        t.send("#c", "hello").await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), OutboundLine { channel: "#c".into(), text: "hello".into() });
    }

    #[tokio::test]
    async fn dropped_receiver_reports_closed() {
        let (t, rx) = ConsoleTransport::new(1);
        drop(rx);
        assert!(matches!(t.send("#c", "x").await, Err(TransportError::Closed)));
    }
}
