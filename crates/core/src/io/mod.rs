//! Chat transport: inbound line type, the outbound trait and its console and
//! recording implementations, and the length-limit chunker.

pub mod chunker;
mod console;
mod transport;

pub use console::{CONSOLE_AUTHOR, ConsoleTransport, parse_line};
pub use transport::{InboundLine, OutboundLine, RecordingTransport, Transport, TransportError};
