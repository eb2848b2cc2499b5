mod channel;
mod ring;
mod store;

pub use channel::ChannelState;
pub use ring::RingBuffer;
pub use store::{ChannelHandle, StateStore};
