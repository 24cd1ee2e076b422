//! Value channels on top of tagwire sockets.
//!
//! A [`ValueChannel`] frames each serialized value with a 4-byte length so
//! the receiver knows how much to read before decoding. This is the
//! "just works" layer: connect, send a [`Value`](tagwire_codec::Value),
//! receive one back.

pub mod channel;
pub mod config;
pub mod connector;
pub mod error;
pub mod listener;

pub use channel::ValueChannel;
pub use config::{ChannelConfig, DEFAULT_MAX_MESSAGE_SIZE};
pub use connector::{connect, connect_with_config};
pub use error::{PeerError, Result};
pub use listener::ValueListener;
