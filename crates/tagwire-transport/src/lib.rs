//! Reliable socket primitives for stream transports.
//!
//! A single `send` or `recv` on a stream socket may move fewer bytes than
//! requested. This crate wraps one connected endpoint and provides two
//! primitives that hide that:
//! - [`Socket::check_sended`] loops until every byte has been written
//! - [`Socket::check_received_length`] loops until exactly `n` bytes arrived
//!
//! This is the lowest layer of tagwire. It knows nothing about tags or
//! values; framing lives in `tagwire-codec` above it.

pub mod config;
pub mod error;
pub mod socket;
pub mod tcp;

pub use config::{SocketConfig, DEFAULT_CHUNK_SIZE};
pub use error::{Result, TransportError};
pub use socket::Socket;
pub use tcp::SocketListener;
