//! Tagged binary values over reliable stream sockets.
//!
//! tagwire encodes strings, integers, floats, complex numbers, booleans,
//! N-dimensional arrays and nested heterogeneous lists as self-describing
//! envelopes, and moves them across TCP with full-send / exact-length-receive
//! guarantees.
//!
//! # Crate Structure
//!
//! - [`transport`]: reliable send/receive primitives over stream sockets
//! - [`codec`]: the tagged envelope format and its type registry
//! - [`peer`]: length-prefixed value channels (behind `peer` feature)

/// Re-export transport types.
pub mod transport {
    pub use tagwire_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use tagwire_codec::*;
}

/// Re-export peer types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use tagwire_peer::*;
}

pub use tagwire_codec::{SerializableFactory, Value};
