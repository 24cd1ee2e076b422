/// Errors that can occur on a value channel.
#[derive(Debug, thiserror::Error)]
pub enum PeerError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] tagwire_transport::TransportError),

    /// Encoding or decoding error.
    #[error("codec error: {0}")]
    Codec(#[from] tagwire_codec::CodecError),

    /// A message exceeds the configured maximum size.
    #[error("message size {size} exceeds maximum {max}")]
    MessageTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, PeerError>;
