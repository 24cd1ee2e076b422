use std::time::Duration;

/// Largest number of bytes requested from the transport by a single `recv`.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Configuration for a wrapped socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketConfig {
    /// Per-call receive cap in bytes. Default: 1024. Zero is treated as one.
    pub chunk_size: usize,
    /// Read timeout for blocking operations. Only applied to TCP streams.
    pub read_timeout: Option<Duration>,
    /// Write timeout for blocking operations. Only applied to TCP streams.
    pub write_timeout: Option<Duration>,
}

impl SocketConfig {
    pub(crate) fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_timeout: None,
            write_timeout: None,
        }
    }
}
