use tagwire_transport::SocketConfig;

/// Default maximum message size: 16 MiB.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Configuration for a value channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Largest message accepted in either direction. Announced lengths above
    /// this are rejected before any buffer is allocated.
    pub max_message_size: usize,
    /// Settings for the underlying socket.
    pub socket: SocketConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            socket: SocketConfig::default(),
        }
    }
}
