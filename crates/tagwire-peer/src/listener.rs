use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tagwire_codec::SerializableFactory;
use tagwire_transport::SocketListener;
use tracing::debug;

use crate::channel::ValueChannel;
use crate::config::ChannelConfig;
use crate::error::Result;

/// Listens for and accepts value channels.
pub struct ValueListener {
    listener: SocketListener,
    config: ChannelConfig,
    factory: Option<Arc<SerializableFactory>>,
    next_peer_id: AtomicU64,
}

impl ValueListener {
    /// Bind and listen on `addr` (`host:port`, or `:port` for every interface).
    pub fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, ChannelConfig::default())
    }

    /// Bind with explicit configuration for accepted channels.
    pub fn bind_with_config(addr: &str, config: ChannelConfig) -> Result<Self> {
        let listener = SocketListener::bind_with_config(addr, config.socket.clone())?;
        Ok(Self {
            listener,
            config,
            factory: None,
            next_peer_id: AtomicU64::new(1),
        })
    }

    /// Hand `factory` to every accepted channel.
    pub fn with_factory(mut self, factory: Arc<SerializableFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Accept the next connection and assign an auto-generated id.
    pub fn accept(&self) -> Result<(ValueChannel<TcpStream>, SocketAddr)> {
        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        let (socket, peer) = self.listener.accept()?;
        let id = format!("peer-{id}");
        debug!(%id, %peer, "value channel accepted");

        let mut channel = ValueChannel::new(id, socket, self.config.clone());
        if let Some(factory) = &self.factory {
            channel = channel.with_factory(Arc::clone(factory));
        }
        Ok((channel, peer))
    }

    /// The bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.listener.local_addr()
    }
}
