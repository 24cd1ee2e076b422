use std::net::TcpStream;

use tagwire_transport::Socket;
use tracing::debug;

use crate::channel::ValueChannel;
use crate::config::ChannelConfig;
use crate::error::Result;

/// Connect to a listening peer as a client.
pub fn connect(addr: &str) -> Result<ValueChannel<TcpStream>> {
    connect_with_config(addr, ChannelConfig::default())
}

/// Connect with explicit configuration.
pub fn connect_with_config(addr: &str, config: ChannelConfig) -> Result<ValueChannel<TcpStream>> {
    let socket = Socket::connect_with_config(addr, config.socket.clone())?;
    let id = socket.local_addr()?.to_string();
    debug!(addr, %id, "value channel connected");
    Ok(ValueChannel::new(id, socket, config))
}
