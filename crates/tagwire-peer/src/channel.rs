use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use bytes::{BufMut, Bytes, BytesMut};
use tagwire_codec::utils::{bytes_to_int, bytes_to_string, int_to_bytes, len_to_bytes, INT_SIZE};
use tagwire_codec::{SerializableFactory, Value};
use tagwire_transport::Socket;
use tracing::trace;

use crate::config::ChannelConfig;
use crate::error::{PeerError, Result};

/// A connected socket that exchanges whole values.
///
/// Each message is `MessageLen (4B BE) ++ Envelope`. The string and bytes
/// helpers send a bare length-prefixed segment without a tag. The integer
/// helpers send exactly 4 raw bytes with no prefix. These carry header fields
/// whose type the two ends agree on in advance.
pub struct ValueChannel<S> {
    id: String,
    socket: Socket<S>,
    config: ChannelConfig,
    factory: Option<Arc<SerializableFactory>>,
}

impl<S: Read + Write> ValueChannel<S> {
    /// Wrap a connected socket. Values are encoded with the global registry.
    pub fn new(id: impl Into<String>, socket: Socket<S>, config: ChannelConfig) -> Self {
        Self {
            id: id.into(),
            socket,
            config,
            factory: None,
        }
    }

    /// Use `factory` instead of the global registry.
    pub fn with_factory(mut self, factory: Arc<SerializableFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// The registry used for envelopes on this channel.
    pub fn factory(&self) -> &SerializableFactory {
        match &self.factory {
            Some(factory) => factory.as_ref(),
            None => SerializableFactory::global(),
        }
    }

    /// Channel identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Serialize `value` and send it as one message.
    pub fn send_value(&mut self, value: &Value) -> Result<()> {
        let envelope = self.factory().serialize(value)?;
        self.send_message(&envelope)
    }

    /// Receive one message and decode its envelope.
    pub fn recv_value(&mut self) -> Result<Value> {
        let envelope = self.recv_message()?;
        Ok(self.factory().deserialize(&envelope)?)
    }

    /// Send a UTF-8 string as a length-prefixed segment.
    pub fn send_string(&mut self, text: &str) -> Result<()> {
        self.send_message(text.as_bytes())
    }

    pub fn recv_string(&mut self) -> Result<String> {
        let data = self.recv_message()?;
        Ok(bytes_to_string(&data)?)
    }

    /// Send a non-negative integer as 4 bytes.
    pub fn send_int(&mut self, value: i64) -> Result<()> {
        let raw = int_to_bytes(value)?;
        self.socket.check_sended(&raw)?;
        Ok(())
    }

    pub fn recv_int(&mut self) -> Result<u32> {
        let raw = self.socket.check_received_length(INT_SIZE)?;
        Ok(bytes_to_int(&raw)?)
    }

    /// Send raw bytes as a length-prefixed segment.
    pub fn send_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.send_message(data)
    }

    pub fn recv_bytes(&mut self) -> Result<Bytes> {
        self.recv_message()
    }

    /// Borrow the underlying socket.
    pub fn socket(&self) -> &Socket<S> {
        &self.socket
    }

    /// Mutably borrow the underlying socket.
    pub fn socket_mut(&mut self) -> &mut Socket<S> {
        &mut self.socket
    }

    pub fn into_socket(self) -> Socket<S> {
        self.socket
    }

    fn send_message(&mut self, body: &[u8]) -> Result<()> {
        self.check_size(body.len())?;
        let mut message = BytesMut::with_capacity(INT_SIZE + body.len());
        message.put_slice(&len_to_bytes(body.len())?);
        message.put_slice(body);
        self.socket.check_sended(&message)?;
        trace!(id = %self.id, size = body.len(), "sent message");
        Ok(())
    }

    fn recv_message(&mut self) -> Result<Bytes> {
        let header = self.socket.check_received_length(INT_SIZE)?;
        let size = bytes_to_int(&header)? as usize;
        self.check_size(size)?;
        let body = self.socket.check_received_length(size)?;
        trace!(id = %self.id, size, "received message");
        Ok(body)
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size > self.config.max_message_size {
            return Err(PeerError::MessageTooLarge {
                size,
                max: self.config.max_message_size,
            });
        }
        Ok(())
    }
}

impl ValueChannel<TcpStream> {
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.peer_addr()?)
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Shut the connection down in both directions.
    pub fn close(&self) -> Result<()> {
        Ok(self.socket.close()?)
    }
}

impl<S> std::fmt::Debug for ValueChannel<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueChannel")
            .field("id", &self.id)
            .field("max_message_size", &self.config.max_message_size)
            .finish_non_exhaustive()
    }
}
