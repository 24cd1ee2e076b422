use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::config::SocketConfig;
use crate::error::{Result, TransportError};

/// One connected stream endpoint with full-send and exact-length-receive
/// semantics.
///
/// The wrapper holds no application data between calls: every byte read is
/// handed back to the caller, every byte written is confirmed before
/// [`check_sended`](Socket::check_sended) returns.
pub struct Socket<T> {
    inner: T,
    config: SocketConfig,
}

impl<T: Read + Write> Socket<T> {
    /// Wrap a connected stream with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, SocketConfig::default())
    }

    /// Wrap a connected stream with explicit configuration.
    pub fn with_config(inner: T, config: SocketConfig) -> Self {
        Self { inner, config }
    }

    /// Write `data` with a single send call and return how many bytes the
    /// transport accepted.
    pub fn send(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.inner.write(data)?)
    }

    /// Issue a single receive call for at most `max_len` bytes, capped at the
    /// configured chunk size.
    ///
    /// An empty result means the peer closed the connection.
    pub fn recv(&mut self, max_len: usize) -> Result<Bytes> {
        let mut buf = BytesMut::zeroed(max_len.min(self.config.effective_chunk_size()));
        let read = self.inner.read(&mut buf)?;
        buf.truncate(read);
        Ok(buf.freeze())
    }

    /// Transmit all of `data`, looping over partial sends.
    pub fn check_sended(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => {
                    return Err(TransportError::ConnectionClosed {
                        expected: data.len(),
                        transferred: offset,
                    })
                }
                Ok(n) => {
                    offset += n;
                    trace!(sent = n, total = offset, expected = data.len(), "partial send");
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }

        self.flush()
    }

    /// Receive exactly `length` bytes, looping over reads of at most one
    /// chunk each.
    ///
    /// Returns `Err(TransportError::ConnectionClosed)` if the peer closes the
    /// stream before `length` bytes arrived.
    pub fn check_received_length(&mut self, length: usize) -> Result<Bytes> {
        let chunk_size = self.config.effective_chunk_size();
        let mut buf = BytesMut::zeroed(length);
        let mut received = 0usize;

        while received < length {
            let end = received + chunk_size.min(length - received);
            let read = match self.inner.read(&mut buf[received..end]) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            };

            if read == 0 {
                return Err(TransportError::ConnectionClosed {
                    expected: length,
                    transferred: received,
                });
            }

            received += read;
            trace!(read, total = received, expected = length, "partial receive");
        }

        Ok(buf.freeze())
    }

    fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(TransportError::Io(err)),
            }
        }
    }
}

impl<T> Socket<T> {
    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the socket and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current socket configuration.
    pub fn config(&self) -> &SocketConfig {
        &self.config
    }

    /// Update the per-call receive cap for subsequent reads.
    pub fn set_chunk_size(&mut self, chunk_size: usize) {
        self.config.chunk_size = chunk_size;
    }
}

impl<T> std::fmt::Debug for Socket<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Socket")
            .field("chunk_size", &self.config.chunk_size)
            .finish_non_exhaustive()
    }
}
