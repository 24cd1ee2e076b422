use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};

use tracing::{debug, info};

use crate::config::SocketConfig;
use crate::error::{Result, TransportError};
use crate::socket::Socket;

/// TCP listening endpoint.
///
/// Binding also puts the socket into the listening state with the operating
/// system's default backlog.
pub struct SocketListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    config: SocketConfig,
}

impl SocketListener {
    /// Bind and listen on `addr` (`host:port`). An empty host binds all
    /// interfaces; port `0` picks a free port.
    pub fn bind(addr: &str) -> Result<Self> {
        Self::bind_with_config(addr, SocketConfig::default())
    }

    /// Bind and listen, handing `config` to every accepted connection.
    pub fn bind_with_config(addr: &str, config: SocketConfig) -> Result<Self> {
        let resolved = normalize_host(addr);
        let listener = TcpListener::bind(&*resolved).map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;
        let local_addr = listener.local_addr().map_err(|e| TransportError::Bind {
            addr: addr.to_string(),
            source: e,
        })?;

        info!(%local_addr, "listening on tcp socket");

        Ok(Self {
            listener,
            local_addr,
            config,
        })
    }

    /// Accept an incoming connection (blocking).
    pub fn accept(&self) -> Result<(Socket<TcpStream>, SocketAddr)> {
        let (stream, peer) = self.listener.accept().map_err(TransportError::Accept)?;
        debug!(%peer, "accepted connection");
        let socket = Socket::with_config_tcp(stream, self.config.clone())?;
        Ok((socket, peer))
    }

    /// The address this listener is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Transport name for diagnostics.
    pub fn transport_name(&self) -> &'static str {
        "tcp"
    }
}

impl Socket<TcpStream> {
    /// Connect to a listening TCP endpoint (blocking).
    pub fn connect(addr: &str) -> Result<Self> {
        Self::connect_with_config(addr, SocketConfig::default())
    }

    /// Connect with explicit configuration.
    pub fn connect_with_config(addr: &str, config: SocketConfig) -> Result<Self> {
        let resolved = normalize_host(addr);
        let stream = TcpStream::connect(&*resolved).map_err(|e| TransportError::Connect {
            addr: addr.to_string(),
            source: e,
        })?;
        debug!(addr, "connected to tcp socket");
        Self::with_config_tcp(stream, config)
    }

    /// Wrap a TCP stream and apply the timeouts from `config`.
    pub fn with_config_tcp(stream: TcpStream, config: SocketConfig) -> Result<Self> {
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        Ok(Self::with_config(stream, config))
    }

    /// Local address of the connection.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.get_ref().local_addr()?)
    }

    /// Remote address of the connection.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.get_ref().peer_addr()?)
    }

    /// Try to clone this connection (creates a new file descriptor).
    pub fn try_clone(&self) -> Result<Self> {
        let cloned = self.get_ref().try_clone()?;
        Ok(Self::with_config(cloned, self.config().clone()))
    }

    /// Shut down both directions. Blocking calls on clones of this
    /// connection fail once it is closed.
    pub fn close(&self) -> Result<()> {
        match self.get_ref().shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// `":5544"` means every interface, as with BSD sockets bound to `''`.
fn normalize_host(addr: &str) -> std::borrow::Cow<'_, str> {
    if addr.starts_with(':') {
        std::borrow::Cow::Owned(format!("0.0.0.0{addr}"))
    } else {
        std::borrow::Cow::Borrowed(addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_accept_connect() {
        let listener = SocketListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let handle = std::thread::spawn(move || {
            let mut client = Socket::connect(&addr).unwrap();
            client.check_sended(b"hello").unwrap();
        });

        let (mut server, peer) = listener.accept().unwrap();
        assert_eq!(server.check_received_length(5).unwrap().as_ref(), b"hello");
        assert_eq!(server.peer_addr().unwrap(), peer);

        handle.join().unwrap();
    }

    #[test]
    fn test_bind_empty_host_uses_all_interfaces() {
        let listener = SocketListener::bind(":0").unwrap();
        assert!(listener.local_addr().ip().is_unspecified());
        assert_ne!(listener.local_addr().port(), 0);
        assert_eq!(listener.transport_name(), "tcp");
    }

    #[test]
    fn test_bind_address_in_use() {
        let first = SocketListener::bind("127.0.0.1:0").unwrap();
        let result = SocketListener::bind(&first.local_addr().to_string());
        assert!(matches!(result, Err(TransportError::Bind { .. })));
    }

    #[test]
    fn test_connect_refused() {
        let addr = {
            let listener = SocketListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().to_string()
        };
        let result = Socket::connect(&addr);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn test_large_transfer_over_loopback() {
        let listener = SocketListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();
        let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
        let expected = payload.clone();

        let handle = std::thread::spawn(move || {
            let mut client = Socket::connect(&addr).unwrap();
            client.check_sended(&payload).unwrap();
        });

        let (mut server, _) = listener.accept().unwrap();
        let data = server.check_received_length(expected.len()).unwrap();
        assert_eq!(data.as_ref(), expected.as_slice());

        handle.join().unwrap();
    }

    #[test]
    fn test_close_from_other_thread_unblocks_reader() {
        let listener = SocketListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().to_string();

        let client = std::thread::spawn(move || Socket::connect(&addr).unwrap());
        let (server, _) = listener.accept().unwrap();
        let _client = client.join().unwrap();

        let mut reader = server.try_clone().unwrap();
        let handle = std::thread::spawn(move || reader.check_received_length(4));

        std::thread::sleep(std::time::Duration::from_millis(50));
        server.close().unwrap();

        let result = handle.join().unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_read_timeout_applies() {
        let config = SocketConfig {
            read_timeout: Some(std::time::Duration::from_millis(50)),
            ..SocketConfig::default()
        };
        let listener = SocketListener::bind_with_config("127.0.0.1:0", config).unwrap();
        let addr = listener.local_addr().to_string();

        let client = std::thread::spawn(move || Socket::connect(&addr).unwrap());
        let (mut server, _) = listener.accept().unwrap();
        let _client = client.join().unwrap();

        let err = server.check_received_length(1).unwrap_err();
        assert!(matches!(
            err,
            TransportError::Io(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut
        ));
    }
}
