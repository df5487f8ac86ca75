// ============================================
// File: crates/tether-transport/src/tcp.rs
// ============================================
//! # TCP Transport Implementation
//!
//! ## Creation Reason
//! Production byte-stream transport for the secure channel, wrapping
//! Tokio's TCP stream with our `Transport` trait.
//!
//! ## Main Functionality
//! - `TcpTransport`: one established connection
//! - `TcpAcceptor`: listening socket producing `TcpTransport`s
//! - Listener built with socket2 (SO_REUSEADDR, explicit backlog)
//!
//! ## ⚠️ Important Note for Next Developer
//! - `send`/`recv` map to single `write`/`read` calls, which Tokio
//!   documents as cancel safe; keep it that way
//!
//! ## Last Modified
//! v0.1.0 - Initial TCP transport implementation

use std::net::SocketAddr;

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, trace};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Listen backlog for `TcpAcceptor`.
const LISTEN_BACKLOG: i32 = 128;

fn parse_addr(addr: &str) -> Result<SocketAddr> {
    addr.parse().map_err(|_| TransportError::InvalidAddress {
        addr: addr.to_string(),
    })
}

// ============================================
// TcpTransport
// ============================================

/// TCP connection implementing [`Transport`].
///
/// # Example
/// ```ignore
/// use tether_transport::{TcpTransport, Transport};
///
/// let mut transport = TcpTransport::connect("127.0.0.1:7000", true).await?;
/// transport.send_all(b"hello").await?;
/// ```
pub struct TcpTransport {
    stream: TcpStream,
    peer_addr: Option<SocketAddr>,
}

impl TcpTransport {
    /// Connects to `addr` (e.g. `"127.0.0.1:7000"`).
    ///
    /// # Errors
    /// `InvalidAddress` or `ConnectFailed`.
    pub async fn connect(addr: impl AsRef<str>, nodelay: bool) -> Result<Self> {
        Self::connect_addr(parse_addr(addr.as_ref())?, nodelay).await
    }

    /// Connects to a socket address.
    ///
    /// # Errors
    /// `ConnectFailed` if the connection cannot be established.
    pub async fn connect_addr(addr: SocketAddr, nodelay: bool) -> Result<Self> {
        debug!("Connecting TCP transport to {}", addr);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::connect_failed(addr, e.to_string()))?;
        Self::from_stream(stream, nodelay)
    }

    /// Wraps an already connected stream.
    ///
    /// # Errors
    /// Returns error if socket options cannot be applied.
    pub fn from_stream(stream: TcpStream, nodelay: bool) -> Result<Self> {
        stream
            .set_nodelay(nodelay)
            .map_err(|e| TransportError::io("setting TCP_NODELAY", e))?;
        let peer_addr = stream.peer_addr().ok();
        Ok(Self { stream, peer_addr })
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self
            .stream
            .write(buf)
            .await
            .map_err(|e| TransportError::from_send(&e))?;
        trace!("Sent {} bytes", n);
        Ok(n)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self
            .stream
            .read(buf)
            .await
            .map_err(|e| TransportError::from_recv(&e))?;
        trace!("Received {} bytes", n);
        Ok(n)
    }

    async fn flush(&mut self) -> Result<()> {
        self.stream
            .flush()
            .await
            .map_err(|e| TransportError::from_send(&e))
    }

    async fn shutdown(&mut self) -> Result<()> {
        debug!("Shutting down TCP transport");
        match self.stream.shutdown().await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(TransportError::io("shutting down TCP stream", e)),
        }
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("peer_addr", &self.peer_addr)
            .finish_non_exhaustive()
    }
}

// ============================================
// TcpAcceptor
// ============================================

/// Listening TCP socket.
pub struct TcpAcceptor {
    listener: TcpListener,
    local_addr: SocketAddr,
    nodelay: bool,
}

impl TcpAcceptor {
    /// Binds to `addr` (e.g. `"0.0.0.0:7000"`).
    ///
    /// # Errors
    /// `InvalidAddress`, `AddressInUse` or `BindFailed`.
    pub async fn bind(addr: impl AsRef<str>, nodelay: bool) -> Result<Self> {
        Self::bind_addr(parse_addr(addr.as_ref())?, nodelay).await
    }

    /// Binds to a socket address.
    ///
    /// # Socket Options
    /// - `SO_REUSEADDR`: Enabled for quick rebinding
    /// - Non-blocking: Required for async operations
    ///
    /// # Errors
    /// Returns error if binding fails.
    pub async fn bind_addr(addr: SocketAddr, nodelay: bool) -> Result<Self> {
        info!("Binding TCP acceptor to {}", addr);

        let domain = if addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| TransportError::io("creating TCP socket", e))?;

        socket
            .set_reuse_address(true)
            .map_err(|e| TransportError::io("setting SO_REUSEADDR", e))?;

        socket
            .set_nonblocking(true)
            .map_err(|e| TransportError::io("setting non-blocking", e))?;

        socket.bind(&addr.into()).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AddrInUse {
                TransportError::AddressInUse { addr }
            } else {
                TransportError::bind_failed(addr, e.to_string())
            }
        })?;

        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| TransportError::bind_failed(addr, e.to_string()))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)
            .map_err(|e| TransportError::io("converting to Tokio listener", e))?;

        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("getting local address", e))?;

        info!("TCP acceptor bound to {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
            nodelay,
        })
    }

    /// Address actually bound (useful with port 0).
    #[must_use]
    pub const fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the next inbound connection.
    ///
    /// # Errors
    /// `AcceptFailed` if the OS refuses the connection or its socket
    /// options cannot be set.
    pub async fn accept(&self) -> Result<TcpTransport> {
        let (stream, remote) =
            self.listener
                .accept()
                .await
                .map_err(|e| TransportError::AcceptFailed {
                    reason: e.to_string(),
                })?;
        debug!("Accepted TCP connection from {}", remote);
        TcpTransport::from_stream(stream, self.nodelay).map_err(|e| TransportError::AcceptFailed {
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for TcpAcceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpAcceptor")
            .field("local_addr", &self.local_addr)
            .field("nodelay", &self.nodelay)
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_and_local_addr() {
        let acceptor = TcpAcceptor::bind("127.0.0.1:0", true).await.unwrap();
        let addr = acceptor.local_addr();

        assert_eq!(addr.ip(), std::net::Ipv4Addr::LOCALHOST);
        assert!(addr.port() > 0);
    }

    #[tokio::test]
    async fn test_send_recv_loopback() {
        let acceptor = TcpAcceptor::bind("127.0.0.1:0", true).await.unwrap();
        let addr = acceptor.local_addr();

        let server = tokio::spawn(async move {
            let mut conn = acceptor.accept().await.unwrap();
            let mut buf = [0u8; 5];
            conn.recv_exact(&mut buf).await.unwrap();
            conn.send_all(&buf).await.unwrap();
            conn.shutdown().await.unwrap();
        });

        let mut client = TcpTransport::connect_addr(addr, true).await.unwrap();
        assert_eq!(client.peer_addr(), Some(addr));
        client.send_all(b"hello").await.unwrap();

        let mut echoed = [0u8; 5];
        client.recv_exact(&mut echoed).await.unwrap();
        assert_eq!(&echoed, b"hello");

        // Server shut down its side: end-of-stream
        let mut buf = [0u8; 1];
        assert_eq!(client.recv(&mut buf).await.unwrap(), 0);
        assert!(matches!(
            client.recv_exact(&mut buf).await,
            Err(TransportError::Closed)
        ));

        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let result = TcpTransport::connect("not-an-address", true).await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));

        let result = TcpAcceptor::bind("nope", true).await;
        assert!(matches!(result, Err(TransportError::InvalidAddress { .. })));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Grab a free port, then release it
        let addr = {
            let acceptor = TcpAcceptor::bind("127.0.0.1:0", true).await.unwrap();
            acceptor.local_addr()
        };
        let result = TcpTransport::connect_addr(addr, true).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed { .. })));
    }
}
