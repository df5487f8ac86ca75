// ============================================
// File: crates/tether-peer/src/peer.rs
// ============================================
//! # Peer
//!
//! ## Creation Reason
//! The public session object. A `Peer` owns one transport, runs the
//! handshake on it once, and then carries encrypted messages in both
//! directions.
//!
//! ## Main Functionality
//! - `Peer::connect` / `Peer::accept` / `Peer::client`: construction
//! - `authenticate`: mutual authentication through `Authenticator`
//! - `send` / `receive`: framed, encrypted messages
//! - `close`: flush, shut down, forget keys
//!
//! ## Lifecycle
//! ```text
//!                  authenticate()
//!  Unauthenticated ──────────────► Authenticating ──► Authenticated
//!                                        │                 │  │
//!                                        ▼      fatal error│  │close() / EOF
//!                                      Failed ◄────────────┘  ▼
//!                                                           Closed
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Session keys exist only inside the `Authenticated` state; leaving it
//!   for any reason drops (and zeroes) them
//! - `send`/`receive` before authentication never touch the transport
//! - A handshake future dropped mid-way leaves the peer `Failed`
//! - One task drives a `Peer`; it holds no locks
//!
//! ## Last Modified
//! v0.1.0 - Initial peer implementation

use std::fmt;
use std::net::SocketAddr;

use tracing::{debug, info, warn};

use tether_common::ConnectionId;
use tether_core::crypto::{Role, SigningPublicKey};
use tether_core::protocol::DEFAULT_MAX_FRAME_PLAINTEXT;
use tether_core::trust::{IdentityProvider, TrustStore};
use tether_transport::{TcpTransport, Transport};

use crate::authenticator::Authenticator;
use crate::buffer::{InBuffer, OutBuffer};
use crate::error::{PeerError, Result};

// ============================================
// PeerOptions
// ============================================

/// Runtime knobs for a `Peer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerOptions {
    /// Largest plaintext message accepted in either direction.
    pub max_frame_size: usize,
    /// TCP_NODELAY for connections opened by `Peer::connect`.
    pub nodelay: bool,
}

impl Default for PeerOptions {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_PLAINTEXT,
            nodelay: true,
        }
    }
}

// ============================================
// PeerState
// ============================================

/// Observable lifecycle state of a `Peer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerState {
    /// Connected, handshake not started.
    Unauthenticated,
    /// Handshake in progress.
    Authenticating,
    /// Session keys established.
    Authenticated,
    /// Handshake or session failed; discard the peer.
    Failed,
    /// Closed locally or by the remote end.
    Closed,
}

impl PeerState {
    const fn name(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Authenticating => "authenticating",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PeerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Established channel; only reachable in the authenticated state.
#[derive(Debug)]
struct Channel {
    outbound: OutBuffer,
    inbound: InBuffer,
    remote: SigningPublicKey,
}

enum Session {
    Unauthenticated,
    Authenticating,
    Authenticated(Box<Channel>),
    Failed,
    Closed,
}

impl Session {
    const fn state(&self) -> PeerState {
        match self {
            Self::Unauthenticated => PeerState::Unauthenticated,
            Self::Authenticating => PeerState::Authenticating,
            Self::Authenticated(_) => PeerState::Authenticated,
            Self::Failed => PeerState::Failed,
            Self::Closed => PeerState::Closed,
        }
    }
}

// ============================================
// Peer
// ============================================

/// One end of a mutually authenticated, encrypted connection.
///
/// # Example
/// ```ignore
/// let mut peer = Peer::connect("127.0.0.1:7000", PeerOptions::default()).await?;
/// peer.authenticate(&identity, &known_keys).await?;
/// peer.send(b"hello").await?;
/// let reply = peer.receive().await?;
/// ```
pub struct Peer<T: Transport> {
    transport: T,
    role: Role,
    conn: ConnectionId,
    session: Session,
    options: PeerOptions,
}

impl Peer<TcpTransport> {
    /// Opens a TCP connection to `addr` as the client side.
    ///
    /// # Errors
    /// `Transport` if the address is invalid or the connection fails.
    pub async fn connect(addr: impl AsRef<str>, options: PeerOptions) -> Result<Self> {
        let transport = TcpTransport::connect(addr, options.nodelay).await?;
        Ok(Self::client(transport, options))
    }
}

impl<T: Transport> Peer<T> {
    /// Wraps a connected transport as the client side.
    #[must_use]
    pub fn client(transport: T, options: PeerOptions) -> Self {
        Self::new(transport, Role::Client, options)
    }

    /// Wraps an accepted transport as the server side.
    #[must_use]
    pub fn accept(transport: T, options: PeerOptions) -> Self {
        Self::new(transport, Role::Server, options)
    }

    fn new(transport: T, role: Role, options: PeerOptions) -> Self {
        let conn = ConnectionId::generate();
        debug!(
            conn = %conn,
            role = ?role,
            remote = ?transport.peer_addr(),
            "Peer created"
        );
        Self {
            transport,
            role,
            conn,
            session: Session::Unauthenticated,
            options,
        }
    }

    // ========================================
    // Accessors
    // ========================================

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> PeerState {
        match self.session {
            // Only observable after the handshake future was dropped
            Session::Authenticating => PeerState::Failed,
            ref other => other.state(),
        }
    }

    /// This end's role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Identifier used in log lines for this connection.
    #[must_use]
    pub const fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// The verified remote identity, once authenticated.
    #[must_use]
    pub fn remote_identity(&self) -> Option<SigningPublicKey> {
        match &self.session {
            Session::Authenticated(channel) => Some(channel.remote),
            _ => None,
        }
    }

    /// Remote socket address, if the transport has one.
    #[must_use]
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.transport.peer_addr()
    }

    // ========================================
    // Handshake
    // ========================================

    /// Runs mutual authentication.
    ///
    /// Returns the remote identity on success. On failure the peer is
    /// `Failed` and must be discarded.
    ///
    /// # Errors
    /// - `AlreadyAuthenticated` if a handshake was already attempted
    /// - `HandshakeIo`, `InvalidPeerKey`, `ChallengeReflected`,
    ///   `SignatureInvalid`, `UnknownKey`
    pub async fn authenticate(
        &mut self,
        identity: &dyn IdentityProvider,
        trust: &dyn TrustStore,
    ) -> Result<SigningPublicKey> {
        self.settle_abandoned_handshake().await;
        if !matches!(self.session, Session::Unauthenticated) {
            return Err(PeerError::AlreadyAuthenticated);
        }

        self.set_session(Session::Authenticating);
        let mut authenticator = Authenticator::new(self.role, self.conn, identity, trust);

        match authenticator.run(&mut self.transport).await {
            Ok(outcome) => {
                let remote = outcome.peer.public_key();
                let (sealing, opening) = outcome.keys.split();
                self.set_session(Session::Authenticated(Box::new(Channel {
                    outbound: OutBuffer::new(sealing, self.options.max_frame_size),
                    inbound: InBuffer::new(opening, self.options.max_frame_size),
                    remote,
                })));
                info!(
                    conn = %self.conn,
                    role = ?self.role,
                    peer = %remote.fingerprint(),
                    "Peer authenticated"
                );
                Ok(remote)
            }
            Err(e) => {
                self.set_session(Session::Failed);
                // Best effort; the connection is unusable either way
                let _ = self.transport.shutdown().await;
                Err(e)
            }
        }
    }

    // ========================================
    // Messaging
    // ========================================

    /// Encrypts and sends one message.
    ///
    /// # Errors
    /// - `NotAuthenticated` / `SessionTerminated` in the wrong state
    /// - `FrameTooLarge` (session unaffected)
    /// - `NonceSpaceExhausted`, `TransportIo` (session fails and the
    ///   transport is shut down)
    pub async fn send(&mut self, message: &[u8]) -> Result<()> {
        self.settle_abandoned_handshake().await;
        let channel = Self::channel(&mut self.session)?;

        let result = match channel.outbound.push(message) {
            Ok(_) => channel.outbound.flush(&mut self.transport).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => Ok(()),
            Err(e) => Err(self.on_error(e).await),
        }
    }

    /// Waits for and decrypts the next message.
    ///
    /// Cancel safe: a dropped `receive` future loses no bytes.
    ///
    /// # Errors
    /// - `NotAuthenticated` / `SessionTerminated` in the wrong state
    /// - `ConnectionClosed` when the peer closed cleanly (state `Closed`)
    /// - `AuthenticationTagInvalid`, `MalformedFrame`,
    ///   `NonceSpaceExhausted`, `TransportIo` (session fails and the
    ///   transport is shut down)
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        self.settle_abandoned_handshake().await;
        let channel = Self::channel(&mut self.session)?;

        match channel.inbound.next_frame(&mut self.transport).await {
            Ok(Some(message)) => Ok(message),
            Ok(None) => {
                debug!(conn = %self.conn, "Peer closed the connection");
                self.set_session(Session::Closed);
                Err(PeerError::ConnectionClosed)
            }
            Err(e) => Err(self.on_error(e).await),
        }
    }

    /// Flushes pending frames, shuts the transport down and forgets the
    /// session keys. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns the flush or shutdown error; the peer is `Closed` anyway.
    pub async fn close(&mut self) -> Result<()> {
        self.settle_abandoned_handshake().await;
        if matches!(self.session, Session::Closed) {
            return Ok(());
        }

        let flushed = match &mut self.session {
            Session::Authenticated(channel) => channel.outbound.flush(&mut self.transport).await,
            _ => Ok(()),
        };
        self.set_session(Session::Closed);

        let shutdown = self
            .transport
            .shutdown()
            .await
            .map_err(PeerError::TransportIo);
        flushed.and(shutdown)
    }

    // ========================================
    // Internals
    // ========================================

    fn channel(session: &mut Session) -> Result<&mut Channel> {
        match session {
            Session::Authenticated(channel) => Ok(channel),
            Session::Unauthenticated | Session::Authenticating => {
                Err(PeerError::NotAuthenticated)
            }
            Session::Failed => Err(PeerError::SessionTerminated {
                state: PeerState::Failed.name(),
            }),
            Session::Closed => Err(PeerError::SessionTerminated {
                state: PeerState::Closed.name(),
            }),
        }
    }

    /// Tears the session down on a fatal error: keys are dropped and the
    /// transport is shut so the remote end sees the connection close.
    async fn on_error(&mut self, err: PeerError) -> PeerError {
        if !err.is_fatal() {
            return err;
        }

        match &err {
            PeerError::TransportIo(e) if e.is_closed() => {
                debug!(conn = %self.conn, role = ?self.role, error = %err, "Connection lost");
            }
            e if e.is_suspicious() => {
                warn!(conn = %self.conn, role = ?self.role, error = %err, "Peer sent an invalid frame");
            }
            _ => {
                warn!(conn = %self.conn, role = ?self.role, error = %err, "Session failed");
            }
        }
        self.set_session(Session::Failed);
        // Best effort; the session is gone either way
        let _ = self.transport.shutdown().await;
        err
    }

    async fn settle_abandoned_handshake(&mut self) {
        if matches!(self.session, Session::Authenticating) {
            warn!(conn = %self.conn, "Handshake was abandoned mid-way");
            self.set_session(Session::Failed);
            let _ = self.transport.shutdown().await;
        }
    }

    fn set_session(&mut self, next: Session) {
        debug!(
            conn = %self.conn,
            from = %self.session.state(),
            to = %next.state(),
            "Peer state change"
        );
        self.session = next;
    }
}

impl<T: Transport> fmt::Debug for Peer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("conn", &self.conn)
            .field("role", &self.role)
            .field("state", &self.state())
            .field("remote", &self.remote_identity().map(|k| k.fingerprint()))
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
