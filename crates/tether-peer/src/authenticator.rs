// ============================================
// File: crates/tether-peer/src/authenticator.rs
// ============================================
//! # Authenticator
//!
//! ## Creation Reason
//! Drives the mutual-authentication handshake over a raw transport and
//! hands back session keys only when the remote identity has been
//! verified and trusted.
//!
//! ## Handshake Flow
//! ```text
//!   Client                                   Server
//!     │ ── KX public key ─────────────────────► │
//!     │ ◄───────────────────── KX public key ── │   Init → KxExchanged
//!     │ ── challenge ─────────────────────────► │
//!     │ ◄──────────────────────── challenge ─── │   → ChallengesExchanged
//!     │ ── response ──────────────────────────► │   server verifies first
//!     │ ◄───────────────────────── response ─── │   → Authenticated
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Writes come first on the client and reads first on the server, so
//!   no step needs the transport to buffer both directions at once
//! - The server never answers a client it failed to verify; the client
//!   only sees the connection close
//! - Any error is terminal: the state moves to `Failed` and the
//!   ephemeral secrets are dropped
//!
//! ## Last Modified
//! v0.1.0 - Initial handshake state machine

use std::fmt;

use bytes::{Bytes, BytesMut};
use tracing::{debug, warn};

use tether_common::ConnectionId;
use tether_core::crypto::{
    issue_challenge, respond, verify_response, Challenge, ChallengeResponse, KxKeyPair,
    KxPublicKey, Role, SessionKeys, VerifiedIdentity,
};
use tether_core::protocol::{Codec, ProtocolCodec};
use tether_core::trust::{IdentityProvider, TrustStore};
use tether_transport::Transport;

use crate::error::{PeerError, Result};

// ============================================
// AuthState
// ============================================

/// Handshake progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing exchanged yet.
    Init,
    /// KX keys exchanged, directional secrets derived.
    KxExchanged,
    /// Both challenges exchanged.
    ChallengesExchanged,
    /// Peer verified; session keys handed out.
    Authenticated,
    /// Handshake failed; terminal.
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::KxExchanged => "kx-exchanged",
            Self::ChallengesExchanged => "challenges-exchanged",
            Self::Authenticated => "authenticated",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Keys and peer identity produced by a successful handshake.
#[derive(Debug)]
pub struct AuthOutcome {
    /// Record keys for the new session.
    pub keys: SessionKeys,
    /// The verified remote identity.
    pub peer: VerifiedIdentity,
}

// ============================================
// Authenticator
// ============================================

/// One-shot handshake driver for a single connection.
pub struct Authenticator<'a> {
    role: Role,
    conn: ConnectionId,
    state: AuthState,
    identity: &'a dyn IdentityProvider,
    trust: &'a dyn TrustStore,
    codec: ProtocolCodec,
}

impl<'a> Authenticator<'a> {
    /// Creates an authenticator in `Init`.
    #[must_use]
    pub fn new(
        role: Role,
        conn: ConnectionId,
        identity: &'a dyn IdentityProvider,
        trust: &'a dyn TrustStore,
    ) -> Self {
        Self {
            role,
            conn,
            state: AuthState::Init,
            identity,
            trust,
            codec: ProtocolCodec::new(),
        }
    }

    /// Current handshake state.
    #[must_use]
    pub const fn state(&self) -> AuthState {
        self.state
    }

    /// Runs the full handshake over `transport`.
    ///
    /// # Errors
    /// - `AlreadyAuthenticated` if called twice
    /// - `HandshakeIo` on transport failure
    /// - `InvalidPeerKey`, `ChallengeReflected`, `SignatureInvalid`,
    ///   `UnknownKey` when the peer is rejected
    pub async fn run<T>(&mut self, transport: &mut T) -> Result<AuthOutcome>
    where
        T: Transport + ?Sized,
    {
        if self.state != AuthState::Init {
            return Err(PeerError::AlreadyAuthenticated);
        }

        match self.drive(transport).await {
            Ok(outcome) => {
                self.transition(AuthState::Authenticated);
                Ok(outcome)
            }
            Err(e) => {
                if e.is_authentication_failure() {
                    warn!(conn = %self.conn, role = ?self.role, error = %e, "Peer rejected during handshake");
                } else {
                    debug!(conn = %self.conn, role = ?self.role, error = %e, "Handshake failed");
                }
                self.transition(AuthState::Failed);
                Err(e)
            }
        }
    }

    async fn drive<T>(&mut self, transport: &mut T) -> Result<AuthOutcome>
    where
        T: Transport + ?Sized,
    {
        // Step 1: ephemeral key exchange
        let kx = KxKeyPair::generate();
        let local_kx = kx.public_key();
        let peer_kx: KxPublicKey = self.exchange(transport, &local_kx, "key exchange").await?;
        let secrets = kx.derive(self.role, &peer_kx)?;
        self.transition(AuthState::KxExchanged);

        // Step 2: challenges
        let challenge = issue_challenge();
        let peer_challenge: Challenge = self.exchange(transport, &challenge, "challenge").await?;
        if peer_challenge == challenge {
            return Err(PeerError::ChallengeReflected);
        }
        self.transition(AuthState::ChallengesExchanged);

        // Step 3: responses, verified before anything is derived from them
        let response = respond(
            &peer_challenge,
            &local_kx,
            &peer_kx,
            self.identity.current_signing_key_pair(),
        );
        let verified = match self.role {
            Role::Client => {
                self.write(transport, &response, "response").await?;
                let peer_response: ChallengeResponse = self.read(transport, "response").await?;
                self.verify(&challenge, &peer_response, &local_kx, &peer_kx)?
            }
            Role::Server => {
                let peer_response: ChallengeResponse = self.read(transport, "response").await?;
                let verified = self.verify(&challenge, &peer_response, &local_kx, &peer_kx)?;
                self.write(transport, &response, "response").await?;
                verified
            }
        };

        Ok(AuthOutcome {
            keys: SessionKeys::establish(secrets, &verified),
            peer: verified,
        })
    }

    fn verify(
        &self,
        challenge: &Challenge,
        response: &ChallengeResponse,
        local_kx: &KxPublicKey,
        peer_kx: &KxPublicKey,
    ) -> Result<VerifiedIdentity> {
        let result = verify_response(challenge, response, local_kx, peer_kx, self.trust);
        debug!(
            conn = %self.conn,
            peer = %response.responder.fingerprint(),
            result = ?result,
            "Checked peer response"
        );
        result.into_result().map_err(PeerError::from)
    }

    /// Sends ours and receives theirs, in role order.
    async fn exchange<T, M>(&self, transport: &mut T, local: &M, stage: &'static str) -> Result<M>
    where
        T: Transport + ?Sized,
        M: Sync,
        ProtocolCodec: Codec<M>,
    {
        match self.role {
            Role::Client => {
                self.write(transport, local, stage).await?;
                self.read(transport, stage).await
            }
            Role::Server => {
                let remote = self.read(transport, stage).await?;
                self.write(transport, local, stage).await?;
                Ok(remote)
            }
        }
    }

    async fn write<T, M>(&self, transport: &mut T, msg: &M, stage: &'static str) -> Result<()>
    where
        T: Transport + ?Sized,
        M: Sync,
        ProtocolCodec: Codec<M>,
    {
        let mut buf = BytesMut::with_capacity(<ProtocolCodec as Codec<M>>::WIRE_SIZE);
        self.codec.encode(msg, &mut buf);
        transport
            .send_all(&buf)
            .await
            .map_err(|e| PeerError::handshake_io(stage, e))
    }

    async fn read<T, M>(&self, transport: &mut T, stage: &'static str) -> Result<M>
    where
        T: Transport + ?Sized,
        ProtocolCodec: Codec<M>,
    {
        let mut buf = vec![0u8; <ProtocolCodec as Codec<M>>::WIRE_SIZE];
        transport
            .recv_exact(&mut buf)
            .await
            .map_err(|e| PeerError::handshake_io(stage, e))?;
        let mut bytes = Bytes::from(buf);
        Ok(self.codec.decode(&mut bytes)?)
    }

    fn transition(&mut self, next: AuthState) {
        debug!(
            conn = %self.conn,
            role = ?self.role,
            from = %self.state,
            to = %next,
            "Handshake state change"
        );
        self.state = next;
    }
}

impl fmt::Debug for Authenticator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authenticator")
            .field("role", &self.role)
            .field("conn", &self.conn)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================
