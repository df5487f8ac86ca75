// ============================================
// File: crates/tether-core/src/crypto/kx.rs
// ============================================
//! # Ephemeral Key Exchange
//!
//! ## Creation Reason
//! Every connection runs a fresh X25519 exchange so that record keys are
//! independent of the long-term identities (forward secrecy).
//!
//! ## Main Functionality
//! - `KxKeyPair`: single-use X25519 key pair
//! - `KxPublicKey`: 32-byte public value sent on the wire
//! - `Role`: which side of the exchange we are on
//! - `DirectionalSecrets`: receive/transmit secrets for one role
//!
//! ## Key Lifecycle
//! ```text
//! generate() ──► public_key() sent to peer
//!      │
//!      └─► derive_{client,server}_secrets(peer) ──► DirectionalSecrets
//!          (consumes the pair; the X25519 scalar is zeroed here)
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The client's `tx` must equal the server's `rx` and vice versa; the
//!   tests below pin that property
//! - Non-contributory DH results (low-order peer points) are rejected
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use rand::rngs::OsRng;
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey};

use tether_common::SecretBytes;

use super::kdf::derive_directional_keys;
use super::{SESSION_KEY_SIZE, X25519_PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// Role
// ============================================

/// Side of the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Initiated the connection.
    Client,
    /// Accepted the connection.
    Server,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("client"),
            Self::Server => f.write_str("server"),
        }
    }
}

// ============================================
// KxPublicKey
// ============================================

/// X25519 public key as exchanged on the wire.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct KxPublicKey([u8; X25519_PUBLIC_KEY_SIZE]);

impl KxPublicKey {
    /// Wraps raw bytes received from a peer.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; X25519_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; X25519_PUBLIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for KxPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KxPublicKey({}...)", hex::encode(&self.0[..4]))
    }
}

// ============================================
// KxKeyPair
// ============================================

/// Single-use X25519 key pair.
///
/// Derivation takes `self` by value, so a pair can never be used for a
/// second exchange.
///
/// # Example
/// ```
/// use tether_core::crypto::KxKeyPair;
///
/// let client = KxKeyPair::generate();
/// let server = KxKeyPair::generate();
/// let (client_pk, server_pk) = (client.public_key(), server.public_key());
///
/// let c = client.derive_client_secrets(&server_pk).unwrap();
/// let s = server.derive_server_secrets(&client_pk).unwrap();
/// assert!(c.tx().ct_eq(s.rx()));
/// assert!(c.rx().ct_eq(s.tx()));
/// ```
pub struct KxKeyPair {
    secret: EphemeralSecret,
    public: KxPublicKey,
}

impl KxKeyPair {
    /// Generates a fresh key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = KxPublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    /// Returns the public half.
    #[must_use]
    pub const fn public_key(&self) -> KxPublicKey {
        self.public
    }

    /// Client side: `tx` is client-to-server, `rx` is server-to-client.
    ///
    /// # Errors
    /// `InvalidPeerKey` if the server's key is degenerate or equal to ours.
    pub fn derive_client_secrets(self, server_public: &KxPublicKey) -> Result<DirectionalSecrets> {
        self.derive(Role::Client, server_public)
    }

    /// Server side: `tx` is server-to-client, `rx` is client-to-server.
    ///
    /// # Errors
    /// `InvalidPeerKey` if the client's key is degenerate or equal to ours.
    pub fn derive_server_secrets(self, client_public: &KxPublicKey) -> Result<DirectionalSecrets> {
        self.derive(Role::Server, client_public)
    }

    /// Derives the directional secrets for `role`.
    ///
    /// # Errors
    /// See [`Self::derive_client_secrets`].
    pub fn derive(self, role: Role, peer_public: &KxPublicKey) -> Result<DirectionalSecrets> {
        let Self { secret, public } = self;

        if *peer_public == public {
            return Err(CoreError::InvalidPeerKey);
        }

        let shared = secret.diffie_hellman(&X25519PublicKey::from(peer_public.0));
        if !shared.was_contributory() {
            return Err(CoreError::InvalidPeerKey);
        }

        let (client_pk, server_pk) = match role {
            Role::Client => (public, *peer_public),
            Role::Server => (*peer_public, public),
        };
        let (c2s, s2c) = derive_directional_keys(shared.as_bytes(), &client_pk.0, &server_pk.0)?;

        Ok(match role {
            Role::Client => DirectionalSecrets { rx: s2c, tx: c2s },
            Role::Server => DirectionalSecrets { rx: c2s, tx: s2c },
        })
    }
}

impl fmt::Debug for KxKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KxKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================
// DirectionalSecrets
// ============================================

/// Receive and transmit secrets for one side of a connection.
#[derive(Debug)]
pub struct DirectionalSecrets {
    rx: SecretBytes<SESSION_KEY_SIZE>,
    tx: SecretBytes<SESSION_KEY_SIZE>,
}

impl DirectionalSecrets {
    /// Secret protecting inbound records.
    #[must_use]
    pub const fn rx(&self) -> &SecretBytes<SESSION_KEY_SIZE> {
        &self.rx
    }

    /// Secret protecting outbound records.
    #[must_use]
    pub const fn tx(&self) -> &SecretBytes<SESSION_KEY_SIZE> {
        &self.tx
    }

    /// Splits into `(rx, tx)`.
    #[must_use]
    pub fn into_parts(self) -> (SecretBytes<SESSION_KEY_SIZE>, SecretBytes<SESSION_KEY_SIZE>) {
        (self.rx, self.tx)
    }
}

// ============================================
// Tests
// ============================================
