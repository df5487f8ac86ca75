// ============================================
// File: crates/tether-core/src/trust.rs
// ============================================
//! # Trust and Identity Seams
//!
//! ## Creation Reason
//! The handshake needs two things from its environment: the local signing
//! key, and a yes/no answer on whether a peer's public key is acceptable.
//! Both are traits so the peer layer can plug in file-backed stores and
//! tests can plug in in-memory ones.
//!
//! ## Main Functionality
//! - `TrustStore`: lookup of peer signing keys
//! - `IdentityProvider`: access to the local signing key pair
//! - `MemoryTrustStore`: `HashSet`-backed store
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::collections::HashSet;

use crate::crypto::{SigningKeyPair, SigningPublicKey};

// ============================================
// Traits
// ============================================

/// Result of a trust store lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// Key is known and accepted.
    Allowed,
    /// Key is not in the store.
    Unknown,
}

/// Source of truth for which peer identities are accepted.
///
/// Lookups must be side-effect free; the handshake may call this once per
/// connection from any task.
pub trait TrustStore: Send + Sync {
    /// Looks up `key`.
    fn lookup(&self, key: &SigningPublicKey) -> TrustDecision;
}

/// Supplies the local long-term signing key.
pub trait IdentityProvider: Send + Sync {
    /// Returns the key pair to sign challenges with.
    fn current_signing_key_pair(&self) -> &SigningKeyPair;
}

impl IdentityProvider for SigningKeyPair {
    fn current_signing_key_pair(&self) -> &SigningKeyPair {
        self
    }
}

// ============================================
// MemoryTrustStore
// ============================================

/// In-memory set of allowed keys.
#[derive(Debug, Default, Clone)]
pub struct MemoryTrustStore {
    allowed: HashSet<SigningPublicKey>,
}

impl MemoryTrustStore {
    /// Creates an empty store (trusts nobody).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `key` to the allowed set.
    pub fn allow(&mut self, key: SigningPublicKey) -> &mut Self {
        self.allowed.insert(key);
        self
    }

    /// Number of allowed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    /// Returns `true` if no key is allowed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }
}

impl FromIterator<SigningPublicKey> for MemoryTrustStore {
    fn from_iter<I: IntoIterator<Item = SigningPublicKey>>(iter: I) -> Self {
        Self {
            allowed: iter.into_iter().collect(),
        }
    }
}

impl TrustStore for MemoryTrustStore {
    fn lookup(&self, key: &SigningPublicKey) -> TrustDecision {
        if self.allowed.contains(key) {
            TrustDecision::Allowed
        } else {
            TrustDecision::Unknown
        }
    }
}

// ============================================
// Tests
// ============================================
