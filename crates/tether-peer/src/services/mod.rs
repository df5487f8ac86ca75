// ============================================
// File: crates/tether-peer/src/services/mod.rs
// ============================================
//! # Peer Services
//!
//! ## Creation Reason
//! File-backed implementations of the identity and trust seams the
//! handshake depends on.
//!
//! ## Main Functionality
//! - [`key_stash`]: local Ed25519 identity on disk (`IdentityProvider`)
//! - [`known_keys`]: trusted peer keys on disk (`TrustStore`)
//!
//! ## ⚠️ Important Note for Next Developer
//! - Tests use `SigningKeyPair` and `MemoryTrustStore` directly; these
//!   services are only needed where state must survive a restart
//!
//! ## Last Modified
//! v0.1.0 - Initial services

pub mod key_stash;
pub mod known_keys;

pub use key_stash::KeyStash;
pub use known_keys::KnownKeys;
