// ============================================
// File: crates/tether-core/src/lib.rs
// ============================================
//! # Tether Core - Handshake & Record Cryptography
//!
//! ## Creation Reason
//! Provides the cryptographic building blocks of the Tether secure
//! channel. This crate is transport agnostic: it never touches a socket,
//! it only turns keys, challenges and frames into bytes and back.
//!
//! ## Main Functionality
//!
//! ### Crypto Module ([`crypto`])
//! - Ed25519 identities (`SigningKeyPair`, `SigningPublicKey`)
//! - X25519 ephemeral exchange (`KxKeyPair`, `DirectionalSecrets`)
//! - Challenge/response bound to both KX keys
//! - Session keys with per-direction nonce counters
//! - XChaCha20-Poly1305 record protection
//!
//! ### Protocol Module ([`protocol`])
//! - Fixed-size handshake records and their codec
//! - Length-prefixed frame header
//!
//! ### Trust Module ([`trust`])
//! - `TrustStore` / `IdentityProvider` seams
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 tether-peer                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   tether-core  ◄──     tether-transport             │
//! │   You are here                │                     │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             tether-common                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Guarantees
//! - **Confidentiality / Integrity**: XChaCha20-Poly1305 per frame
//! - **Authenticity**: Ed25519 signatures over the KX transcript
//! - **Forward Secrecy**: fresh X25519 keys per connection
//! - **Replay Protection**: implicit monotonic counters per direction
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER implement custom crypto primitives
//! - Session keys are only reachable through a `VerifiedIdentity`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod crypto;
pub mod error;
pub mod protocol;
pub mod trust;

// Re-export commonly used items
pub use crypto::{
    KxKeyPair, KxPublicKey, Role, SessionKeys, SigningKeyPair, SigningPublicKey,
    VerifiedIdentity,
};
pub use error::{CoreError, Result};
pub use protocol::{Codec, ProtocolCodec};
pub use trust::{IdentityProvider, MemoryTrustStore, TrustDecision, TrustStore};
