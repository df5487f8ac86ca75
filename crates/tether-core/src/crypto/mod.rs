// ============================================
// File: crates/tether-core/src/crypto/mod.rs
// ============================================
//! # Cryptography Module
//!
//! ## Creation Reason
//! Centralizes all cryptographic operations of the Tether channel, using
//! audited RustCrypto / dalek implementations.
//!
//! ## Submodules
//! - [`identity`]: Long-term Ed25519 signing identities
//! - [`kx`]: Ephemeral X25519 key exchange producing directional secrets
//! - [`kdf`]: HKDF-SHA256 split of the shared secret into rx/tx keys
//! - [`challenge`]: Challenge issuance, signed responses, verification
//! - [`session`]: Session keys with per-direction nonce counters
//! - [`transport`]: XChaCha20-Poly1305 record sealing/opening
//!
//! ## Cryptographic Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │  Client                                        Server       │
//! │    │  X25519 ephemeral ──────────────────────────►│         │
//! │    │◄────────────────────────── X25519 ephemeral  │         │
//! │    │        HKDF-SHA256 ──► rx / tx per role      │         │
//! │    │  challenge ─────────────────────────────────►│         │
//! │    │◄───────────────────────────────── challenge  │         │
//! │    │  Ed25519(nonce ‖ own KX ‖ peer KX) ─────────►│         │
//! │    │◄───────── Ed25519(nonce ‖ own KX ‖ peer KX)  │         │
//! └─────────────────────────────────────────────────────────────┘
//!
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Transport Phase                          │
//! │   tx key + send counter ──► XChaCha20-Poly1305 ──► frame    │
//! │   frame ──► XChaCha20-Poly1305 ◄── rx key + recv counter    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER roll your own crypto
//! - ALL secret material lives in `SecretBytes` or dalek types that
//!   zeroize on drop
//!
//! ## Last Modified
//! v0.1.0 - Initial crypto implementation

pub mod challenge;
pub mod identity;
pub mod kdf;
pub mod kx;
pub mod session;
pub mod transport;

// Re-export primary types at module level
pub use challenge::{
    issue_challenge, respond, verify_response, Challenge, ChallengeResponse, VerifiedIdentity,
    VerifyResult,
};
pub use identity::{verify, Signature, SigningKeyPair, SigningPublicKey};
pub use kx::{DirectionalSecrets, KxKeyPair, KxPublicKey, Role};
pub use session::{NonceCounter, OpeningKey, SealingKey, SessionKeys};

// ============================================
// Constants
// ============================================

/// Size of an Ed25519 seed (secret key) in bytes.
pub const ED25519_SEED_SIZE: usize = 32;

/// Size of an Ed25519 public key in bytes.
pub const ED25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of an Ed25519 signature in bytes.
pub const ED25519_SIGNATURE_SIZE: usize = 64;

/// Size of an X25519 public key in bytes.
pub const X25519_PUBLIC_KEY_SIZE: usize = 32;

/// Size of a directional session key in bytes.
pub const SESSION_KEY_SIZE: usize = 32;

/// Size of a challenge nonce in bytes.
pub const CHALLENGE_NONCE_SIZE: usize = 32;

/// Size of the XChaCha20-Poly1305 nonce in bytes.
pub const XCHACHA20_NONCE_SIZE: usize = 24;

/// Size of the Poly1305 authentication tag in bytes.
pub const POLY1305_TAG_SIZE: usize = 16;

/// HKDF salt for directional key derivation.
pub const HKDF_SALT: &[u8] = b"tether-kx-v1";

/// HKDF info prefix for directional key derivation.
pub const HKDF_INFO_PREFIX: &[u8] = b"tether-directional-keys";
