// ============================================
// File: crates/tether-core/src/crypto/identity.rs
// ============================================
//! # Signing Identities
//!
//! ## Creation Reason
//! Each endpoint is identified by a long-term Ed25519 key pair. The public
//! half is what trust stores hold; the private half only ever signs
//! handshake transcripts.
//!
//! ## Main Functionality
//! - `SigningKeyPair`: Long-term Ed25519 key pair (seed zeroed on drop)
//! - `SigningPublicKey`: 32-byte public key, compared by byte equality
//! - `Signature`: 64-byte detached Ed25519 signature
//! - [`verify`]: strict verification returning a plain boolean
//!
//! ## ⚠️ Important Note for Next Developer
//! - `SigningPublicKey` deliberately stores raw bytes, not a decoded
//!   point. Keys received from the wire may be garbage; that must surface
//!   as a failed verification, never as a decode error or panic.
//! - Verification uses `verify_strict` (rejects small-order keys and
//!   non-canonical signatures).
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use tether_common::SecretBytes;

use super::{ED25519_PUBLIC_KEY_SIZE, ED25519_SEED_SIZE, ED25519_SIGNATURE_SIZE};
use crate::error::{CoreError, Result};

// ============================================
// SigningKeyPair
// ============================================

/// Long-term Ed25519 identity key pair.
///
/// # Example
/// ```
/// use tether_core::crypto::{verify, SigningKeyPair};
///
/// let identity = SigningKeyPair::generate();
/// let signature = identity.sign(b"hello");
/// assert!(verify(&identity.public_key(), b"hello", &signature));
/// ```
pub struct SigningKeyPair {
    signing_key: SigningKey,
    public: SigningPublicKey,
}

impl SigningKeyPair {
    /// Generates a new random key pair from the OS RNG.
    #[must_use]
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Rebuilds a key pair from its 32-byte seed.
    #[must_use]
    pub fn from_seed(seed: &SecretBytes<ED25519_SEED_SIZE>) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed.expose()))
    }

    /// Rebuilds a key pair from a seed slice.
    ///
    /// # Errors
    /// Returns `InvalidKey` if `bytes` is not exactly 32 bytes.
    pub fn from_seed_slice(bytes: &[u8]) -> Result<Self> {
        let seed = SecretBytes::<ED25519_SEED_SIZE>::from_slice(bytes).map_err(|_| {
            CoreError::invalid_key(format!(
                "Ed25519 seed must be {ED25519_SEED_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self::from_seed(&seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let public = SigningPublicKey(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            public,
        }
    }

    /// Returns the public half.
    #[must_use]
    pub const fn public_key(&self) -> SigningPublicKey {
        self.public
    }

    /// Signs `message`.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.signing_key.sign(message).to_bytes())
    }

    /// Exports the seed for persistent storage.
    #[must_use]
    pub fn seed(&self) -> SecretBytes<ED25519_SEED_SIZE> {
        SecretBytes::new(self.signing_key.to_bytes())
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyPair")
            .field("public_key", &self.public)
            .finish_non_exhaustive()
    }
}

// ============================================
// SigningPublicKey
// ============================================

/// Ed25519 public key as 32 raw bytes.
///
/// Equality is byte equality, which is what trust stores rely on.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SigningPublicKey([u8; ED25519_PUBLIC_KEY_SIZE]);

impl SigningPublicKey {
    /// Wraps raw key bytes. No point validation is done here.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ED25519_PUBLIC_KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Parses a public key from a slice.
    ///
    /// # Errors
    /// Returns `InvalidKey` on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let arr: [u8; ED25519_PUBLIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CoreError::invalid_key(format!(
                "Ed25519 public key must be {ED25519_PUBLIC_KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(arr))
    }

    /// Returns the raw key bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ED25519_PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// Short hex form for log lines.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningPublicKey({}...)", self.fingerprint())
    }
}

impl fmt::Display for SigningPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&BASE64.encode(self.0))
    }
}

impl FromStr for SigningPublicKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = BASE64
            .decode(s.trim())
            .map_err(|e| CoreError::invalid_key(format!("public key is not base64: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl Serialize for SigningPublicKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for SigningPublicKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = <Vec<u8>>::deserialize(deserializer)?;
            Self::from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

// ============================================
// Signature
// ============================================

/// Detached 64-byte Ed25519 signature.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature([u8; ED25519_SIGNATURE_SIZE]);

impl Signature {
    /// Wraps raw signature bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; ED25519_SIGNATURE_SIZE]) -> Self {
        Self(bytes)
    }

    /// Returns the raw signature bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; ED25519_SIGNATURE_SIZE] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}...)", hex::encode(&self.0[..8]))
    }
}

// ============================================
// Verification
// ============================================

/// Verifies `signature` over `message` under `public_key`.
///
/// Returns `false` for undecodable keys, small-order keys and
/// non-canonical signatures as well as plain mismatches.
#[must_use]
pub fn verify(public_key: &SigningPublicKey, message: &[u8], signature: &Signature) -> bool {
    let Ok(key) = VerifyingKey::from_bytes(public_key.as_bytes()) else {
        return false;
    };
    let sig = ed25519_dalek::Signature::from_bytes(signature.as_bytes());
    key.verify_strict(message, &sig).is_ok()
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let kp = SigningKeyPair::generate();
        let sig = kp.sign(b"transcript");

        assert!(verify(&kp.public_key(), b"transcript", &sig));
        assert!(!verify(&kp.public_key(), b"transcript!", &sig));
    }

    #[test]
    fn test_verify_wrong_key() {
        let a = SigningKeyPair::generate();
        let b = SigningKeyPair::generate();
        let sig = a.sign(b"msg");

        assert!(!verify(&b.public_key(), b"msg", &sig));
    }

    #[test]
    fn test_verify_garbage_key_is_false() {
        let kp = SigningKeyPair::generate();
        let sig = kp.sign(b"msg");

        // Not a valid compressed Edwards point
        let garbage = SigningPublicKey::from_bytes([0xFF; 32]);
        assert!(!verify(&garbage, b"msg", &sig));

        // Identity point is small-order and must be refused
        let mut identity = [0u8; 32];
        identity[0] = 1;
        assert!(!verify(&SigningPublicKey::from_bytes(identity), b"msg", &sig));
    }

    #[test]
    fn test_seed_restores_same_identity() {
        let kp = SigningKeyPair::generate();
        let seed = kp.seed();
        let restored = SigningKeyPair::from_seed(&seed);
        assert_eq!(kp.public_key(), restored.public_key());

        assert!(SigningKeyPair::from_seed_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn test_public_key_text_form() {
        let public = SigningKeyPair::generate().public_key();
        let parsed: SigningPublicKey = public.to_string().parse().unwrap();
        assert_eq!(public, parsed);

        assert!("!!!".parse::<SigningPublicKey>().is_err());
        assert!(BASE64
            .encode([1u8; 16])
            .parse::<SigningPublicKey>()
            .is_err());
    }

    #[test]
    fn test_public_key_serde_json() {
        let public = SigningKeyPair::generate().public_key();
        let json = serde_json::to_string(&public).unwrap();
        let restored: SigningPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(public, restored);
    }

    #[test]
    fn test_debug_hides_seed() {
        let kp = SigningKeyPair::generate();
        let shown = format!("{kp:?}");
        assert!(shown.contains("SigningPublicKey"));
        assert!(!shown.contains(&hex::encode(kp.seed().expose())));
    }
}
