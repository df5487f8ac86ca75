// ============================================
// File: crates/tether-core/src/error.rs
// ============================================
//! # Core Error Types
//!
//! ## Creation Reason
//! Defines error types specific to handshake cryptography, record
//! protection and wire decoding in the Tether core crate.
//!
//! ## Error Categories
//! 1. **Key Exchange / Identity**: degenerate peer keys, bad key encodings
//! 2. **Authentication**: invalid signatures, unknown identities, reflected challenges
//! 3. **Record Protection**: tag failures, nonce exhaustion
//! 4. **Wire Format**: truncated or oversized messages
//!
//! ## ⚠️ Important Note for Next Developer
//! - NEVER include key material in error messages
//! - `UnknownKey` vs `SignatureInvalid` is for local diagnostics only;
//!   the remote side must only ever observe a closed connection
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

use tether_common::error::CommonError;

// ============================================
// Result Type Alias
// ============================================

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

// ============================================
// CoreError
// ============================================

/// Core error types for handshake and record cryptography.
#[derive(Error, Debug)]
pub enum CoreError {
    // ========================================
    // Key Errors
    // ========================================

    /// Stored or supplied key bytes could not be parsed.
    #[error("Invalid key material: {reason}")]
    InvalidKey {
        /// Why the key was rejected
        reason: String,
    },

    /// Peer's key-exchange public key failed validation (low-order,
    /// identity point, or a reflection of our own key).
    #[error("Invalid peer key-exchange public key")]
    InvalidPeerKey,

    /// Key derivation failed.
    #[error("Key derivation failed: {reason}")]
    KeyDerivation {
        /// Why derivation failed
        reason: String,
    },

    // ========================================
    // Authentication Errors
    // ========================================

    /// Challenge-response signature did not verify.
    #[error("Challenge response signature is invalid")]
    SignatureInvalid,

    /// Responder identity is not present in the trust store.
    #[error("Peer identity is not trusted")]
    UnknownKey,

    /// Peer sent back the challenge we issued.
    #[error("Peer reflected our own challenge")]
    ChallengeReflected,

    // ========================================
    // Record Errors
    // ========================================

    /// Encryption operation failed.
    #[error("Encryption failed: {context}")]
    Encryption {
        /// What was being encrypted
        context: String,
    },

    /// AEAD tag verification failed (tampering, replay, reordering or
    /// mismatched keys).
    #[error("Authentication tag invalid")]
    AuthenticationTagInvalid,

    /// The per-direction nonce counter reached its limit.
    #[error("Nonce space exhausted; session must be re-established")]
    NonceSpaceExhausted,

    // ========================================
    // Wire Format Errors
    // ========================================

    /// Message is malformed.
    #[error("Malformed message: {reason}")]
    MalformedMessage {
        /// What's wrong with the message
        reason: String,
    },

    /// Message is too short to be valid.
    #[error("Message too short: expected at least {expected} bytes, got {actual}")]
    MessageTooShort {
        /// Minimum expected length
        expected: usize,
        /// Actual length received
        actual: usize,
    },

    /// Message exceeds maximum allowed size.
    #[error("Message too large: max {max} bytes, got {actual}")]
    MessageTooLarge {
        /// Maximum allowed size
        max: usize,
        /// Actual size
        actual: usize,
    },

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl CoreError {
    /// Creates an `InvalidKey` error.
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Creates a `MalformedMessage` error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedMessage {
            reason: reason.into(),
        }
    }

    /// Creates a `MessageTooShort` error.
    #[must_use]
    pub const fn too_short(expected: usize, actual: usize) -> Self {
        Self::MessageTooShort { expected, actual }
    }

    /// Creates a `MessageTooLarge` error.
    #[must_use]
    pub const fn too_large(max: usize, actual: usize) -> Self {
        Self::MessageTooLarge { max, actual }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CoreError::too_short(96, 50);
        assert!(err.to_string().contains("96"));
        assert!(err.to_string().contains("50"));

        assert!(CoreError::NonceSpaceExhausted.to_string().contains("Nonce"));
    }

    #[test]
    fn test_common_error_conversion() {
        let common = CommonError::invalid_length(32, 3);
        let core: CoreError = common.into();
        assert!(matches!(core, CoreError::Common(_)));
    }
}
