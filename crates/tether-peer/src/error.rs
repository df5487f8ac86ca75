// ============================================
// File: crates/tether-peer/src/error.rs
// ============================================
//! # Peer Error Types
//!
//! ## Creation Reason
//! One error type for everything a caller of `Peer` can observe, from
//! configuration problems to a forged frame.
//!
//! ## Error Categories
//! 1. **Configuration Errors**: config, key-stash and known-keys files
//! 2. **Handshake Errors**: I/O during the handshake, bad peer keys,
//!    rejected identities
//! 3. **Session Errors**: tag failures, nonce exhaustion, bad frames,
//!    calls in the wrong state
//! 4. **Wrapped Errors**: transport, core and common errors
//!
//! ## ⚠️ Important Note for Next Developer
//! - `From<CoreError>` flattens the authentication and record failures
//!   into their own variants; callers match on `PeerError` only
//! - `is_fatal` decides whether a `Peer` drops its keys
//!
//! ## Last Modified
//! v0.1.0 - Initial peer error definitions

use thiserror::Error;

use tether_common::error::CommonError;
use tether_core::error::CoreError;
use tether_transport::error::TransportError;

/// Result type for peer operations.
pub type Result<T> = std::result::Result<T, PeerError>;

/// Peer error types.
#[derive(Error, Debug)]
pub enum PeerError {
    // ========================================
    // Configuration Errors
    // ========================================

    /// Configuration file could not be read or parsed.
    #[error("Failed to load configuration from '{path}': {reason}")]
    ConfigLoad {
        /// File that failed
        path: String,
        /// Why loading failed
        reason: String,
    },

    /// Configuration value out of range.
    #[error("Invalid configuration: {field} - {reason}")]
    ConfigInvalid {
        /// Dotted field name
        field: String,
        /// What is wrong with it
        reason: String,
    },

    /// Key-stash file could not be read, written or parsed.
    #[error("Key file '{path}': {reason}")]
    KeyFile {
        /// Key-stash path
        path: String,
        /// What went wrong
        reason: String,
    },

    /// Known-keys file has a bad entry or could not be read.
    #[error("Known keys file '{path}' line {line}: {reason}")]
    KnownKeys {
        /// Known-keys path
        path: String,
        /// 1-based line number, 0 when the whole file failed
        line: usize,
        /// What went wrong
        reason: String,
    },

    // ========================================
    // Handshake Errors
    // ========================================

    /// Transport failed while exchanging handshake records.
    #[error("Handshake I/O failed during {stage}: {source}")]
    HandshakeIo {
        /// Handshake step that was running
        stage: &'static str,
        /// Underlying transport error
        #[source]
        source: TransportError,
    },

    /// Peer's key-exchange public key was rejected.
    #[error("Invalid peer key-exchange public key")]
    InvalidPeerKey,

    /// Peer's challenge response signature did not verify.
    #[error("Peer signature is invalid")]
    SignatureInvalid,

    /// Peer's identity is not in the trust store.
    #[error("Peer identity is not trusted")]
    UnknownKey,

    /// Peer echoed our own challenge back.
    #[error("Peer reflected our challenge")]
    ChallengeReflected,

    // ========================================
    // Session Errors
    // ========================================

    /// Transport failed while an authenticated session was running.
    #[error("Transport I/O failed: {0}")]
    TransportIo(#[source] TransportError),

    /// An inbound frame failed authentication.
    #[error("Authentication tag invalid")]
    AuthenticationTagInvalid,

    /// A nonce counter reached its limit.
    #[error("Nonce space exhausted; reconnect to continue")]
    NonceSpaceExhausted,

    /// `send`/`receive` called before authentication finished.
    #[error("Peer is not authenticated")]
    NotAuthenticated,

    /// `authenticate` called on a peer that already ran a handshake.
    #[error("Handshake already attempted on this connection")]
    AlreadyAuthenticated,

    /// The session has ended; the peer must be discarded.
    #[error("Session terminated ({state})")]
    SessionTerminated {
        /// Terminal state the peer is in
        state: &'static str,
    },

    /// Outbound message exceeds the configured frame limit.
    #[error("Frame too large: max {max} bytes, got {actual}")]
    FrameTooLarge {
        /// Configured maximum plaintext size
        max: usize,
        /// Message size
        actual: usize,
    },

    /// Inbound frame header or body was invalid.
    #[error("Malformed frame: {reason}")]
    MalformedFrame {
        /// What was wrong with it
        reason: String,
    },

    /// Peer closed the connection cleanly between frames.
    #[error("Connection closed by peer")]
    ConnectionClosed,

    // ========================================
    // Wrapped Errors
    // ========================================

    /// Other error from the core crate.
    #[error(transparent)]
    Core(CoreError),

    /// Transport error outside an established session.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Error from common crate.
    #[error(transparent)]
    Common(#[from] CommonError),
}

impl PeerError {
    // ========================================
    // Convenience Constructors
    // ========================================

    /// Creates a `ConfigLoad` error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `ConfigInvalid` error.
    pub fn config_invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `KeyFile` error.
    pub fn key_file(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::KeyFile {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `KnownKeys` error.
    pub fn known_keys(path: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::KnownKeys {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Creates a `HandshakeIo` error.
    #[must_use]
    pub const fn handshake_io(stage: &'static str, source: TransportError) -> Self {
        Self::HandshakeIo { stage, source }
    }

    /// Creates a `MalformedFrame` error.
    pub fn malformed_frame(reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            reason: reason.into(),
        }
    }

    // ========================================
    // Error Classification
    // ========================================

    /// Returns `true` for configuration and local file errors.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigLoad { .. }
                | Self::ConfigInvalid { .. }
                | Self::KeyFile { .. }
                | Self::KnownKeys { .. }
        )
    }

    /// Returns `true` if the remote identity was rejected.
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidPeerKey
                | Self::SignatureInvalid
                | Self::UnknownKey
                | Self::ChallengeReflected
        )
    }

    /// Returns `true` if the session cannot continue after this error.
    ///
    /// Usage errors (`NotAuthenticated`, `FrameTooLarge`, ...) leave the
    /// session untouched; everything that may have desynchronized the
    /// stream or the counters is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::NotAuthenticated
                | Self::AlreadyAuthenticated
                | Self::SessionTerminated { .. }
                | Self::FrameTooLarge { .. }
                | Self::ConfigLoad { .. }
                | Self::ConfigInvalid { .. }
                | Self::KeyFile { .. }
                | Self::KnownKeys { .. }
        )
    }

    /// Returns `true` if the peer sent bytes no honest implementation
    /// would produce. These are logged at `warn!`.
    #[must_use]
    pub const fn is_suspicious(&self) -> bool {
        matches!(
            self,
            Self::InvalidPeerKey
                | Self::SignatureInvalid
                | Self::ChallengeReflected
                | Self::AuthenticationTagInvalid
                | Self::MalformedFrame { .. }
        )
    }
}

// ============================================
// Error Conversions
// ============================================

impl From<CoreError> for PeerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidPeerKey => Self::InvalidPeerKey,
            CoreError::SignatureInvalid => Self::SignatureInvalid,
            CoreError::UnknownKey => Self::UnknownKey,
            CoreError::ChallengeReflected => Self::ChallengeReflected,
            CoreError::AuthenticationTagInvalid => Self::AuthenticationTagInvalid,
            CoreError::NonceSpaceExhausted => Self::NonceSpaceExhausted,
            other => Self::Core(other),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_are_flattened() {
        assert!(matches!(
            PeerError::from(CoreError::AuthenticationTagInvalid),
            PeerError::AuthenticationTagInvalid
        ));
        assert!(matches!(
            PeerError::from(CoreError::UnknownKey),
            PeerError::UnknownKey
        ));
        assert!(matches!(
            PeerError::from(CoreError::NonceSpaceExhausted),
            PeerError::NonceSpaceExhausted
        ));
        assert!(matches!(
            PeerError::from(CoreError::malformed("x")),
            PeerError::Core(CoreError::MalformedMessage { .. })
        ));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(PeerError::AuthenticationTagInvalid.is_fatal());
        assert!(PeerError::malformed_frame("short").is_fatal());
        assert!(PeerError::TransportIo(TransportError::Closed).is_fatal());

        assert!(!PeerError::NotAuthenticated.is_fatal());
        assert!(!PeerError::FrameTooLarge { max: 1, actual: 2 }.is_fatal());
    }

    #[test]
    fn test_authentication_failures() {
        assert!(PeerError::UnknownKey.is_authentication_failure());
        assert!(PeerError::SignatureInvalid.is_authentication_failure());
        assert!(!PeerError::AuthenticationTagInvalid.is_authentication_failure());
    }

    #[test]
    fn test_suspicious_classification() {
        assert!(PeerError::SignatureInvalid.is_suspicious());
        assert!(PeerError::ChallengeReflected.is_suspicious());
        assert!(PeerError::AuthenticationTagInvalid.is_suspicious());

        // A well-formed proof from a stranger is an ordinary rejection
        assert!(!PeerError::UnknownKey.is_suspicious());
        assert!(!PeerError::TransportIo(TransportError::Closed).is_suspicious());
    }

    #[test]
    fn test_config_errors() {
        let err = PeerError::config_invalid("limits.max_frame_size", "must be greater than 0");
        assert!(err.is_config_error());
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("limits.max_frame_size"));
    }

    #[test]
    fn test_handshake_io_display() {
        let err = PeerError::handshake_io("key exchange", TransportError::Closed);
        assert!(err.to_string().contains("key exchange"));
        assert!(!err.is_authentication_failure());
    }
}
