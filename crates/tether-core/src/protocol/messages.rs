// ============================================
// File: crates/tether-core/src/protocol/messages.rs
// ============================================
//! # Wire Records
//!
//! ## Main Functionality
//! - Sizes of the fixed-length handshake records
//! - `FrameHeader`: length prefix of a transport frame
//!
//! ## Handshake Records
//! | Record | Size (bytes) | Layout |
//! |--------|--------------|--------|
//! | KX public key | 32 | X25519 u-coordinate |
//! | Challenge | 32 | random nonce |
//! | Challenge response | 96 | Ed25519 public key ‖ signature |
//!
//! ## Transport Frame
//! ```text
//! ┌──────────────────────┬───────────────────────────────────┐
//! │ length (u32 LE)      │ ciphertext ‖ Poly1305 tag         │
//! │ 4 bytes              │ `length` bytes                    │
//! └──────────────────────┴───────────────────────────────────┘
//! ```
//! `length` counts ciphertext plus tag. The 4 header bytes are passed as
//! associated data, so the header is authenticated too.
//!
//! ## ⚠️ Important Note for Next Developer
//! - Field order is critical; any change is a wire break
//!
//! ## Last Modified
//! v0.1.0 - Initial record definitions

use crate::crypto::{
    CHALLENGE_NONCE_SIZE, ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE, POLY1305_TAG_SIZE,
    X25519_PUBLIC_KEY_SIZE,
};

// ============================================
// Record Sizes
// ============================================

/// Size of the key-exchange record.
pub const KX_RECORD_SIZE: usize = X25519_PUBLIC_KEY_SIZE;

/// Size of the challenge record.
pub const CHALLENGE_RECORD_SIZE: usize = CHALLENGE_NONCE_SIZE;

/// Size of the challenge response record.
pub const RESPONSE_RECORD_SIZE: usize = ED25519_PUBLIC_KEY_SIZE + ED25519_SIGNATURE_SIZE;

/// Size of the frame length prefix.
pub const FRAME_HEADER_SIZE: usize = 4;

/// Per-frame overhead beyond the plaintext.
pub const FRAME_OVERHEAD: usize = FRAME_HEADER_SIZE + POLY1305_TAG_SIZE;

/// Default cap on plaintext bytes per frame (1 MiB).
pub const DEFAULT_MAX_FRAME_PLAINTEXT: usize = 1024 * 1024;

// ============================================
// FrameHeader
// ============================================

/// Length prefix of a transport frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Ciphertext length including the tag.
    pub sealed_len: u32,
}

impl FrameHeader {
    /// Header for a frame carrying `plaintext_len` bytes.
    ///
    /// Returns `None` if the sealed length does not fit in a `u32`.
    #[must_use]
    pub fn for_plaintext(plaintext_len: usize) -> Option<Self> {
        plaintext_len
            .checked_add(POLY1305_TAG_SIZE)
            .and_then(|n| u32::try_from(n).ok())
            .map(|sealed_len| Self { sealed_len })
    }

    /// Sealed length as `usize`.
    #[must_use]
    pub fn sealed_len(&self) -> usize {
        self.sealed_len as usize
    }

    /// Header bytes, also used as AEAD associated data.
    #[must_use]
    pub const fn to_bytes(&self) -> [u8; FRAME_HEADER_SIZE] {
        self.sealed_len.to_le_bytes()
    }

    /// Parses header bytes.
    #[must_use]
    pub const fn from_bytes(bytes: [u8; FRAME_HEADER_SIZE]) -> Self {
        Self {
            sealed_len: u32::from_le_bytes(bytes),
        }
    }
}
