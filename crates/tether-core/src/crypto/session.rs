// ============================================
// File: crates/tether-core/src/crypto/session.rs
// ============================================
//! # Session Keys
//!
//! ## Creation Reason
//! Holds the directional record keys of an authenticated connection
//! together with their nonce counters, and turns plaintext into frames
//! and frames back into plaintext.
//!
//! ## Main Functionality
//! - `NonceCounter`: monotonic per-direction counter, refuses to wrap
//! - `SealingKey`: outbound key + send counter
//! - `OpeningKey`: inbound key + receive counter
//! - `SessionKeys`: both halves; obtainable only with a `VerifiedIdentity`
//!
//! ## Counter Rules
//! ```text
//! seal: counter consumed as soon as the frame is encrypted
//! open: counter advanced only after the tag verified
//! u64::MAX is never used as a nonce; reaching it is NonceSpaceExhausted
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - `from_raw_keys` exists for tests only (feature `testing`)
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use bytes::{BufMut, BytesMut};

use tether_common::SecretBytes;

use super::challenge::VerifiedIdentity;
use super::kx::DirectionalSecrets;
use super::transport::{open, seal};
use super::SESSION_KEY_SIZE;
use crate::error::{CoreError, Result};
use crate::protocol::messages::FrameHeader;

// ============================================
// NonceCounter
// ============================================

/// Monotonic per-direction nonce counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonceCounter(u64);

impl NonceCounter {
    /// Counter starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// The next value that would be used.
    #[must_use]
    pub const fn value(&self) -> u64 {
        self.0
    }

    /// Returns `true` once no further value may be used.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.0 == u64::MAX
    }

    /// Takes the current value and advances.
    ///
    /// # Errors
    /// `NonceSpaceExhausted` when the counter has reached its limit.
    pub fn reserve(&mut self) -> Result<u64> {
        if self.is_exhausted() {
            return Err(CoreError::NonceSpaceExhausted);
        }
        let current = self.0;
        self.0 += 1;
        Ok(current)
    }
}

// ============================================
// SealingKey
// ============================================

/// Outbound half of a session.
#[derive(Debug)]
pub struct SealingKey {
    key: SecretBytes<SESSION_KEY_SIZE>,
    counter: NonceCounter,
}

impl SealingKey {
    /// Next send counter.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter.value()
    }

    /// Encrypts `plaintext` into a complete frame appended to `out`.
    ///
    /// Returns the counter the frame was sealed under. On error nothing
    /// is appended to `out`.
    ///
    /// # Errors
    /// `NonceSpaceExhausted`, `MessageTooLarge` if the frame length does
    /// not fit the header, or `Encryption`.
    pub fn seal_frame(&mut self, plaintext: &[u8], out: &mut BytesMut) -> Result<u64> {
        let header = FrameHeader::for_plaintext(plaintext.len())
            .ok_or_else(|| CoreError::too_large(u32::MAX as usize, plaintext.len()))?;
        let counter = self.counter.reserve()?;
        let sealed = seal(&self.key, counter, &header.to_bytes(), plaintext)?;

        out.reserve(header.to_bytes().len() + sealed.len());
        out.put_slice(&header.to_bytes());
        out.put_slice(&sealed);
        Ok(counter)
    }
}

// ============================================
// OpeningKey
// ============================================

/// Inbound half of a session.
#[derive(Debug)]
pub struct OpeningKey {
    key: SecretBytes<SESSION_KEY_SIZE>,
    counter: NonceCounter,
}

impl OpeningKey {
    /// Next expected receive counter.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.counter.value()
    }

    /// Authenticates and decrypts one frame body.
    ///
    /// The counter advances only when the tag verifies.
    ///
    /// # Errors
    /// `NonceSpaceExhausted` or `AuthenticationTagInvalid`.
    pub fn open_frame(&mut self, header: &FrameHeader, sealed: &[u8]) -> Result<Vec<u8>> {
        if self.counter.is_exhausted() {
            return Err(CoreError::NonceSpaceExhausted);
        }
        let plaintext = open(&self.key, self.counter.value(), &header.to_bytes(), sealed)?;
        self.counter.reserve()?;
        Ok(plaintext)
    }
}

// ============================================
// SessionKeys
// ============================================

/// Record keys of one authenticated connection.
#[derive(Debug)]
pub struct SessionKeys {
    sealing: SealingKey,
    opening: OpeningKey,
}

impl SessionKeys {
    /// Builds session keys once the peer has been verified.
    ///
    /// The `VerifiedIdentity` argument is the proof that authentication
    /// succeeded; it cannot be obtained any other way.
    #[must_use]
    pub fn establish(secrets: DirectionalSecrets, _peer: &VerifiedIdentity) -> Self {
        let (rx, tx) = secrets.into_parts();
        Self::from_secrets(rx, tx)
    }

    fn from_secrets(
        rx: SecretBytes<SESSION_KEY_SIZE>,
        tx: SecretBytes<SESSION_KEY_SIZE>,
    ) -> Self {
        Self {
            sealing: SealingKey {
                key: tx,
                counter: NonceCounter::new(),
            },
            opening: OpeningKey {
                key: rx,
                counter: NonceCounter::new(),
            },
        }
    }

    /// Next send counter.
    #[must_use]
    pub const fn send_counter(&self) -> u64 {
        self.sealing.counter()
    }

    /// Next expected receive counter.
    #[must_use]
    pub const fn recv_counter(&self) -> u64 {
        self.opening.counter()
    }

    /// Splits into outbound and inbound halves.
    #[must_use]
    pub fn split(self) -> (SealingKey, OpeningKey) {
        (self.sealing, self.opening)
    }

    /// Builds a matching `(a, b)` pair where `a` seals for `b` and
    /// vice versa, without running a handshake.
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn pair_for_testing() -> (Self, Self) {
        let a_to_b = SecretBytes::<SESSION_KEY_SIZE>::random();
        let b_to_a = SecretBytes::<SESSION_KEY_SIZE>::random();
        let a = Self::from_secrets(
            SecretBytes::new(*b_to_a.expose()),
            SecretBytes::new(*a_to_b.expose()),
        );
        let b = Self::from_secrets(a_to_b, b_to_a);
        (a, b)
    }

    /// Builds keys from raw bytes, without a handshake.
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn from_raw_keys(rx: [u8; SESSION_KEY_SIZE], tx: [u8; SESSION_KEY_SIZE]) -> Self {
        Self::from_secrets(SecretBytes::new(rx), SecretBytes::new(tx))
    }

    /// Overrides both counters.
    #[cfg(any(test, feature = "testing"))]
    #[must_use]
    pub fn with_counters(mut self, send: u64, recv: u64) -> Self {
        self.sealing.counter = NonceCounter(send);
        self.opening.counter = NonceCounter(recv);
        self
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::FRAME_HEADER_SIZE;

    fn parse(frame: &[u8]) -> (FrameHeader, &[u8]) {
        let mut raw = [0u8; FRAME_HEADER_SIZE];
        raw.copy_from_slice(&frame[..FRAME_HEADER_SIZE]);
        (FrameHeader::from_bytes(raw), &frame[FRAME_HEADER_SIZE..])
    }

    #[test]
    fn test_counter_reserve() {
        let mut counter = NonceCounter::new();
        assert_eq!(counter.reserve().unwrap(), 0);
        assert_eq!(counter.reserve().unwrap(), 1);
        assert_eq!(counter.value(), 2);

        let mut counter = NonceCounter(u64::MAX - 1);
        assert_eq!(counter.reserve().unwrap(), u64::MAX - 1);
        assert!(counter.is_exhausted());
        assert!(matches!(
            counter.reserve(),
            Err(CoreError::NonceSpaceExhausted)
        ));
    }

    #[test]
    fn test_frames_in_order() {
        let (a, b) = SessionKeys::pair_for_testing();
        let (mut seal_a, _) = a.split();
        let (_, mut open_b) = b.split();

        for msg in [&b"one"[..], &b"two"[..], &b""[..]] {
            let mut out = BytesMut::new();
            seal_a.seal_frame(msg, &mut out).unwrap();
            let (header, body) = parse(&out);
            assert_eq!(open_b.open_frame(&header, body).unwrap(), msg);
        }
        assert_eq!(seal_a.counter(), 3);
        assert_eq!(open_b.counter(), 3);
    }

    #[test]
    fn test_replay_rejected_and_counter_kept() {
        let (a, b) = SessionKeys::pair_for_testing();
        let (mut seal_a, _) = a.split();
        let (_, mut open_b) = b.split();

        let mut first = BytesMut::new();
        seal_a.seal_frame(b"first", &mut first).unwrap();
        let (header, body) = parse(&first);
        open_b.open_frame(&header, body).unwrap();

        assert!(matches!(
            open_b.open_frame(&header, body),
            Err(CoreError::AuthenticationTagInvalid)
        ));
        assert_eq!(open_b.counter(), 1);
    }

    #[test]
    fn test_every_single_bit_flip_rejected() {
        let (a, b) = SessionKeys::pair_for_testing();
        let (mut seal_a, _) = a.split();
        let (_, mut open_b) = b.split();

        let mut frame = BytesMut::new();
        seal_a.seal_frame(b"flip me", &mut frame).unwrap();

        // Header (the AAD), ciphertext and tag alike
        for bit in 0..frame.len() * 8 {
            let mut tampered = frame.to_vec();
            tampered[bit / 8] ^= 1 << (bit % 8);
            let (header, body) = parse(&tampered);
            assert!(
                matches!(
                    open_b.open_frame(&header, body),
                    Err(CoreError::AuthenticationTagInvalid)
                ),
                "bit {bit} was not detected"
            );
            assert_eq!(open_b.counter(), 0);
        }

        let (header, body) = parse(&frame);
        assert_eq!(open_b.open_frame(&header, body).unwrap(), b"flip me");
    }

    #[test]
    fn test_reordering_rejected() {
        let (a, b) = SessionKeys::pair_for_testing();
        let (mut seal_a, _) = a.split();
        let (_, mut open_b) = b.split();

        let mut f0 = BytesMut::new();
        let mut f1 = BytesMut::new();
        seal_a.seal_frame(b"zero", &mut f0).unwrap();
        seal_a.seal_frame(b"one", &mut f1).unwrap();

        let (h1, b1) = parse(&f1);
        assert!(open_b.open_frame(&h1, b1).is_err());
        let (h0, b0) = parse(&f0);
        assert_eq!(open_b.open_frame(&h0, b0).unwrap(), b"zero");
    }

    #[test]
    fn test_own_frames_do_not_open_locally() {
        let (a, _) = SessionKeys::pair_for_testing();
        let (mut seal_a, mut open_a) = a.split();

        let mut out = BytesMut::new();
        seal_a.seal_frame(b"loop", &mut out).unwrap();
        let (header, body) = parse(&out);
        assert!(open_a.open_frame(&header, body).is_err());
    }

    #[test]
    fn test_send_exhaustion() {
        let keys = SessionKeys::from_raw_keys([1; 32], [2; 32]).with_counters(u64::MAX, 0);
        let (mut sealing, _) = keys.split();
        let mut out = BytesMut::new();
        assert!(matches!(
            sealing.seal_frame(b"x", &mut out),
            Err(CoreError::NonceSpaceExhausted)
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_raw_keys_cross_match() {
        let a = SessionKeys::from_raw_keys([1; 32], [2; 32]);
        let b = SessionKeys::from_raw_keys([2; 32], [1; 32]);
        let (mut seal_a, _) = a.split();
        let (_, mut open_b) = b.split();

        let mut out = BytesMut::new();
        seal_a.seal_frame(b"hi", &mut out).unwrap();
        let (header, body) = parse(&out);
        assert_eq!(open_b.open_frame(&header, body).unwrap(), b"hi");
    }
}
