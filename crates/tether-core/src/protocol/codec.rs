// ============================================
// File: crates/tether-core/src/protocol/codec.rs
// ============================================
//! # Protocol Codec
//!
//! ## Creation Reason
//! Binary encoding of handshake records and framing of the encrypted
//! stream.
//!
//! ## Main Functionality
//! - `Codec` trait: encode/decode of a fixed-size record type
//! - `ProtocolCodec`: implementation for KX keys, challenges, responses
//! - `ProtocolCodec::check_complete`: incremental frame boundary detection
//!
//! ## Parsing Strategy
//! 1. Handshake records have a fixed size; read exactly `WIRE_SIZE` bytes
//! 2. Frames: wait for the 4-byte header, validate the length against the
//!    configured cap, then wait for the body
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always validate buffer lengths before reading
//! - Frame lengths are attacker controlled; validate BEFORE allocating
//!
//! ## Last Modified
//! v0.1.0 - Initial codec implementation

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::crypto::{
    Challenge, ChallengeResponse, KxPublicKey, Signature, SigningPublicKey,
    CHALLENGE_NONCE_SIZE, ED25519_PUBLIC_KEY_SIZE, ED25519_SIGNATURE_SIZE, POLY1305_TAG_SIZE,
    X25519_PUBLIC_KEY_SIZE,
};
use crate::error::{CoreError, Result};
use crate::protocol::messages::{
    FrameHeader, CHALLENGE_RECORD_SIZE, FRAME_HEADER_SIZE, KX_RECORD_SIZE, RESPONSE_RECORD_SIZE,
};

// ============================================
// Codec Trait
// ============================================

/// Encoding and decoding of one fixed-size record type.
///
/// # Type Parameters
/// * `T` - The record type to encode/decode
pub trait Codec<T> {
    /// Exact encoded size of `T`.
    const WIRE_SIZE: usize;

    /// Appends the encoding of `msg` to `buf`.
    fn encode(&self, msg: &T, buf: &mut BytesMut);

    /// Decodes a record, consuming `WIRE_SIZE` bytes from `buf`.
    ///
    /// # Errors
    /// `MessageTooShort` if fewer than `WIRE_SIZE` bytes are available.
    fn decode(&self, buf: &mut Bytes) -> Result<T>;
}

// ============================================
// ProtocolCodec
// ============================================

/// Codec for every Tether wire record.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProtocolCodec;

impl ProtocolCodec {
    /// Creates a new protocol codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Checks whether `buf` starts with a complete frame.
    ///
    /// # Returns
    /// - `Ok(Some(len))` - complete frame of `len` bytes (header included)
    /// - `Ok(None)` - need more data
    /// - `Err(_)` - header announces an impossible or oversized body
    ///
    /// # Errors
    /// `MalformedMessage` if the body is shorter than a tag,
    /// `MessageTooLarge` if it exceeds `max_sealed_len`.
    pub fn check_complete(buf: &[u8], max_sealed_len: usize) -> Result<Option<usize>> {
        let Some(header) = buf.get(..FRAME_HEADER_SIZE) else {
            return Ok(None);
        };
        let mut raw = [0u8; FRAME_HEADER_SIZE];
        raw.copy_from_slice(header);
        let sealed_len = FrameHeader::from_bytes(raw).sealed_len();

        if sealed_len < POLY1305_TAG_SIZE {
            return Err(CoreError::malformed(format!(
                "frame body of {sealed_len} bytes cannot hold an authentication tag"
            )));
        }
        if sealed_len > max_sealed_len {
            return Err(CoreError::too_large(max_sealed_len, sealed_len));
        }

        let total = FRAME_HEADER_SIZE + sealed_len;
        Ok((buf.len() >= total).then_some(total))
    }
}

fn ensure_len(buf: &Bytes, expected: usize) -> Result<()> {
    if buf.len() < expected {
        return Err(CoreError::too_short(expected, buf.len()));
    }
    Ok(())
}

// ============================================
// KX Record
// ============================================

impl Codec<KxPublicKey> for ProtocolCodec {
    const WIRE_SIZE: usize = KX_RECORD_SIZE;

    fn encode(&self, msg: &KxPublicKey, buf: &mut BytesMut) {
        buf.put_slice(msg.as_bytes());
    }

    fn decode(&self, buf: &mut Bytes) -> Result<KxPublicKey> {
        ensure_len(buf, KX_RECORD_SIZE)?;
        let mut key = [0u8; X25519_PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut key);
        Ok(KxPublicKey::from_bytes(key))
    }
}

// ============================================
// Challenge Record
// ============================================

impl Codec<Challenge> for ProtocolCodec {
    const WIRE_SIZE: usize = CHALLENGE_RECORD_SIZE;

    fn encode(&self, msg: &Challenge, buf: &mut BytesMut) {
        buf.put_slice(msg.as_bytes());
    }

    fn decode(&self, buf: &mut Bytes) -> Result<Challenge> {
        ensure_len(buf, CHALLENGE_RECORD_SIZE)?;
        let mut nonce = [0u8; CHALLENGE_NONCE_SIZE];
        buf.copy_to_slice(&mut nonce);
        Ok(Challenge::from_bytes(nonce))
    }
}

// ============================================
// Response Record
// ============================================

impl Codec<ChallengeResponse> for ProtocolCodec {
    const WIRE_SIZE: usize = RESPONSE_RECORD_SIZE;

    fn encode(&self, msg: &ChallengeResponse, buf: &mut BytesMut) {
        buf.reserve(RESPONSE_RECORD_SIZE);
        buf.put_slice(msg.responder.as_bytes());
        buf.put_slice(msg.signature.as_bytes());
    }

    fn decode(&self, buf: &mut Bytes) -> Result<ChallengeResponse> {
        ensure_len(buf, RESPONSE_RECORD_SIZE)?;

        let mut responder = [0u8; ED25519_PUBLIC_KEY_SIZE];
        buf.copy_to_slice(&mut responder);

        let mut signature = [0u8; ED25519_SIGNATURE_SIZE];
        buf.copy_to_slice(&mut signature);

        Ok(ChallengeResponse {
            responder: SigningPublicKey::from_bytes(responder),
            signature: Signature::from_bytes(signature),
        })
    }
}

// ============================================
// Tests
// ============================================
