// ============================================
// File: crates/tether-core/src/protocol/mod.rs
// ============================================
//! # Protocol Module
//!
//! ## Creation Reason
//! Defines the wire layout of the Tether channel: the fixed-size
//! handshake records and the length-prefixed encrypted frames.
//!
//! ### Submodules
//! - [`messages`]: Record sizes and the frame header
//! - [`codec`]: Binary encoding/decoding
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Handshake Phase                          │
//! │                                                             │
//! │  Client ────────────── KX public (32) ─────────────► Server │
//! │  Client ◄───────────── KX public (32) ────────────── Server │
//! │  Client ────────────── challenge (32) ─────────────► Server │
//! │  Client ◄───────────── challenge (32) ────────────── Server │
//! │  Client ────────────── response (96) ──────────────► Server │
//! │  Client ◄───────────── response (96) ─────────────── Server │
//! │                                                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    Transport Phase                          │
//! │                                                             │
//! │  Client ══════ [len u32 LE][ciphertext ‖ tag] ══════ Server │
//! │                                                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Wire Format Principles
//! - Little-endian byte order for multi-byte integers
//! - No type tags; each step's record type is implied by position
//!
//! ## Last Modified
//! v0.1.0 - Initial protocol definitions

pub mod codec;
pub mod messages;

pub use codec::{Codec, ProtocolCodec};
pub use messages::{
    FrameHeader, DEFAULT_MAX_FRAME_PLAINTEXT, FRAME_HEADER_SIZE, FRAME_OVERHEAD,
};
