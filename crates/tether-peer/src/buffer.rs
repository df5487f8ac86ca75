// ============================================
// File: crates/tether-peer/src/buffer.rs
// ============================================
//! # Framed Stream Buffers
//!
//! ## Creation Reason
//! Turns messages into sealed frames on the way out and frames back into
//! messages on the way in, over a transport that may move any number of
//! bytes per call.
//!
//! ## Main Functionality
//! - `OutBuffer`: seals a message once, then drains the ciphertext to
//!   the transport across as many partial writes as it takes
//! - `InBuffer`: accumulates bytes until a whole frame is present, then
//!   authenticates and decrypts it
//!
//! ## Frame Format
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ sealed_len   │ ciphertext ‖ 16-byte tag    │
//! │ u32 LE       │ sealed_len bytes            │
//! └──────────────┴─────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Both `flush` and `next_frame` are cancel safe: all progress lives in
//!   the buffers, never in the future
//! - A message is encrypted exactly once; retrying after a partial write
//!   resends the same ciphertext
//!
//! ## Last Modified
//! v0.1.0 - Initial framed stream

use bytes::{Buf, BytesMut};
use tracing::trace;

use tether_core::crypto::{OpeningKey, SealingKey, POLY1305_TAG_SIZE};
use tether_core::error::CoreError;
use tether_core::protocol::{FrameHeader, ProtocolCodec, FRAME_HEADER_SIZE};
use tether_transport::{Transport, TransportError};

use crate::error::{PeerError, Result};

/// Bytes requested from the transport per read.
const READ_CHUNK: usize = 16 * 1024;

// ============================================
// OutBuffer
// ============================================

/// Outbound half of an authenticated stream.
pub struct OutBuffer {
    sealing: SealingKey,
    pending: BytesMut,
    max_frame_size: usize,
}

impl OutBuffer {
    /// Creates an empty outbound buffer.
    #[must_use]
    pub fn new(sealing: SealingKey, max_frame_size: usize) -> Self {
        Self {
            sealing,
            pending: BytesMut::new(),
            max_frame_size,
        }
    }

    /// Seals `message` into a frame queued behind any pending bytes.
    ///
    /// Returns the counter the frame used.
    ///
    /// # Errors
    /// `FrameTooLarge` (nothing consumed) or `NonceSpaceExhausted`.
    pub fn push(&mut self, message: &[u8]) -> Result<u64> {
        if message.len() > self.max_frame_size {
            return Err(PeerError::FrameTooLarge {
                max: self.max_frame_size,
                actual: message.len(),
            });
        }
        let counter = self.sealing.seal_frame(message, &mut self.pending)?;
        trace!(counter, len = message.len(), "Sealed frame");
        Ok(counter)
    }

    /// Writes all pending bytes to `transport`.
    ///
    /// # Errors
    /// `TransportIo` if the transport fails or stops accepting bytes.
    pub async fn flush<T>(&mut self, transport: &mut T) -> Result<()>
    where
        T: Transport + ?Sized,
    {
        while !self.pending.is_empty() {
            let n = transport
                .send(&self.pending)
                .await
                .map_err(PeerError::TransportIo)?;
            if n == 0 {
                return Err(PeerError::TransportIo(TransportError::SendFailed {
                    reason: "transport accepted zero bytes".into(),
                }));
            }
            self.pending.advance(n);
        }
        transport.flush().await.map_err(PeerError::TransportIo)
    }

    /// Bytes sealed but not yet written.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Next send counter.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.sealing.counter()
    }
}

// ============================================
// InBuffer
// ============================================

/// Inbound half of an authenticated stream.
pub struct InBuffer {
    opening: OpeningKey,
    buffered: BytesMut,
    scratch: Box<[u8]>,
    max_frame_size: usize,
}

impl InBuffer {
    /// Creates an empty inbound buffer.
    #[must_use]
    pub fn new(opening: OpeningKey, max_frame_size: usize) -> Self {
        Self {
            opening,
            buffered: BytesMut::new(),
            scratch: vec![0u8; READ_CHUNK].into_boxed_slice(),
            max_frame_size,
        }
    }

    /// Reads until one frame is complete and returns its plaintext.
    ///
    /// `Ok(None)` means the peer closed the stream cleanly on a frame
    /// boundary.
    ///
    /// # Errors
    /// - `MalformedFrame` for an impossible length or a stream that ends
    ///   mid-frame
    /// - `AuthenticationTagInvalid` for a tampered, replayed or reordered
    ///   frame
    /// - `NonceSpaceExhausted`, `TransportIo`
    pub async fn next_frame<T>(&mut self, transport: &mut T) -> Result<Option<Vec<u8>>>
    where
        T: Transport + ?Sized,
    {
        loop {
            if let Some(plaintext) = self.try_open()? {
                return Ok(Some(plaintext));
            }

            let n = transport
                .recv(&mut self.scratch)
                .await
                .map_err(PeerError::TransportIo)?;
            if n == 0 {
                if self.buffered.is_empty() {
                    return Ok(None);
                }
                return Err(PeerError::malformed_frame(format!(
                    "stream ended with {} bytes of a partial frame",
                    self.buffered.len()
                )));
            }
            self.buffered.extend_from_slice(&self.scratch[..n]);
        }
    }

    fn try_open(&mut self) -> Result<Option<Vec<u8>>> {
        let max_sealed = self.max_frame_size.saturating_add(POLY1305_TAG_SIZE);
        let total = match ProtocolCodec::check_complete(&self.buffered, max_sealed) {
            Ok(Some(total)) => total,
            Ok(None) => return Ok(None),
            Err(CoreError::MessageTooLarge { max, actual }) => {
                return Err(PeerError::malformed_frame(format!(
                    "frame body of {actual} bytes exceeds limit of {max}"
                )));
            }
            Err(e) => return Err(PeerError::malformed_frame(e.to_string())),
        };

        let frame = self.buffered.split_to(total);
        let mut raw = [0u8; FRAME_HEADER_SIZE];
        raw.copy_from_slice(&frame[..FRAME_HEADER_SIZE]);
        let header = FrameHeader::from_bytes(raw);

        let counter = self.opening.counter();
        let plaintext = self
            .opening
            .open_frame(&header, &frame[FRAME_HEADER_SIZE..])?;
        trace!(counter, len = plaintext.len(), "Opened frame");
        Ok(Some(plaintext))
    }

    /// Next expected receive counter.
    #[must_use]
    pub const fn counter(&self) -> u64 {
        self.opening.counter()
    }
}

impl std::fmt::Debug for OutBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutBuffer")
            .field("counter", &self.counter())
            .field("pending", &self.pending.len())
            .field("max_frame_size", &self.max_frame_size)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for InBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InBuffer")
            .field("counter", &self.counter())
            .field("buffered", &self.buffered.len())
            .field("max_frame_size", &self.max_frame_size)
            .finish_non_exhaustive()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::crypto::SessionKeys;
    use tether_core::protocol::FRAME_OVERHEAD;
    use tether_transport::MockTransport;

    const MAX: usize = 1024;

    fn buffers() -> (OutBuffer, InBuffer, OutBuffer, InBuffer) {
        let (a, b) = SessionKeys::pair_for_testing();
        let (a_seal, a_open) = a.split();
        let (b_seal, b_open) = b.split();
        (
            OutBuffer::new(a_seal, MAX),
            InBuffer::new(a_open, MAX),
            OutBuffer::new(b_seal, MAX),
            InBuffer::new(b_open, MAX),
        )
    }

    #[tokio::test]
    async fn test_frames_in_order() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();

        for msg in [&b"first"[..], &b""[..], &b"third"[..]] {
            a_out.push(msg).unwrap();
        }
        a_out.flush(&mut a_io).await.unwrap();
        assert_eq!(a_out.pending_len(), 0);
        assert_eq!(a_out.counter(), 3);

        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"first");
        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"");
        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"third");
        assert_eq!(b_in.counter(), 3);
    }

    #[tokio::test]
    async fn test_partial_io_in_both_directions() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (a_io, b_io) = MockTransport::pair();
        let mut a_io = a_io.with_max_chunk(3);
        let mut b_io = b_io.with_max_chunk(5);

        let message = vec![0x5Au8; 200];
        a_out.push(&message).unwrap();
        a_out.flush(&mut a_io).await.unwrap();

        let received = b_in.next_frame(&mut b_io).await.unwrap().unwrap();
        assert_eq!(received, message);
        assert_eq!(a_io.handle().bytes_sent(), (200 + FRAME_OVERHEAD) as u64);
    }

    #[tokio::test]
    async fn test_cancelled_flush_resumes_without_resealing() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (a_io, mut b_io) = MockTransport::pair();
        let mut a_io = a_io.with_max_chunk(1);
        let handle = a_io.handle();

        a_out.push(b"resumable").unwrap();
        handle.fail_sends(true);
        assert!(matches!(
            a_out.flush(&mut a_io).await,
            Err(PeerError::TransportIo(_))
        ));
        assert_eq!(a_out.pending_len(), 9 + FRAME_OVERHEAD);

        handle.fail_sends(false);
        a_out.flush(&mut a_io).await.unwrap();
        assert_eq!(a_out.counter(), 1);
        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"resumable");
    }

    #[tokio::test]
    async fn test_oversize_message_consumes_nothing() {
        let (mut a_out, ..) = buffers();
        let big = vec![0u8; MAX + 1];

        assert!(matches!(
            a_out.push(&big),
            Err(PeerError::FrameTooLarge { max: MAX, actual }) if actual == MAX + 1
        ));
        assert_eq!(a_out.counter(), 0);
        assert_eq!(a_out.pending_len(), 0);

        a_out.push(&big[..MAX]).unwrap();
        assert_eq!(a_out.counter(), 1);
    }

    #[tokio::test]
    async fn test_tampered_frame_rejected() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();

        a_out.push(b"integrity").unwrap();
        a_out.flush(&mut a_io).await.unwrap();

        let mut wire = a_io.handle().take_outbound();
        let last = wire.len() - 1;
        wire[last] ^= 0x01;
        b_io.handle().inject_inbound(&wire);

        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::AuthenticationTagInvalid)
        ));
        assert_eq!(b_in.counter(), 0);
    }

    #[tokio::test]
    async fn test_replayed_frame_rejected() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();

        a_out.push(b"once").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        let wire = a_io.handle().take_outbound();

        let b_handle = b_io.handle();
        b_handle.inject_inbound(&wire);
        b_handle.inject_inbound(&wire);

        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"once");
        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::AuthenticationTagInvalid)
        ));
    }

    #[tokio::test]
    async fn test_reordered_frames_rejected() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();
        let a_handle = a_io.handle();

        a_out.push(b"one").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        let first = a_handle.take_outbound();
        a_out.push(b"two").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        let second = a_handle.take_outbound();

        b_io.handle().inject_inbound(&second);
        b_io.handle().inject_inbound(&first);
        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::AuthenticationTagInvalid)
        ));
    }

    #[tokio::test]
    async fn test_length_prefix_limits() {
        let (_, _, _, mut b_in) = buffers();
        let (_a_io, mut b_io) = MockTransport::pair();

        // Body too short to carry a tag
        b_io.handle().inject_inbound(&15u32.to_le_bytes());
        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::MalformedFrame { .. })
        ));

        let (_, _, _, mut b_in) = buffers();
        let (_a_io, mut b_io) = MockTransport::pair();
        let too_big = u32::try_from(MAX + POLY1305_TAG_SIZE + 1).unwrap();
        b_io.handle().inject_inbound(&too_big.to_le_bytes());
        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::MalformedFrame { .. })
        ));
    }

    #[tokio::test]
    async fn test_unbounded_frame_limit_does_not_overflow() {
        let (a, b) = SessionKeys::pair_for_testing();
        let (a_seal, _) = a.split();
        let (_, b_open) = b.split();
        let mut a_out = OutBuffer::new(a_seal, usize::MAX);
        let mut b_in = InBuffer::new(b_open, usize::MAX);
        let (mut a_io, mut b_io) = MockTransport::pair();

        a_out.push(b"no ceiling").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"no ceiling");
    }

    #[tokio::test]
    async fn test_eof_between_and_inside_frames() {
        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();

        a_out.push(b"bye").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        drop(a_io);

        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"bye");
        assert!(b_in.next_frame(&mut b_io).await.unwrap().is_none());

        let (mut a_out, _, _, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();
        a_out.push(b"truncated").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        let mut wire = a_io.handle().take_outbound();
        wire.truncate(wire.len() - 4);
        b_io.handle().inject_inbound(&wire);
        drop(a_io);

        assert!(matches!(
            b_in.next_frame(&mut b_io).await,
            Err(PeerError::MalformedFrame { .. })
        ));
    }

    #[tokio::test]
    async fn test_directions_are_independent() {
        let (mut a_out, mut a_in, mut b_out, mut b_in) = buffers();
        let (mut a_io, mut b_io) = MockTransport::pair();

        a_out.push(b"ping").unwrap();
        a_out.flush(&mut a_io).await.unwrap();
        b_out.push(b"pong").unwrap();
        b_out.flush(&mut b_io).await.unwrap();

        assert_eq!(b_in.next_frame(&mut b_io).await.unwrap().unwrap(), b"ping");
        assert_eq!(a_in.next_frame(&mut a_io).await.unwrap().unwrap(), b"pong");
    }
}
