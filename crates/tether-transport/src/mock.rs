// ============================================
// File: crates/tether-transport/src/mock.rs
// ============================================
//! # Mock Transport Implementation
//!
//! ## Creation Reason
//! Provides an in-memory byte stream for testing the secure channel
//! without sockets, with knobs to force partial I/O and to tamper with
//! bytes in flight.
//!
//! ## Main Functionality
//! - `MockTransport::pair()`: two connected endpoints
//! - `with_max_chunk`: cap bytes moved per `send`/`recv`
//! - `MockHandle`: inspect and manipulate an endpoint from the test
//!
//! ## Usage in Tests
//! ```
//! use tether_transport::{MockTransport, Transport};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let (mut a, mut b) = MockTransport::pair();
//! a.send_all(b"ping").await.unwrap();
//!
//! let mut buf = [0u8; 4];
//! b.recv_exact(&mut buf).await.unwrap();
//! assert_eq!(&buf, b"ping");
//! # }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This is for testing only - do not use in production
//! - Dropping an endpoint acts like closing a socket: the other side
//!   reads end-of-stream and its sends fail with `Closed`
//!
//! ## Last Modified
//! v0.1.0 - Initial mock implementation

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::error::{Result, TransportError};
use crate::traits::Transport;

// ============================================
// Pipe
// ============================================

#[derive(Default)]
struct PipeState {
    data: VecDeque<u8>,
    /// Writer finished; reader sees EOF once `data` drains.
    write_closed: bool,
    /// Reader is gone; writes fail.
    read_closed: bool,
}

/// One direction of the in-memory stream.
#[derive(Default)]
struct Pipe {
    state: Mutex<PipeState>,
    notify: Notify,
}

impl Pipe {
    fn push(&self, bytes: &[u8]) {
        self.state.lock().data.extend(bytes.iter().copied());
        self.notify.notify_one();
    }

    fn close_write(&self) {
        self.state.lock().write_closed = true;
        self.notify.notify_one();
    }

    fn close_read(&self) {
        self.state.lock().read_closed = true;
    }
}

// ============================================
// MockTransport
// ============================================

#[derive(Default)]
struct Counters {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    fail_sends: AtomicBool,
}

/// In-memory [`Transport`] endpoint.
pub struct MockTransport {
    inbound: Arc<Pipe>,
    outbound: Arc<Pipe>,
    counters: Arc<Counters>,
    max_chunk: usize,
}

impl MockTransport {
    /// Creates two connected endpoints.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        let a_to_b = Arc::new(Pipe::default());
        let b_to_a = Arc::new(Pipe::default());
        let a = Self {
            inbound: Arc::clone(&b_to_a),
            outbound: Arc::clone(&a_to_b),
            counters: Arc::default(),
            max_chunk: usize::MAX,
        };
        let b = Self {
            inbound: a_to_b,
            outbound: b_to_a,
            counters: Arc::default(),
            max_chunk: usize::MAX,
        };
        (a, b)
    }

    /// Limits every `send`/`recv` to at most `max_chunk` bytes.
    ///
    /// # Panics
    /// Panics if `max_chunk` is zero.
    #[must_use]
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        assert!(max_chunk > 0, "max_chunk must be positive");
        self.max_chunk = max_chunk;
        self
    }

    /// Returns a handle for inspecting this endpoint.
    #[must_use]
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            inbound: Arc::clone(&self.inbound),
            outbound: Arc::clone(&self.outbound),
            counters: Arc::clone(&self.counters),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, buf: &[u8]) -> Result<usize> {
        if self.counters.fail_sends.load(Ordering::Acquire) {
            return Err(TransportError::SendFailed {
                reason: "injected send failure".into(),
            });
        }

        let n = buf.len().min(self.max_chunk);
        {
            let mut state = self.outbound.state.lock();
            if state.write_closed {
                return Err(TransportError::ShuttingDown);
            }
            if state.read_closed {
                return Err(TransportError::Closed);
            }
            state.data.extend(buf[..n].iter().copied());
        }
        self.outbound.notify.notify_one();
        self.counters.bytes_sent.fetch_add(n as u64, Ordering::AcqRel);
        Ok(n)
    }

    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            {
                let mut state = self.inbound.state.lock();
                if !state.data.is_empty() {
                    let n = buf.len().min(self.max_chunk).min(state.data.len());
                    for (slot, byte) in buf.iter_mut().zip(state.data.drain(..n)) {
                        *slot = byte;
                    }
                    self.counters
                        .bytes_received
                        .fetch_add(n as u64, Ordering::AcqRel);
                    return Ok(n);
                }
                if state.write_closed {
                    return Ok(0);
                }
            }

            // Wait for bytes or end-of-stream
            self.inbound.notify.notified().await;
        }
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.outbound.close_write();
        Ok(())
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        None
    }
}

impl Drop for MockTransport {
    fn drop(&mut self) {
        self.outbound.close_write();
        self.inbound.close_read();
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("max_chunk", &self.max_chunk)
            .field("bytes_sent", &self.counters.bytes_sent.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

// ============================================
// MockHandle
// ============================================

/// Test-side view of one `MockTransport` endpoint.
#[derive(Clone)]
pub struct MockHandle {
    inbound: Arc<Pipe>,
    outbound: Arc<Pipe>,
    counters: Arc<Counters>,
}

impl MockHandle {
    /// Total bytes this endpoint has written.
    #[must_use]
    pub fn bytes_sent(&self) -> u64 {
        self.counters.bytes_sent.load(Ordering::Acquire)
    }

    /// Total bytes this endpoint has read.
    #[must_use]
    pub fn bytes_received(&self) -> u64 {
        self.counters.bytes_received.load(Ordering::Acquire)
    }

    /// Removes and returns bytes written but not yet read by the peer.
    #[must_use]
    pub fn take_outbound(&self) -> Vec<u8> {
        self.outbound.state.lock().data.drain(..).collect()
    }

    /// Number of bytes written but not yet read by the peer.
    #[must_use]
    pub fn pending_outbound(&self) -> usize {
        self.outbound.state.lock().data.len()
    }

    /// Makes `bytes` readable by this endpoint as if the peer sent them.
    pub fn inject_inbound(&self, bytes: &[u8]) {
        self.inbound.push(bytes);
    }

    /// Makes subsequent sends fail with `SendFailed`.
    pub fn fail_sends(&self, fail: bool) {
        self.counters.fail_sends.store(fail, Ordering::Release);
    }
}

impl std::fmt::Debug for MockHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockHandle")
            .field("bytes_sent", &self.bytes_sent())
            .field("pending_outbound", &self.pending_outbound())
            .finish()
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pair_roundtrip() {
        let (mut a, mut b) = MockTransport::pair();

        a.send_all(b"hello").await.unwrap();
        let mut buf = [0u8; 5];
        b.recv_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"hello");

        b.send_all(b"back").await.unwrap();
        let mut buf = [0u8; 4];
        a.recv_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"back");
    }

    #[tokio::test]
    async fn test_max_chunk_limits_io() {
        let (a, b) = MockTransport::pair();
        let mut a = a.with_max_chunk(3);
        let mut b = b.with_max_chunk(2);

        assert_eq!(a.send(b"abcdefg").await.unwrap(), 3);
        a.send_all(b"defg").await.unwrap();

        let mut buf = [0u8; 7];
        let first = b.recv(&mut buf).await.unwrap();
        assert_eq!(first, 2);
        b.recv_exact(&mut buf[first..]).await.unwrap();
        assert_eq!(&buf, b"abcdefg");

        let handle = a.handle();
        assert_eq!(handle.bytes_sent(), 7);
    }

    #[tokio::test]
    async fn test_recv_waits_for_data() {
        let (mut a, mut b) = MockTransport::pair();

        let reader = tokio::spawn(async move {
            let mut buf = [0u8; 3];
            b.recv_exact(&mut buf).await.unwrap();
            buf
        });
        tokio::task::yield_now().await;
        a.send_all(b"xyz").await.unwrap();

        assert_eq!(&reader.await.unwrap(), b"xyz");
    }

    #[tokio::test]
    async fn test_drop_signals_eof_and_closed() {
        let (a, mut b) = MockTransport::pair();
        drop(a);

        let mut buf = [0u8; 8];
        assert_eq!(b.recv(&mut buf).await.unwrap(), 0);
        assert!(matches!(b.send(b"x").await, Err(TransportError::Closed)));
    }

    #[tokio::test]
    async fn test_shutdown_drains_then_eof() {
        let (mut a, mut b) = MockTransport::pair();
        a.send_all(b"last").await.unwrap();
        a.shutdown().await.unwrap();

        let mut buf = [0u8; 4];
        b.recv_exact(&mut buf).await.unwrap();
        assert_eq!(b.recv(&mut buf).await.unwrap(), 0);
        assert!(matches!(a.send(b"x").await, Err(TransportError::ShuttingDown)));
    }

    #[tokio::test]
    async fn test_handle_intercept_and_inject() {
        let (mut a, mut b) = MockTransport::pair();
        let a_handle = a.handle();
        let b_handle = b.handle();

        a.send_all(b"abc").await.unwrap();
        let mut captured = a_handle.take_outbound();
        assert_eq!(captured, b"abc");
        captured[0] = b'X';
        b_handle.inject_inbound(&captured);

        let mut buf = [0u8; 3];
        b.recv_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"Xbc");
    }

    #[tokio::test]
    async fn test_injected_send_failure() {
        let (mut a, _b) = MockTransport::pair();
        a.handle().fail_sends(true);
        assert!(matches!(
            a.send(b"x").await,
            Err(TransportError::SendFailed { .. })
        ));
    }
}
