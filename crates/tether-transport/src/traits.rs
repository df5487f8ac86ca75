// ============================================
// File: crates/tether-transport/src/traits.rs
// ============================================
//! # Transport Traits
//!
//! ## Creation Reason
//! The secure channel only needs an ordered, reliable byte stream. This
//! trait is that contract, so the channel can run over TCP in production
//! and over in-memory pipes in tests.
//!
//! ## Main Functionality
//! - `Transport`: async byte-stream interface
//! - Default helpers `send_all` / `recv_exact`
//!
//! ## Design Philosophy
//! - Async-first design with `async_trait`
//! - `send`/`recv` may move fewer bytes than asked; callers loop
//!
//! ## ⚠️ Important Note for Next Developer
//! - Implementations must make `send` and `recv` cancel safe: if the
//!   future is dropped before completion, no bytes were consumed/written
//! - `send_all` and `recv_exact` are NOT cancel safe; cancellation-aware
//!   callers must loop on `send`/`recv` themselves with their own buffer
//!
//! ## Last Modified
//! v0.1.0 - Initial trait definitions

use std::net::SocketAddr;

use async_trait::async_trait;

use crate::error::{Result, TransportError};

// ============================================
// Transport Trait
// ============================================

/// Ordered, reliable, bidirectional byte stream.
///
/// # Example
/// ```ignore
/// async fn echo<T: Transport>(transport: &mut T) -> Result<()> {
///     let mut buf = [0u8; 1024];
///     loop {
///         let n = transport.recv(&mut buf).await?;
///         if n == 0 {
///             return Ok(());
///         }
///         transport.send_all(&buf[..n]).await?;
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send {
    /// Writes some prefix of `buf`, returning how many bytes were taken.
    ///
    /// # Errors
    /// `Closed` if the peer is gone, `SendFailed` on other failures.
    async fn send(&mut self, buf: &[u8]) -> Result<usize>;

    /// Reads into `buf`, returning the byte count. `Ok(0)` means the peer
    /// closed its sending side.
    ///
    /// # Errors
    /// `ReceiveFailed` on failure.
    async fn recv(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Flushes any buffered outbound bytes.
    ///
    /// # Errors
    /// As for `send`.
    async fn flush(&mut self) -> Result<()>;

    /// Closes the sending side; the peer will observe end-of-stream.
    ///
    /// # Errors
    /// Returns error if shutdown fails.
    async fn shutdown(&mut self) -> Result<()>;

    /// Address of the remote end, when there is one.
    fn peer_addr(&self) -> Option<SocketAddr>;

    /// Writes all of `buf`.
    ///
    /// # Errors
    /// As for `send`; `SendFailed` if the transport accepts zero bytes.
    async fn send_all(&mut self, buf: &[u8]) -> Result<()> {
        let mut remaining = buf;
        while !remaining.is_empty() {
            let n = self.send(remaining).await?;
            if n == 0 {
                return Err(TransportError::SendFailed {
                    reason: "transport accepted zero bytes".into(),
                });
            }
            remaining = &remaining[n..];
        }
        self.flush().await
    }

    /// Fills `buf` completely.
    ///
    /// # Errors
    /// `Closed` if the stream ends first.
    async fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.recv(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(TransportError::Closed);
            }
            filled += n;
        }
        Ok(())
    }
}
