// ============================================
// File: crates/tether-transport/src/lib.rs
// ============================================
//! # Tether Transport - Byte-Stream I/O Layer
//!
//! ## Creation Reason
//! Provides the byte-stream abstraction the secure channel runs over,
//! with a TCP implementation for real networks and an in-memory one for
//! tests.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`traits`]: `Transport` trait definition
//! - [`tcp`]: TCP connect/accept via Tokio and socket2
//! - `mock`: in-memory pipes (feature `mock`)
//! - [`error`]: Transport-specific error types
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 tether-peer                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   tether-core          tether-transport             │
//! │                        You are here ◄──             │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             tether-common                           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Always use the trait for testability
//! - Mock implementations available with `mock` feature
//!
//! ## Last Modified
//! v0.1.0 - Initial transport layer implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod tcp;
pub mod traits;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export primary types
pub use error::{Result, TransportError};
pub use tcp::{TcpAcceptor, TcpTransport};
pub use traits::Transport;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockHandle, MockTransport};
