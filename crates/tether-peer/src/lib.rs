// ============================================
// File: crates/tether-peer/src/lib.rs
// ============================================
//! # Tether Peer
//!
//! ## Creation Reason
//! Puts the core cryptography and a byte-stream transport together into
//! a session object an application can use: connect or accept, run the
//! mutual handshake, then exchange encrypted messages.
//!
//! ## Main Functionality
//!
//! ### Modules
//! - [`peer`]: `Peer`, the public session object
//! - [`authenticator`]: handshake state machine
//! - [`buffer`]: framed, encrypted stream halves
//! - [`config`]: TOML configuration for the `tether` binary
//! - [`services`]: key-stash and known-keys files
//! - [`error`]: peer error types
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                        Peer                             │
//! │  ┌───────────────┐        ┌───────────────────────────┐ │
//! │  │ Authenticator │──keys─►│  OutBuffer  │  InBuffer   │ │
//! │  └───────┬───────┘        └──────┬──────┴──────┬──────┘ │
//! │          │   handshake records   │   frames    │        │
//! │          └───────────────┬───────┴─────────────┘        │
//! │                          ▼                              │
//! │                  Transport (TCP / mock)                 │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - A `Peer` is driven by a single task; wrap it yourself if you need
//!   concurrent senders
//! - Timeouts are the host's job; drop the `Peer` after one fires
//!
//! ## Last Modified
//! v0.1.0 - Initial peer library

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod authenticator;
pub mod buffer;
pub mod config;
pub mod error;
pub mod peer;
pub mod services;

// Re-export primary types
pub use authenticator::{AuthOutcome, AuthState, Authenticator};
pub use buffer::{InBuffer, OutBuffer};
pub use config::PeerConfig;
pub use error::{PeerError, Result};
pub use peer::{Peer, PeerOptions, PeerState};
pub use services::{KeyStash, KnownKeys};
