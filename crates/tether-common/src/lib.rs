// ============================================
// File: crates/tether-common/src/lib.rs
// ============================================
//! # Tether Common - Shared Utilities Library
//!
//! ## Creation Reason
//! Provides foundational types shared by every Tether crate: the common
//! error type, zeroizing secret buffers, and connection identifiers.
//!
//! ## Main Functionality
//! - [`error`]: Common error types and result aliases
//! - [`secret`]: `SecretBytes<N>`, owned key material that is wiped on drop
//! - [`types`]: `ConnectionId` used to correlate log lines per session
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 tether-peer                         │
//! │                    │                                │
//! │         ┌──────────┴──────────┐                     │
//! │         ▼                     ▼                     │
//! │   tether-core          tether-transport             │
//! │         │                     │                     │
//! │         └──────────┬──────────┘                     │
//! │                    ▼                                │
//! │             tether-common  ◄── You are here         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - This crate is the foundation - changes affect everything
//! - Keep dependencies minimal
//! - Anything holding key material goes through `SecretBytes`
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod secret;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{CommonError, Result};
pub use secret::SecretBytes;
pub use types::ConnectionId;
