// ============================================
// File: crates/tether-common/src/types.rs
// ============================================
//! # Core Type Definitions
//!
//! ## Main Functionality
//! - `ConnectionId`: random per-connection tag used as a tracing field so
//!   handshake and frame logs of one session can be grouped
//!
//! ## ⚠️ Important Note for Next Developer
//! - `ConnectionId` is NOT sent on the wire and carries no security
//!   meaning; never use it for authorization decisions
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use rand::RngCore;

// ============================================
// Constants
// ============================================

/// Size of a `ConnectionId` in bytes.
pub const CONNECTION_ID_SIZE: usize = 8;

// ============================================
// ConnectionId
// ============================================

/// Local identifier for one peer connection.
///
/// # Example
/// ```
/// use tether_common::types::ConnectionId;
///
/// let id = ConnectionId::generate();
/// assert_eq!(id.to_string().len(), 16);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId([u8; CONNECTION_ID_SIZE]);

impl ConnectionId {
    /// Generates a new random `ConnectionId`.
    #[must_use]
    pub fn generate() -> Self {
        let mut id = [0u8; CONNECTION_ID_SIZE];
        rand::thread_rng().fill_bytes(&mut id);
        Self(id)
    }
}

impl fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectionId({})", hex::encode(self.0))
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_unique() {
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_display_is_hex() {
        let id = ConnectionId([0xde, 0xad, 0xbe, 0xef, 0, 1, 2, 3]);
        assert_eq!(id.to_string(), "deadbeef00010203");
        assert_eq!(format!("{id:?}"), "ConnectionId(deadbeef00010203)");
    }
}
