// ============================================
// File: crates/tether-common/src/error.rs
// ============================================
//! # Common Error Types
//!
//! ## Creation Reason
//! Provides the foundational error type and result alias used across
//! all Tether crates, so lower-level failures can be wrapped uniformly.
//!
//! ## Main Functionality
//! - `CommonError`: Base error enum for validation failures
//! - `Result<T>`: Type alias using `CommonError`
//!
//! ## Design Philosophy
//! - Use `thiserror` for ergonomic error definitions
//! - Each crate defines its own error type that wraps `CommonError`
//! - Errors should be informative without leaking sensitive information
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never include key material in error messages
//!
//! ## Last Modified
//! v0.1.0 - Initial error definitions

use thiserror::Error;

// ============================================
// Result Type Alias
// ============================================

/// Common result type for operations that may fail.
pub type Result<T> = std::result::Result<T, CommonError>;

// ============================================
// CommonError
// ============================================

/// Common error types shared across Tether crates.
///
/// # Example
/// ```
/// use tether_common::error::{CommonError, Result};
///
/// fn validate_key(data: &[u8]) -> Result<()> {
///     if data.len() != 32 {
///         return Err(CommonError::invalid_length(32, data.len()));
///     }
///     Ok(())
/// }
///
/// assert!(validate_key(&[0u8; 31]).is_err());
/// ```
#[derive(Error, Debug)]
pub enum CommonError {
    /// Data length doesn't match expected size.
    #[error("Invalid length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Expected length in bytes
        expected: usize,
        /// Actual length received
        actual: usize,
    },
}

impl CommonError {
    /// Creates an `InvalidLength` error.
    #[must_use]
    pub const fn invalid_length(expected: usize, actual: usize) -> Self {
        Self::InvalidLength { expected, actual }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CommonError::invalid_length(32, 4);
        assert_eq!(err.to_string(), "Invalid length: expected 32, got 4");
    }
}
