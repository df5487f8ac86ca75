// ============================================
// File: crates/tether-common/src/secret.rs
// ============================================
//! # Secret Byte Buffers
//!
//! ## Creation Reason
//! Key material (seeds, directional secrets, session keys) must be wiped
//! on every exit path of the handshake. Wrapping it in an owned,
//! non-`Clone` buffer that zeroizes on drop removes the need for manual
//! cleanup at each `?`.
//!
//! ## Main Functionality
//! - `SecretBytes<N>`: fixed-size secret buffer, zeroed on drop
//! - Constant-time equality via `subtle`
//! - Redacted `Debug`
//!
//! ## ⚠️ Important Note for Next Developer
//! - Do NOT derive or implement `Clone`/`Copy` for this type
//! - `expose()` hands out a borrow only; never copy the bytes into
//!   long-lived plain arrays
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CommonError, Result};

/// Owned fixed-size secret, zeroed when dropped.
pub struct SecretBytes<const N: usize>([u8; N]);

impl<const N: usize> SecretBytes<N> {
    /// Takes ownership of `bytes`.
    ///
    /// The argument is moved in; callers holding their own copy of the
    /// array remain responsible for wiping it.
    #[must_use]
    pub const fn new(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Copies a secret out of a slice, failing on length mismatch.
    ///
    /// # Errors
    /// Returns `InvalidLength` if `slice.len() != N`.
    pub fn from_slice(slice: &[u8]) -> Result<Self> {
        if slice.len() != N {
            return Err(CommonError::invalid_length(N, slice.len()));
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Fills a new secret from the OS random number generator.
    #[must_use]
    pub fn random() -> Self {
        let mut bytes = [0u8; N];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Borrows the raw secret bytes.
    #[must_use]
    pub const fn expose(&self) -> &[u8; N] {
        &self.0
    }

    /// Constant-time comparison.
    #[must_use]
    pub fn ct_eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl<const N: usize> Zeroize for SecretBytes<N> {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl<const N: usize> Drop for SecretBytes<N> {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl<const N: usize> ZeroizeOnDrop for SecretBytes<N> {}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>([REDACTED])")
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_length_checked() {
        assert!(SecretBytes::<32>::from_slice(&[1u8; 32]).is_ok());
        let err = SecretBytes::<32>::from_slice(&[1u8; 31]).unwrap_err();
        assert!(matches!(
            err,
            CommonError::InvalidLength {
                expected: 32,
                actual: 31
            }
        ));
    }

    #[test]
    fn test_random_secrets_differ() {
        let a = SecretBytes::<32>::random();
        let b = SecretBytes::<32>::random();
        assert!(!a.ct_eq(&b));
    }

    #[test]
    fn test_ct_eq() {
        let a = SecretBytes::new([7u8; 32]);
        let b = SecretBytes::new([7u8; 32]);
        let c = SecretBytes::new([8u8; 32]);
        assert!(a.ct_eq(&b));
        assert!(!a.ct_eq(&c));
    }

    #[test]
    fn test_zeroize_clears_bytes() {
        let mut secret = SecretBytes::new([0xAAu8; 16]);
        secret.zeroize();
        assert_eq!(secret.expose(), &[0u8; 16]);
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretBytes::new([0x42u8; 32]);
        let shown = format!("{secret:?}");
        assert!(shown.contains("REDACTED"));
        assert!(!shown.contains("42"));
    }
}
