// ============================================
// File: crates/tether-core/src/crypto/kdf.rs
// ============================================
//! # Key Derivation Functions
//!
//! ## Main Functionality
//! - `derive_directional_keys`: Splits an X25519 shared secret into the
//!   client-to-server and server-to-client record keys
//!
//! ## Derivation
//! ```text
//! okm = HKDF-SHA256(
//!     ikm:  shared_secret,
//!     salt: "tether-kx-v1",
//!     info: "tether-directional-keys" || client_kx_public || server_kx_public,
//!     len:  64,
//! )
//! client_to_server = okm[0..32]
//! server_to_client = okm[32..64]
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Never log inputs or outputs of this module, not even at trace level
//!
//! ## Last Modified
//! v0.1.0 - Initial implementation

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroize;

use tether_common::SecretBytes;

use super::{HKDF_INFO_PREFIX, HKDF_SALT, SESSION_KEY_SIZE, X25519_PUBLIC_KEY_SIZE};
use crate::error::{CoreError, Result};

/// Client-to-server and server-to-client keys, in that order.
pub type DirectionalKeys = (SecretBytes<SESSION_KEY_SIZE>, SecretBytes<SESSION_KEY_SIZE>);

/// Derives the two directional record keys from a DH output.
///
/// Both key-exchange public keys are bound into the HKDF info so the keys
/// are tied to this particular exchange and to which side is the client.
///
/// # Errors
/// Returns `KeyDerivation` if HKDF expansion fails.
pub fn derive_directional_keys(
    shared_secret: &[u8; 32],
    client_kx_public: &[u8; X25519_PUBLIC_KEY_SIZE],
    server_kx_public: &[u8; X25519_PUBLIC_KEY_SIZE],
) -> Result<DirectionalKeys> {
    let mut info = Vec::with_capacity(HKDF_INFO_PREFIX.len() + X25519_PUBLIC_KEY_SIZE * 2);
    info.extend_from_slice(HKDF_INFO_PREFIX);
    info.extend_from_slice(client_kx_public);
    info.extend_from_slice(server_kx_public);

    let hk = Hkdf::<Sha256>::new(Some(HKDF_SALT), shared_secret);
    let mut okm = [0u8; SESSION_KEY_SIZE * 2];
    hk.expand(&info, &mut okm)
        .map_err(|_| CoreError::KeyDerivation {
            reason: "HKDF expansion failed".into(),
        })?;

    let keys = SecretBytes::from_slice(&okm[..SESSION_KEY_SIZE]).and_then(|c2s| {
        SecretBytes::from_slice(&okm[SESSION_KEY_SIZE..]).map(|s2c| (c2s, s2c))
    });
    okm.zeroize();

    Ok(keys?)
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED: [u8; 32] = [0x42; 32];
    const CLIENT: [u8; 32] = [0x01; 32];
    const SERVER: [u8; 32] = [0x02; 32];

    #[test]
    fn test_directions_differ() {
        let (c2s, s2c) = derive_directional_keys(&SHARED, &CLIENT, &SERVER).unwrap();
        assert!(!c2s.ct_eq(&s2c));
        assert_ne!(c2s.expose(), &[0u8; 32]);
    }

    #[test]
    fn test_deterministic() {
        let (a1, b1) = derive_directional_keys(&SHARED, &CLIENT, &SERVER).unwrap();
        let (a2, b2) = derive_directional_keys(&SHARED, &CLIENT, &SERVER).unwrap();
        assert!(a1.ct_eq(&a2));
        assert!(b1.ct_eq(&b2));
    }

    #[test]
    fn test_role_order_matters() {
        let (c2s, _) = derive_directional_keys(&SHARED, &CLIENT, &SERVER).unwrap();
        let (swapped, _) = derive_directional_keys(&SHARED, &SERVER, &CLIENT).unwrap();
        assert!(!c2s.ct_eq(&swapped));
    }

    #[test]
    fn test_bound_to_public_keys() {
        let (c2s, _) = derive_directional_keys(&SHARED, &CLIENT, &SERVER).unwrap();
        let (other, _) = derive_directional_keys(&SHARED, &CLIENT, &[0x03; 32]).unwrap();
        assert!(!c2s.ct_eq(&other));
    }
}
