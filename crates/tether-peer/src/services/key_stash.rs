// ============================================
// File: crates/tether-peer/src/services/key_stash.rs
// ============================================
//! # Key Stash
//!
//! ## Creation Reason
//! Persists the local Ed25519 identity between runs and serves it to the
//! handshake as an `IdentityProvider`.
//!
//! ## File Format
//! ```json
//! {
//!   "version": "1.0",
//!   "key_type": "ed25519",
//!   "public_key": "<base64>",
//!   "private_key": "<base64 seed>",
//!   "created_at": "1718000000Z"
//! }
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - The file holds the private seed; it is written with mode 0600 on Unix
//! - Loading rejects a file whose public key does not match its seed
//!
//! ## Last Modified
//! v0.1.0 - Initial key stash

use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zeroize::Zeroizing;

use tether_core::crypto::{SigningKeyPair, SigningPublicKey};
use tether_core::trust::IdentityProvider;

use crate::error::{PeerError, Result};

const KEY_FILE_VERSION: &str = "1.0";
const KEY_TYPE: &str = "ed25519";

/// On-disk representation.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    version: String,
    key_type: String,
    public_key: String,
    private_key: String,
    created_at: String,
}

impl Drop for KeyFile {
    fn drop(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.private_key);
    }
}

/// Local identity loaded from (or destined for) a key-stash file.
pub struct KeyStash {
    identity: SigningKeyPair,
    created_at: String,
}

impl KeyStash {
    /// Generates a fresh identity.
    #[must_use]
    pub fn generate() -> Self {
        Self {
            identity: SigningKeyPair::generate(),
            created_at: unix_timestamp(),
        }
    }

    /// Wraps an existing key pair.
    #[must_use]
    pub fn from_key_pair(identity: SigningKeyPair) -> Self {
        Self {
            identity,
            created_at: unix_timestamp(),
        }
    }

    /// Reads and validates a key-stash file.
    ///
    /// # Errors
    /// `KeyFile` if the file is missing, unparseable, of the wrong key
    /// type, or its public key does not match the seed.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        debug!("Loading key stash from {}", path_str);

        let content = Zeroizing::new(
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| PeerError::key_file(&path_str, e.to_string()))?,
        );
        Self::parse(&content).map_err(|reason| PeerError::key_file(&path_str, reason))
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let file: KeyFile = serde_json::from_str(content).map_err(|e| e.to_string())?;

        if file.key_type != KEY_TYPE {
            return Err(format!("unsupported key type '{}'", file.key_type));
        }

        let seed = Zeroizing::new(
            BASE64
                .decode(&file.private_key)
                .map_err(|e| format!("private key is not base64: {e}"))?,
        );
        let identity = SigningKeyPair::from_seed_slice(&seed).map_err(|e| e.to_string())?;

        let stored: SigningPublicKey = file.public_key.parse().map_err(|e| format!("{e}"))?;
        if stored != identity.public_key() {
            return Err("public key does not match private key".into());
        }

        Ok(Self {
            identity,
            created_at: file.created_at.clone(),
        })
    }

    /// Writes the stash to `path`, creating parent directories.
    ///
    /// # Errors
    /// `KeyFile` if the file cannot be written or its permissions set.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let path_str = path.display().to_string();
        let fail = |e: std::io::Error| PeerError::key_file(&path_str, e.to_string());

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(fail)?;
        }

        let file = KeyFile {
            version: KEY_FILE_VERSION.to_string(),
            key_type: KEY_TYPE.to_string(),
            public_key: self.identity.public_key().to_string(),
            private_key: BASE64.encode(self.identity.seed().expose()),
            created_at: self.created_at.clone(),
        };
        let content = Zeroizing::new(
            serde_json::to_string_pretty(&file)
                .map_err(|e| PeerError::key_file(&path_str, e.to_string()))?,
        );

        tokio::fs::write(path, content.as_bytes()).await.map_err(fail)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = tokio::fs::metadata(path).await.map_err(fail)?.permissions();
            perms.set_mode(0o600);
            tokio::fs::set_permissions(path, perms).await.map_err(fail)?;
        }

        info!(
            key = %self.identity.public_key().fingerprint(),
            "Saved key stash to {}",
            path_str
        );
        Ok(())
    }

    /// Public half of the stored identity.
    #[must_use]
    pub const fn public_key(&self) -> SigningPublicKey {
        self.identity.public_key()
    }

    /// When the identity was generated (Unix seconds, `Z` suffixed).
    #[must_use]
    pub fn created_at(&self) -> &str {
        &self.created_at
    }
}

impl IdentityProvider for KeyStash {
    fn current_signing_key_pair(&self) -> &SigningKeyPair {
        &self.identity
    }
}

impl std::fmt::Debug for KeyStash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStash")
            .field("public_key", &self.identity.public_key().fingerprint())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

fn unix_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("{secs}Z")
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys").join("identity.json");

        let stash = KeyStash::generate();
        stash.save(&path).await.unwrap();

        let loaded = KeyStash::load(&path).await.unwrap();
        assert_eq!(loaded.public_key(), stash.public_key());
        assert_eq!(loaded.created_at(), stash.created_at());

        // Loaded key signs like the original
        let sig = loaded.current_signing_key_pair().sign(b"msg");
        assert!(tether_core::crypto::verify(&stash.public_key(), b"msg", &sig));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        KeyStash::generate().save(&path).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_mismatched_public_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("identity.json");
        KeyStash::generate().save(&path).await.unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        json["public_key"] = SigningKeyPair::generate().public_key().to_string().into();
        std::fs::write(&path, json.to_string()).unwrap();

        let err = KeyStash::load(&path).await.unwrap_err();
        assert!(matches!(err, PeerError::KeyFile { ref reason, .. } if reason.contains("does not match")));
    }

    #[test]
    fn test_wrong_key_type_rejected() {
        let json = r#"{"version":"1.0","key_type":"rsa","public_key":"","private_key":"","created_at":"0Z"}"#;
        assert!(KeyStash::parse(json).unwrap_err().contains("rsa"));
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = KeyStash::load(dir.path().join("nope.json")).await.unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_debug_hides_secret() {
        let stash = KeyStash::generate();
        let debug = format!("{stash:?}");
        assert!(debug.contains(&stash.public_key().fingerprint()));
        assert!(!debug.contains(&BASE64.encode(stash.identity.seed().expose())));
    }
}
