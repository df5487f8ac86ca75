// ============================================
// File: crates/tether-peer/src/services/known_keys.rs
// ============================================
//! # Known Keys
//!
//! ## Creation Reason
//! File-backed `TrustStore`: the list of peer identities this node will
//! talk to.
//!
//! ## File Format
//! ```text
//! # comment
//! 3q2+7w8Jk0n4c1l2Y2Vv0pQ3xk2m9Zf7x1m5o9k3h8E= office-gateway
//! pV1wq0qfE4m2yO0b5zC9+8m0JH6V2aZ0nN3a7b9rQ0s=
//! ```
//! One base64 Ed25519 public key per line, optionally followed by a
//! label. Blank lines and `#` comments are ignored.
//!
//! ## ⚠️ Important Note for Next Developer
//! - The file is read once; edits need a restart
//! - A bad line fails the whole load rather than silently trusting less
//!
//! ## Last Modified
//! v0.1.0 - Initial known keys store

use std::collections::HashMap;
use std::path::Path;

use tracing::info;

use tether_core::crypto::SigningPublicKey;
use tether_core::trust::{TrustDecision, TrustStore};

use crate::error::{PeerError, Result};

/// Trusted peer keys with optional labels.
#[derive(Debug, Default, Clone)]
pub struct KnownKeys {
    entries: HashMap<SigningPublicKey, Option<String>>,
}

impl KnownKeys {
    /// Creates an empty set (trusts nobody).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a known-keys file.
    ///
    /// # Errors
    /// `KnownKeys` naming the first bad line, or line 0 if the file
    /// cannot be read.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PeerError::known_keys(&path_str, 0, e.to_string()))?;
        let keys = Self::parse(&content, &path_str)?;

        info!("Loaded {} known keys from {}", keys.len(), path_str);
        Ok(keys)
    }

    /// Parses known-keys content; `origin` names it in errors.
    ///
    /// # Errors
    /// `KnownKeys` for an undecodable or duplicate key.
    pub fn parse(content: &str, origin: &str) -> Result<Self> {
        let mut keys = Self::new();

        for (index, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (encoded, label) = match line.split_once(char::is_whitespace) {
                Some((key, rest)) => (key, Some(rest.trim())),
                None => (line, None),
            };
            let key: SigningPublicKey = encoded
                .parse()
                .map_err(|e| PeerError::known_keys(origin, index + 1, format!("{e}")))?;

            if keys.entries.contains_key(&key) {
                return Err(PeerError::known_keys(origin, index + 1, "duplicate key"));
            }
            keys.insert(key, label.filter(|l| !l.is_empty()).map(str::to_string));
        }

        Ok(keys)
    }

    /// Trusts `key`, replacing any previous label.
    pub fn insert(&mut self, key: SigningPublicKey, label: Option<String>) {
        self.entries.insert(key, label);
    }

    /// Label recorded for `key`, if any.
    #[must_use]
    pub fn label(&self, key: &SigningPublicKey) -> Option<&str> {
        self.entries.get(key).and_then(Option::as_deref)
    }

    /// Number of trusted keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no key is trusted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TrustStore for KnownKeys {
    fn lookup(&self, key: &SigningPublicKey) -> TrustDecision {
        if self.entries.contains_key(key) {
            TrustDecision::Allowed
        } else {
            TrustDecision::Unknown
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use tether_core::crypto::SigningKeyPair;

    #[test]
    fn test_parse_with_labels_and_comments() {
        let a = SigningKeyPair::generate().public_key();
        let b = SigningKeyPair::generate().public_key();
        let content = format!("# trusted peers\n\n{a}   office gateway\n  {b}\n");

        let keys = KnownKeys::parse(&content, "<test>").unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys.label(&a), Some("office gateway"));
        assert_eq!(keys.label(&b), None);
        assert_eq!(keys.lookup(&a), TrustDecision::Allowed);

        let stranger = SigningKeyPair::generate().public_key();
        assert_eq!(keys.lookup(&stranger), TrustDecision::Unknown);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let a = SigningKeyPair::generate().public_key();
        let content = format!("{a}\nnot-base64!\n");

        let err = KnownKeys::parse(&content, "known").unwrap_err();
        assert!(matches!(err, PeerError::KnownKeys { line: 2, .. }));
    }

    #[test]
    fn test_duplicate_rejected() {
        let a = SigningKeyPair::generate().public_key();
        let content = format!("{a} one\n{a} two\n");
        assert!(matches!(
            KnownKeys::parse(&content, "known"),
            Err(PeerError::KnownKeys { line: 2, .. })
        ));
    }

    #[test]
    fn test_empty_trusts_nobody() {
        let keys = KnownKeys::parse("# nothing here\n", "known").unwrap();
        assert!(keys.is_empty());
        assert_eq!(
            keys.lookup(&SigningKeyPair::generate().public_key()),
            TrustDecision::Unknown
        );
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_keys");
        let key = SigningKeyPair::generate().public_key();
        tokio::fs::write(&path, format!("{key} laptop\n")).await.unwrap();

        let keys = KnownKeys::load(&path).await.unwrap();
        assert_eq!(keys.label(&key), Some("laptop"));

        let missing = KnownKeys::load(dir.path().join("absent")).await;
        assert!(matches!(missing, Err(PeerError::KnownKeys { line: 0, .. })));
    }
}
