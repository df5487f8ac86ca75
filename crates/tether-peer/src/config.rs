// ============================================
// File: crates/tether-peer/src/config.rs
// ============================================
//! # Peer Configuration
//!
//! ## Creation Reason
//! Provides configuration for the `tether` binary and for hosts that
//! build `Peer`s from a file rather than in code.
//!
//! ## Main Functionality
//! - `PeerConfig`: Main configuration structure
//! - TOML file loading and parsing
//! - Per-section validation
//! - `peer_options()`: the subset a `Peer` needs at runtime
//!
//! ## Configuration Sections
//! - `network`: listen address, default remote address, TCP_NODELAY
//! - `identity`: key-stash path
//! - `trust`: known-keys path
//! - `limits`: frame size and handshake timeout
//! - `logging`: log level
//!
//! ## Example Configuration
//! ```toml
//! [network]
//! listen_addr = "0.0.0.0:7000"
//! connect_addr = "192.0.2.10:7000"
//! nodelay = true
//!
//! [identity]
//! key_file = "/etc/tether/identity.json"
//!
//! [trust]
//! known_keys_file = "/etc/tether/known_keys"
//!
//! [limits]
//! max_frame_size = 1048576
//! handshake_timeout_secs = 10
//!
//! [logging]
//! level = "info"
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Both ends must agree on `max_frame_size`; a larger frame from the
//!   peer is treated as malformed and kills the session
//! - The handshake timeout is applied by the binary, not by `Peer`
//!
//! ## Last Modified
//! v0.1.0 - Initial configuration implementation

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use tether_core::protocol::DEFAULT_MAX_FRAME_PLAINTEXT;
use tether_core::crypto::POLY1305_TAG_SIZE;

use crate::error::{PeerError, Result};
use crate::peer::PeerOptions;

// ============================================
// PeerConfig
// ============================================

/// Main peer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PeerConfig {
    /// Network configuration.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Local identity configuration.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Trusted peer keys.
    #[serde(default)]
    pub trust: TrustConfig,

    /// Session limits.
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PeerConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed or validated.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        info!("Loading configuration from: {}", path_str);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PeerError::config_load(&path_str, e.to_string()))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| PeerError::config_load(&path_str, e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a string.
    ///
    /// # Errors
    /// Returns error if the content cannot be parsed or validated.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| PeerError::config_load("<string>", e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    ///
    /// # Errors
    /// `ConfigInvalid` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        self.network.validate()?;
        self.identity.validate()?;
        self.trust.validate()?;
        self.limits.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Serializes configuration to a TOML string.
    #[must_use]
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Runtime options for a `Peer` built from this configuration.
    #[must_use]
    pub const fn peer_options(&self) -> PeerOptions {
        PeerOptions {
            max_frame_size: self.limits.max_frame_size,
            nodelay: self.network.nodelay,
        }
    }

    /// Handshake timeout as a `Duration`.
    #[must_use]
    pub const fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.limits.handshake_timeout_secs)
    }
}

// ============================================
// NetworkConfig
// ============================================

/// Network configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address `tether listen` binds to.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,

    /// Default remote for `tether connect`.
    #[serde(default)]
    pub connect_addr: Option<String>,

    /// Disable Nagle's algorithm on connections.
    #[serde(default = "default_nodelay")]
    pub nodelay: bool,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 7000))
}

const fn default_nodelay() -> bool {
    true
}

impl NetworkConfig {
    fn validate(&self) -> Result<()> {
        if let Some(addr) = &self.connect_addr {
            let parsed: SocketAddr = addr.parse().map_err(|_| {
                PeerError::config_invalid("network.connect_addr", "must be an IP:port address")
            })?;
            if parsed.port() == 0 {
                return Err(PeerError::config_invalid(
                    "network.connect_addr",
                    "port cannot be 0",
                ));
            }
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            connect_addr: None,
            nodelay: default_nodelay(),
        }
    }
}

// ============================================
// IdentityConfig
// ============================================

/// Local identity section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Path to the key-stash file.
    #[serde(default = "default_key_file")]
    pub key_file: String,
}

fn default_key_file() -> String {
    "tether_identity.json".to_string()
}

impl IdentityConfig {
    fn validate(&self) -> Result<()> {
        if self.key_file.trim().is_empty() {
            return Err(PeerError::config_invalid(
                "identity.key_file",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
        }
    }
}

// ============================================
// TrustConfig
// ============================================

/// Trusted keys section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustConfig {
    /// Path to the known-keys file.
    #[serde(default = "default_known_keys_file")]
    pub known_keys_file: String,
}

fn default_known_keys_file() -> String {
    "tether_known_keys".to_string()
}

impl TrustConfig {
    fn validate(&self) -> Result<()> {
        if self.known_keys_file.trim().is_empty() {
            return Err(PeerError::config_invalid(
                "trust.known_keys_file",
                "cannot be empty",
            ));
        }
        Ok(())
    }
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            known_keys_file: default_known_keys_file(),
        }
    }
}

// ============================================
// LimitsConfig
// ============================================

/// Session limits section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Largest plaintext message, in bytes.
    #[serde(default = "default_max_frame_size")]
    pub max_frame_size: usize,

    /// Seconds allowed for the whole handshake.
    #[serde(default = "default_handshake_timeout")]
    pub handshake_timeout_secs: u64,
}

const fn default_max_frame_size() -> usize {
    DEFAULT_MAX_FRAME_PLAINTEXT
}

const fn default_handshake_timeout() -> u64 {
    10
}

impl LimitsConfig {
    fn validate(&self) -> Result<()> {
        if self.max_frame_size == 0 {
            return Err(PeerError::config_invalid(
                "limits.max_frame_size",
                "must be greater than 0",
            ));
        }

        if self.max_frame_size > u32::MAX as usize - POLY1305_TAG_SIZE {
            return Err(PeerError::config_invalid(
                "limits.max_frame_size",
                "does not fit the 32-bit frame length prefix",
            ));
        }

        if self.handshake_timeout_secs == 0 {
            return Err(PeerError::config_invalid(
                "limits.handshake_timeout_secs",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_frame_size: default_max_frame_size(),
            handshake_timeout_secs: default_handshake_timeout(),
        }
    }
}

// ============================================
// LoggingConfig
// ============================================

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    fn validate(&self) -> Result<()> {
        match self.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            _ => Err(PeerError::config_invalid(
                "logging.level",
                "must be one of trace, debug, info, warn, error",
            )),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PeerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.network.listen_addr.port(), 7000);
        assert!(config.network.nodelay);
        assert_eq!(config.limits.max_frame_size, 1024 * 1024);
    }

    #[test]
    fn test_full_config_format() {
        let toml = r#"
            [network]
            listen_addr = "127.0.0.1:7100"
            connect_addr = "127.0.0.1:7200"
            nodelay = false

            [identity]
            key_file = "/tmp/id.json"

            [trust]
            known_keys_file = "/tmp/known"

            [limits]
            max_frame_size = 4096
            handshake_timeout_secs = 3

            [logging]
            level = "debug"
        "#;

        let config = PeerConfig::from_str(toml).unwrap();
        assert_eq!(config.network.listen_addr.port(), 7100);
        assert_eq!(config.network.connect_addr.as_deref(), Some("127.0.0.1:7200"));
        assert_eq!(config.identity.key_file, "/tmp/id.json");
        assert_eq!(config.trust.known_keys_file, "/tmp/known");
        assert_eq!(config.handshake_timeout(), Duration::from_secs(3));

        let options = config.peer_options();
        assert_eq!(options.max_frame_size, 4096);
        assert!(!options.nodelay);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = PeerConfig::from_str("[limits]\nmax_frame_size = 512\n").unwrap();
        assert_eq!(config.limits.max_frame_size, 512);
        assert_eq!(config.limits.handshake_timeout_secs, 10);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = PeerConfig::from_str("[limits]\nmax_frame_size = 0\n").unwrap_err();
        assert!(matches!(err, PeerError::ConfigInvalid { ref field, .. } if field == "limits.max_frame_size"));

        let err = PeerConfig::from_str("[network]\nconnect_addr = \"somewhere\"\n").unwrap_err();
        assert!(matches!(err, PeerError::ConfigInvalid { ref field, .. } if field == "network.connect_addr"));

        let err = PeerConfig::from_str("[logging]\nlevel = \"loud\"\n").unwrap_err();
        assert!(err.is_config_error());
    }

    #[test]
    fn test_unparseable_config() {
        let err = PeerConfig::from_str("[network\n").unwrap_err();
        assert!(matches!(err, PeerError::ConfigLoad { .. }));
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut config = PeerConfig::default();
        config.network.connect_addr = Some("10.0.0.1:7000".into());
        let parsed = PeerConfig::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed.network.connect_addr, config.network.connect_addr);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("peer.toml");
        tokio::fs::write(&path, "[logging]\nlevel = \"warn\"\n").await.unwrap();

        let config = PeerConfig::load(&path).await.unwrap();
        assert_eq!(config.logging.level, "warn");

        let missing = PeerConfig::load(dir.path().join("absent.toml")).await;
        assert!(matches!(missing, Err(PeerError::ConfigLoad { .. })));
    }
}
