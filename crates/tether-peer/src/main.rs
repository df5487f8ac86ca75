// ============================================
// File: crates/tether-peer/src/main.rs
// ============================================
//! # Tether CLI Entry Point
//!
//! ## Creation Reason
//! Command-line front end for running and testing Tether peers: key
//! management, a simple echo listener and an interactive client.
//!
//! ## Main Functionality
//! - CLI argument parsing with clap
//! - Logging initialization with tracing
//! - Configuration, key-stash and known-keys loading
//! - Echo listener and line-based client
//!
//! ## Usage
//! ```bash
//! tether keygen --key-file identity.json
//! tether pubkey --key-file identity.json --format hex
//! tether listen --config peer.toml
//! tether connect --config peer.toml --addr 127.0.0.1:7000
//! tether validate --config peer.toml
//! ```
//!
//! ## ⚠️ Important Note for Next Developer
//! - Both ends need each other's public key in their known-keys file
//!   (`tether pubkey` prints it in the right format)
//! - The listener serves one connection at a time
//!
//! ## Last Modified
//! v0.1.0 - Initial CLI implementation

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tether_peer::{KeyStash, KnownKeys, Peer, PeerConfig, PeerError};
use tether_transport::{TcpAcceptor, Transport};

// ============================================
// CLI Definition
// ============================================

/// Tether mutually authenticated secure channel
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new identity key
    Keygen {
        /// Where to write the key-stash file
        #[arg(short, long, default_value = "tether_identity.json")]
        key_file: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the public key of an identity
    Pubkey {
        /// Key-stash file to read
        #[arg(short, long, default_value = "tether_identity.json")]
        key_file: PathBuf,

        /// Output format
        #[arg(long, value_enum, default_value_t = KeyFormat::Base64)]
        format: KeyFormat,
    },

    /// Accept connections and echo every message back
    Listen {
        /// Path to configuration file
        #[arg(short, long, default_value = "tether.toml")]
        config: PathBuf,
    },

    /// Connect, then send each stdin line and print the reply
    Connect {
        /// Path to configuration file
        #[arg(short, long, default_value = "tether.toml")]
        config: PathBuf,

        /// Remote address (overrides `network.connect_addr`)
        #[arg(long)]
        addr: Option<String>,
    },

    /// Validate configuration file
    Validate {
        /// Path to configuration file
        #[arg(short, long, default_value = "tether.toml")]
        config: PathBuf,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KeyFormat {
    Base64,
    Hex,
}

// ============================================
// Main
// ============================================

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Keygen { key_file, force } => cmd_keygen(&key_file, force).await,
        Commands::Pubkey { key_file, format } => cmd_pubkey(&key_file, format).await,
        Commands::Listen { config } => cmd_listen(&config).await,
        Commands::Connect { config, addr } => cmd_connect(&config, addr).await,
        Commands::Validate { config } => cmd_validate(&config).await,
    };

    if let Err(e) = result {
        // Config errors can fire before a subscriber exists
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code(&e));
    }
}

/// Exit status for a failed command: 2 for configuration and key-file
/// problems, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<PeerError>() {
        Some(e) if e.is_config_error() => 2,
        _ => 1,
    }
}

// ============================================
// Commands
// ============================================

/// Generates and stores a new identity.
async fn cmd_keygen(key_file: &Path, force: bool) -> anyhow::Result<()> {
    init_logging("info");

    if key_file.exists() && !force {
        bail!(
            "{} already exists; pass --force to replace it",
            key_file.display()
        );
    }

    let stash = KeyStash::generate();
    stash.save(key_file).await?;

    println!("Identity written to {}", key_file.display());
    println!("Public key: {}", stash.public_key());
    Ok(())
}

/// Prints the public key of a stored identity.
async fn cmd_pubkey(key_file: &Path, format: KeyFormat) -> anyhow::Result<()> {
    init_logging("warn");
    let stash = KeyStash::load(key_file).await?;
    match format {
        KeyFormat::Base64 => println!("{}", stash.public_key()),
        KeyFormat::Hex => println!("{}", hex::encode(stash.public_key().as_bytes())),
    }
    Ok(())
}

/// Runs the echo listener until Ctrl-C.
async fn cmd_listen(config_path: &Path) -> anyhow::Result<()> {
    let config = load_or_default_config(config_path).await?;
    init_logging(&config.logging.level);

    let identity = KeyStash::load(&config.identity.key_file).await?;
    let known = KnownKeys::load(&config.trust.known_keys_file).await?;
    if known.is_empty() {
        warn!("Known keys file is empty; every peer will be rejected");
    }

    let acceptor =
        TcpAcceptor::bind_addr(config.network.listen_addr, config.network.nodelay).await?;
    info!(
        key = %identity.public_key().fingerprint(),
        "Listening on {}",
        acceptor.local_addr()
    );

    loop {
        let transport = tokio::select! {
            accepted = acceptor.accept() => match accepted {
                Ok(transport) => transport,
                Err(e) if e.is_retryable() => {
                    warn!("Accept failed: {}", e);
                    continue;
                }
                Err(e) => return Err(e).context("listener failed"),
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                return Ok(());
            }
        };

        let remote = transport.peer_addr();
        let mut peer = Peer::accept(transport, config.peer_options());
        if let Err(e) = serve_echo(&mut peer, &config, &identity, &known).await {
            warn!(conn = %peer.connection_id(), remote = ?remote, "Connection ended: {}", e);
        }
    }
}

async fn serve_echo<T: Transport>(
    peer: &mut Peer<T>,
    config: &PeerConfig,
    identity: &KeyStash,
    known: &KnownKeys,
) -> anyhow::Result<()> {
    let remote = tokio::time::timeout(
        config.handshake_timeout(),
        peer.authenticate(identity, known),
    )
    .await
    .context("handshake timed out")??;

    info!(
        conn = %peer.connection_id(),
        peer = %remote.fingerprint(),
        label = known.label(&remote).unwrap_or("-"),
        "Serving peer"
    );

    loop {
        let message = match peer.receive().await {
            Ok(message) => message,
            Err(PeerError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        peer.send(&message).await?;
    }
}

/// Connects and relays stdin lines.
async fn cmd_connect(config_path: &Path, addr: Option<String>) -> anyhow::Result<()> {
    let config = load_or_default_config(config_path).await?;
    init_logging(&config.logging.level);

    let Some(addr) = addr.or_else(|| config.network.connect_addr.clone()) else {
        bail!("no remote address: pass --addr or set network.connect_addr");
    };

    let identity = KeyStash::load(&config.identity.key_file).await?;
    let known = KnownKeys::load(&config.trust.known_keys_file).await?;

    let mut peer = Peer::connect(&addr, config.peer_options()).await?;
    let remote = tokio::time::timeout(
        config.handshake_timeout(),
        peer.authenticate(&identity, &known),
    )
    .await
    .context("handshake timed out")??;
    let fingerprint = remote.fingerprint();
    println!(
        "Connected to {} ({})",
        addr,
        known.label(&remote).unwrap_or(&fingerprint)
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        peer.send(line.as_bytes()).await?;
        let reply = peer.receive().await?;
        println!("{}", String::from_utf8_lossy(&reply));
    }

    peer.close().await?;
    Ok(())
}

/// Validates configuration file.
async fn cmd_validate(config_path: &Path) -> anyhow::Result<()> {
    init_logging("info");

    if !config_path.exists() {
        println!("Config file not found: {}", config_path.display());
        println!("Defaults will be used.");
        return Ok(());
    }

    let config = PeerConfig::load(config_path).await?;

    println!("Configuration is valid");
    println!();
    println!("Network:");
    println!("   Listen:       {}", config.network.listen_addr);
    if let Some(addr) = &config.network.connect_addr {
        println!("   Connect:      {addr}");
    }
    println!("   TCP_NODELAY:  {}", config.network.nodelay);
    println!();
    println!("Files:");
    println!("   Identity:     {}", config.identity.key_file);
    println!("   Known keys:   {}", config.trust.known_keys_file);
    println!();
    println!("Limits:");
    println!("   Max frame:    {} bytes", config.limits.max_frame_size);
    println!("   Handshake:    {}s", config.limits.handshake_timeout_secs);
    println!();

    Ok(())
}

// ============================================
// Helper Functions
// ============================================

/// Initializes the tracing subscriber. `RUST_LOG` overrides `level`.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .try_init()
        .ok();
}

/// Loads config, or the defaults when the file does not exist.
async fn load_or_default_config(path: &Path) -> anyhow::Result<PeerConfig> {
    if path.exists() {
        Ok(PeerConfig::load(path).await?)
    } else {
        info!("Config file not found, using defaults");
        Ok(PeerConfig::default())
    }
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_config_exits_with_config_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        tokio::fs::write(&path, "[limits]\nmax_frame_size = 0\n")
            .await
            .unwrap();

        let err = load_or_default_config(&path).await.unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert!(format!("{err:#}").contains("max_frame_size"));
    }

    #[tokio::test]
    async fn test_missing_key_file_exits_with_config_status() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_pubkey(&dir.path().join("absent.json"), KeyFormat::Base64)
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err), 2);
    }

    #[test]
    fn test_other_failures_exit_with_one() {
        let err = anyhow::anyhow!("handshake timed out");
        assert_eq!(exit_code(&err), 1);
    }
}
