//! Configuration for the token ledger

use crate::types::Address;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Metrics listen address
    pub metrics_listen_addr: String,

    /// Genesis parameters (used only when the data dir holds no state)
    pub genesis: GenesisConfig,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/token-ledger"),
            service_name: "token-ledger".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            metrics_listen_addr: "0.0.0.0:9090".to_string(),
            genesis: GenesisConfig::default(),
            rocksdb: RocksDBConfig::default(),
        }
    }
}

/// Genesis parameters: cap and initial owner, fixed at ledger creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisConfig {
    /// Immutable supply cap
    pub cap: u64,

    /// Initial owner address (hex, with or without 0x prefix)
    pub owner: String,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            cap: 1_000_000_000,
            owner: format!("0x{}01", "00".repeat(crate::types::ADDRESS_LEN - 1)),
        }
    }
}

impl GenesisConfig {
    /// Parse the configured owner address
    pub fn owner_address(&self) -> crate::Result<Address> {
        Address::from_hex(&self.owner).ok_or_else(|| {
            crate::Error::Config(format!("invalid genesis owner address: {}", self.owner))
        })
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 4,
            max_background_jobs: 4,
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("TOKEN_LEDGER_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("TOKEN_LEDGER_METRICS_ADDR") {
            config.metrics_listen_addr = addr;
        }

        if let Ok(owner) = std::env::var("TOKEN_LEDGER_GENESIS_OWNER") {
            config.genesis.owner = owner;
        }

        if let Ok(cap) = std::env::var("TOKEN_LEDGER_GENESIS_CAP") {
            config.genesis.cap = cap
                .parse()
                .map_err(|e| crate::Error::Config(format!("invalid genesis cap: {}", e)))?;
        }

        Ok(config)
    }
}
