//! Configuration for the marketplace

use crate::types::{Currency, Money};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Marketplace configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data directory for RocksDB
    pub data_dir: PathBuf,

    /// Service name
    pub service_name: String,

    /// Service version
    pub service_version: String,

    /// Metrics listen address
    pub metrics_listen_addr: String,

    /// Display currency for messages
    pub currency: Currency,

    /// Persist state to RocksDB (disabled = in-memory demo mode)
    pub persistence_enabled: bool,

    /// Load demo campuses, accounts and products into an empty store
    pub seed_demo_data: bool,

    /// RocksDB configuration
    pub rocksdb: RocksDBConfig,

    /// Batching configuration
    pub batching: BatchingConfig,

    /// Boost pricing
    pub boost: BoostConfig,

    /// Review rules
    pub reviews: ReviewConfig,

    /// Change notification configuration
    pub events: EventConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/marketplace"),
            service_name: "marketplace-core".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            metrics_listen_addr: "0.0.0.0:9090".to_string(),
            currency: Currency::NGN,
            persistence_enabled: true,
            seed_demo_data: false,
            rocksdb: RocksDBConfig::default(),
            batching: BatchingConfig::default(),
            boost: BoostConfig::default(),
            reviews: ReviewConfig::default(),
            events: EventConfig::default(),
        }
    }
}

/// RocksDB configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDBConfig {
    /// Write buffer size (MB)
    pub write_buffer_size_mb: usize,

    /// Max write buffers
    pub max_write_buffer_number: i32,

    /// Max background jobs (compaction + flush)
    pub max_background_jobs: i32,

    /// Enable statistics
    pub enable_statistics: bool,
}

impl Default for RocksDBConfig {
    fn default() -> Self {
        Self {
            write_buffer_size_mb: 64,
            max_write_buffer_number: 2,
            max_background_jobs: 2,
            enable_statistics: false,
        }
    }
}

/// Batching of persisted change sets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Maximum change sets per write batch
    pub max_batch_size: usize,

    /// Batch timeout (milliseconds)
    pub batch_timeout_ms: u64,

    /// Enable batching (disabled = write after every mutation)
    pub enabled: bool,
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            batch_timeout_ms: 20,
            enabled: true,
        }
    }
}

/// Boost pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostConfig {
    /// Cost of one boosted day (minor units)
    pub price_per_day: Money,

    /// Longest boost purchasable at once
    pub max_days: u32,
}

impl Default for BoostConfig {
    fn default() -> Self {
        Self {
            price_per_day: Money::from_minor(50_000), // ₦500.00
            max_days: 30,
        }
    }
}

/// Review rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Reviewer must hold a paid or fulfilled order for the product
    pub require_purchase: bool,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            require_purchase: true,
        }
    }
}

/// Change notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EventConfig {
    /// Broadcast channel capacity; slow subscribers lag past this
    pub channel_capacity: usize,

    /// Actor mailbox capacity
    pub mailbox_capacity: usize,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
            mailbox_capacity: 1000,
        }
    }
}

impl Config {
    /// In-memory configuration for the demo/offline mode
    pub fn in_memory() -> Self {
        Self {
            persistence_enabled: false,
            ..Self::default()
        }
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(data_dir) = std::env::var("MARKETPLACE_DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }

        if let Ok(addr) = std::env::var("MARKETPLACE_METRICS_ADDR") {
            config.metrics_listen_addr = addr;
        }

        if let Ok(flag) = std::env::var("MARKETPLACE_SEED_DEMO") {
            config.seed_demo_data = parse_flag("MARKETPLACE_SEED_DEMO", &flag)?;
        }

        if let Ok(flag) = std::env::var("MARKETPLACE_PERSISTENCE") {
            config.persistence_enabled = parse_flag("MARKETPLACE_PERSISTENCE", &flag)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the marketplace cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.boost.max_days == 0 {
            return Err(crate::Error::Config("boost.max_days must be at least 1".to_string()));
        }
        if self.events.channel_capacity == 0 || self.events.mailbox_capacity == 0 {
            return Err(crate::Error::Config(
                "event channel and mailbox capacities must be non-zero".to_string(),
            ));
        }
        if self.batching.enabled
            && (self.batching.max_batch_size == 0 || self.batching.batch_timeout_ms == 0)
        {
            return Err(crate::Error::Config(
                "batching.max_batch_size and batching.batch_timeout_ms must be non-zero when batching is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(name: &str, value: &str) -> crate::Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(crate::Error::Config(format!("{} must be a boolean, got {:?}", name, other))),
    }
}
