//! Node configuration for the ash pool node.
//!
//! [`NodeConfig`] is layered with the `config` crate: an optional TOML file,
//! then `ASH_`-prefixed environment variables (nested keys separated by
//! `__`, e.g. `ASH_POOL__MAX_CYCLE`). Every node field has a default; the
//! `[pool]` table has none and must be supplied.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use ash_core::constants::DEFAULT_EVENT_LOG_CAPACITY;
use ash_pool::PoolConfig;

use crate::error::NodeError;

/// Default JSON-RPC port.
pub const DEFAULT_RPC_PORT: u16 = 28_545;

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ash-pool")
}

fn default_rpc_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_rpc_port() -> u16 {
    DEFAULT_RPC_PORT
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}

/// Configuration for a pool node instance.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeConfig {
    /// Root directory for all persistent data.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// IP address for the JSON-RPC server to bind to.
    #[serde(default = "default_rpc_bind")]
    pub rpc_bind: String,
    /// Port for the JSON-RPC server.
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    /// Log level filter string (e.g. "info", "debug", "ash_pool=trace").
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "json" for structured output, anything else for text.
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// Number of recent pool events kept for `ash_recentEvents`.
    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,
    pub pool: PoolConfig,
}

impl NodeConfig {
    /// Node defaults around the given pool configuration.
    pub fn new(pool: PoolConfig) -> Self {
        Self {
            data_dir: default_data_dir(),
            rpc_bind: default_rpc_bind(),
            rpc_port: default_rpc_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            event_log_capacity: default_event_log_capacity(),
            pool,
        }
    }

    /// Load from an optional file plus `ASH_` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, NodeError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("ASH")
                .prefix_separator("_")
                .separator("__"),
        );
        let cfg = builder.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Path to the RocksDB pool data directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("pooldata")
    }

    /// Socket address string for the RPC server.
    pub fn rpc_addr(&self) -> String {
        format!("{}:{}", self.rpc_bind, self.rpc_port)
    }
}
