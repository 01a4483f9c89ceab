//! Node-level errors.

use ash_core::error::{PoolError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    #[error("configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("RPC server error: {0}")]
    Rpc(String),
    #[error("logging already initialized: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for NodeError {
    fn from(e: config::ConfigError) -> Self {
        NodeError::Config(e.to_string())
    }
}
