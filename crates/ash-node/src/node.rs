//! Node composition.
//!
//! The [`Node`] wires a [`RocksStore`] and the host's [`TokenLedger`] into a
//! [`BurnPool`], keeps a bounded log of committed events for RPC clients, and
//! serves the JSON-RPC interface.

use std::sync::Arc;

use jsonrpsee::server::ServerHandle;
use tracing::info;

use ash_core::events::MemoryEventLog;
use ash_core::traits::{PoolStore, TokenLedger};
use ash_pool::BurnPool;

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::rpc::start_rpc_server;
use crate::storage::RocksStore;

/// A running pool node.
pub struct Node {
    config: NodeConfig,
    pool: BurnPool,
    events: Arc<MemoryEventLog>,
}

impl Node {
    /// Open the RocksDB store under `config.data_dir` and activate the pool.
    pub fn open(config: NodeConfig, ledger: Arc<dyn TokenLedger>) -> Result<Self, NodeError> {
        let db_path = config.db_path();
        let store = RocksStore::open(&db_path)?;
        info!(path = %db_path.display(), "node: opened pool store");
        Self::with_store(config, Box::new(store), ledger)
    }

    /// Activate the pool over an already-open store.
    pub fn with_store(
        config: NodeConfig,
        store: Box<dyn PoolStore>,
        ledger: Arc<dyn TokenLedger>,
    ) -> Result<Self, NodeError> {
        let events = Arc::new(MemoryEventLog::with_capacity(config.event_log_capacity));
        let pool = BurnPool::new(config.pool.clone(), store, ledger)?.with_event_sink(events.clone());
        Ok(Self { config, pool, events })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// The pool engine. Notifications from the host ledger go here.
    pub fn pool(&self) -> &BurnPool {
        &self.pool
    }

    /// Recently committed events.
    pub fn events(&self) -> &MemoryEventLog {
        &self.events
    }

    /// Start the JSON-RPC server on `config.rpc_addr()`.
    pub async fn serve(self: Arc<Self>) -> Result<ServerHandle, NodeError> {
        let addr = self.config.rpc_addr();
        let handle = start_rpc_server(&addr, self).await?;
        info!(%addr, "node: RPC server listening");
        Ok(handle)
    }
}
