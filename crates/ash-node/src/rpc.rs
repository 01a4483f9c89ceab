//! JSON-RPC server for the ash pool node.
//!
//! Uses jsonrpsee 0.24 to expose the pool's read queries and the Merkle
//! unlock entry point. Ash totals and multiplier parts are `u128` and are
//! carried as decimal strings.

use std::sync::Arc;

use jsonrpsee::core::async_trait;
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};

use ash_core::error::PoolError;
use ash_core::events::PoolEvent;
use ash_core::multiplier::MultiplierInfo;
use ash_core::types::{Address, Hash256};
use ash_pool::PoolConfig;

use crate::error::NodeError;
use crate::node::Node;

/// Upper bound on `ash_recentEvents` results.
pub const MAX_RECENT_EVENTS: usize = 1_000;

/// JSON representation of an account's multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiplierJson {
    /// Packed 32-byte word as 0x-prefixed hex.
    pub word: String,
    /// Game multiplier numerator, decimal. "0" when unset.
    pub numerator: String,
    /// Token multiplier scalar, decimal. "0" when unset.
    pub scalar: String,
}

impl From<MultiplierInfo> for MultiplierJson {
    fn from(info: MultiplierInfo) -> Self {
        Self {
            word: info.word.to_string(),
            numerator: info.numerator.to_string(),
            scalar: info.scalar.to_string(),
        }
    }
}

/// JSON representation of a cycle's time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleWindowJson {
    pub cycle: u64,
    /// First second of the cycle (inclusive).
    pub start: u64,
    /// First second of the next cycle (exclusive).
    pub end: u64,
}

/// Parse an account address (40 hex characters, optional `0x`).
pub fn parse_address(s: &str) -> Result<Address, ErrorObjectOwned> {
    s.parse().map_err(|_| rpc_error(-8, "invalid account address"))
}

/// Parse a 64-character hex string (optional `0x`) into a Hash256.
pub fn parse_hash(s: &str) -> Result<Hash256, ErrorObjectOwned> {
    s.parse().map_err(|_| rpc_error(-8, "invalid 32-byte hash"))
}

/// Parse a decimal `u128`.
pub fn parse_u128(s: &str) -> Result<u128, ErrorObjectOwned> {
    s.parse().map_err(|_| rpc_error(-8, "invalid decimal integer"))
}

fn rpc_error(code: i32, msg: &str) -> ErrorObjectOwned {
    ErrorObjectOwned::owned(code, msg.to_string(), None::<()>)
}

fn pool_error(e: PoolError) -> ErrorObjectOwned {
    let code = match e {
        PoolError::Validation(_) => -8,
        PoolError::Proof(_) => -26,
        PoolError::Replay(_) => -27,
        PoolError::Config(_) | PoolError::Store(_) | PoolError::Ledger(_) => -1,
    };
    rpc_error(code, &e.to_string())
}

/// The ash pool JSON-RPC interface.
#[rpc(server)]
pub trait AshRpc {
    /// Returns the cycle of the current time.
    #[method(name = "ash_currentCycle")]
    async fn current_cycle(&self) -> Result<u64, ErrorObjectOwned>;

    /// Returns the `[start, end)` window of a cycle.
    #[method(name = "ash_cycleWindow")]
    async fn cycle_window(&self, cycle: u64) -> Result<CycleWindowJson, ErrorObjectOwned>;

    /// Returns the weight of an item type (0 if unconfigured).
    #[method(name = "ash_weightOf")]
    async fn weight_of(&self, item_id: u64) -> Result<u64, ErrorObjectOwned>;

    /// Returns an account's ash for a cycle, as a decimal string.
    #[method(name = "ash_userAshPerCycle")]
    async fn user_ash_per_cycle(&self, cycle: u64, account: String) -> Result<String, ErrorObjectOwned>;

    /// Returns the global ash for a cycle, as a decimal string.
    #[method(name = "ash_totalAshPerCycle")]
    async fn total_ash_per_cycle(&self, cycle: u64) -> Result<String, ErrorObjectOwned>;

    /// Returns an account's multiplier word and its parts.
    #[method(name = "ash_multiplierInfo")]
    async fn multiplier_info(&self, account: String) -> Result<MultiplierJson, ErrorObjectOwned>;

    /// Returns whether an unlock leaf has been consumed.
    #[method(name = "ash_isLeafConsumed")]
    async fn is_leaf_consumed(&self, leaf: String) -> Result<bool, ErrorObjectOwned>;

    /// Returns the unlock leaf of `(account, numerator)`.
    #[method(name = "ash_unlockLeaf")]
    async fn unlock_leaf(&self, account: String, numerator: String) -> Result<String, ErrorObjectOwned>;

    /// Performs a Merkle unlock of `account`'s numerator.
    #[method(name = "ash_unlock")]
    async fn unlock(
        &self,
        proof: Vec<String>,
        account: String,
        numerator: String,
    ) -> Result<MultiplierJson, ErrorObjectOwned>;

    /// Returns the pool's construction parameters.
    #[method(name = "ash_config")]
    async fn config(&self) -> Result<PoolConfig, ErrorObjectOwned>;

    /// Returns up to `limit` most recent committed events, oldest first.
    #[method(name = "ash_recentEvents")]
    async fn recent_events(&self, limit: usize) -> Result<Vec<PoolEvent>, ErrorObjectOwned>;
}

/// Implementation of the ash JSON-RPC server.
pub struct RpcServerImpl {
    node: Arc<Node>,
}

impl RpcServerImpl {
    /// Create a new RPC server implementation wrapping the given node.
    pub fn new(node: Arc<Node>) -> Self {
        Self { node }
    }
}

#[async_trait]
impl AshRpcServer for RpcServerImpl {
    async fn current_cycle(&self) -> Result<u64, ErrorObjectOwned> {
        self.node.pool().current_cycle().map_err(pool_error)
    }

    async fn cycle_window(&self, cycle: u64) -> Result<CycleWindowJson, ErrorObjectOwned> {
        let (start, end) = self.node.pool().cycle_window(cycle);
        Ok(CycleWindowJson { cycle, start, end })
    }

    async fn weight_of(&self, item_id: u64) -> Result<u64, ErrorObjectOwned> {
        Ok(self.node.pool().weight_of(item_id))
    }

    async fn user_ash_per_cycle(&self, cycle: u64, account: String) -> Result<String, ErrorObjectOwned> {
        let account = parse_address(&account)?;
        let ash = self
            .node
            .pool()
            .user_ash_per_cycle(cycle, &account)
            .map_err(pool_error)?;
        Ok(ash.to_string())
    }

    async fn total_ash_per_cycle(&self, cycle: u64) -> Result<String, ErrorObjectOwned> {
        let ash = self.node.pool().total_ash_per_cycle(cycle).map_err(pool_error)?;
        Ok(ash.to_string())
    }

    async fn multiplier_info(&self, account: String) -> Result<MultiplierJson, ErrorObjectOwned> {
        let account = parse_address(&account)?;
        let info = self.node.pool().multiplier_info(&account).map_err(pool_error)?;
        Ok(info.into())
    }

    async fn is_leaf_consumed(&self, leaf: String) -> Result<bool, ErrorObjectOwned> {
        let leaf = parse_hash(&leaf)?;
        self.node.pool().is_leaf_consumed(&leaf).map_err(pool_error)
    }

    async fn unlock_leaf(&self, account: String, numerator: String) -> Result<String, ErrorObjectOwned> {
        let account = parse_address(&account)?;
        let numerator = parse_u128(&numerator)?;
        Ok(self.node.pool().unlock_leaf(&account, numerator).to_string())
    }

    async fn unlock(
        &self,
        proof: Vec<String>,
        account: String,
        numerator: String,
    ) -> Result<MultiplierJson, ErrorObjectOwned> {
        let proof = proof
            .iter()
            .map(|s| parse_hash(s))
            .collect::<Result<Vec<_>, _>>()?;
        let account = parse_address(&account)?;
        let numerator = parse_u128(&numerator)?;
        let info = self
            .node
            .pool()
            .unlock(&proof, &account, numerator)
            .map_err(pool_error)?;
        Ok(info.into())
    }

    async fn config(&self) -> Result<PoolConfig, ErrorObjectOwned> {
        Ok(self.node.pool().config().clone())
    }

    async fn recent_events(&self, limit: usize) -> Result<Vec<PoolEvent>, ErrorObjectOwned> {
        if limit > MAX_RECENT_EVENTS {
            return Err(rpc_error(-8, "limit too large"));
        }
        Ok(self.node.events().recent(limit))
    }
}

/// Start the JSON-RPC server on the given address.
///
/// Returns a [`ServerHandle`] that can be used to stop the server.
pub async fn start_rpc_server(addr: &str, node: Arc<Node>) -> Result<ServerHandle, NodeError> {
    let server = Server::builder()
        .build(addr)
        .await
        .map_err(|e| NodeError::Rpc(e.to_string()))?;

    let rpc_impl = RpcServerImpl::new(node);
    let handle = server.start(rpc_impl.into_rpc());

    Ok(handle)
}
