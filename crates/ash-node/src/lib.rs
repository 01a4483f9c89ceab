//! # ash-node — Pool host: RocksDB, RPC, configuration, logging.
//!
//! Composes the ash pool into a running service:
//! - [`storage::RocksStore`] — persistent pool state backed by RocksDB
//! - [`node::Node`] — wires storage, the host ledger, and the event log
//! - [`rpc`] — JSON-RPC server for external access
//! - [`config::NodeConfig`] — layered node configuration
//! - [`logging::init_logging`] — tracing subscriber setup

pub mod config;
pub mod error;
pub mod logging;
pub mod node;
pub mod rpc;
pub mod storage;

pub use config::NodeConfig;
pub use error::NodeError;
pub use logging::init_logging;
pub use node::Node;
pub use rpc::start_rpc_server;
pub use storage::RocksStore;
