//! chainwatch-rpc — JSON-RPC access to the monitored node.
//!
//! Provides the `NodeRpc` gateway trait, an HTTP implementation backed by
//! hyper's pooled client, decoding of the node's hex quantity encoding,
//! and the three health signals the rest of chainwatch consumes.
//!
//! # Architecture
//!
//! ```text
//! NodeRpc (trait)
//!   ├── call(method, params) → serde_json::Value
//!   └── sync_progress() → Option<SyncProgress>   (eth_syncing)
//!
//! RpcClient: NodeRpc
//!   └── POST JSON-RPC 2.0 over hyper, per-request timeout
//!
//! signals
//!   ├── peer_count()        net_peerCount
//!   ├── remaining_blocks()  eth_syncing
//!   └── block_gap()         parity_chainStatus
//! ```
//!
//! Transport failures and decode failures surface as the same `RpcError`
//! type so callers can apply one policy to both.

pub mod client;
pub mod error;
pub mod gateway;
pub mod signals;
pub mod types;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::RpcClient;
pub use error::{RpcError, RpcResult};
pub use gateway::{NodeRpc, RpcFuture};
pub use types::{ChainStatus, SyncProgress};
