//! Health signals derived from node RPC responses.
//!
//! Shared by the background collectors and the readiness check so both
//! interpret the node the same way.

use crate::error::RpcResult;
use crate::gateway::{no_params, NodeRpc};
use crate::types::{decode_quantity, ChainStatus};

/// Standard peer-count method.
pub const PEER_COUNT_METHOD: &str = "net_peerCount";

/// Extended chain status method (Parity/OpenEthereum).
pub const CHAIN_STATUS_METHOD: &str = "parity_chainStatus";

/// Number of peers the node is connected to.
pub async fn peer_count(rpc: &dyn NodeRpc) -> RpcResult<u64> {
    let raw = rpc.call(PEER_COUNT_METHOD, no_params()).await?;
    decode_quantity(&raw)
}

/// Blocks left to sync. A node that is not syncing has zero remaining.
pub async fn remaining_blocks(rpc: &dyn NodeRpc) -> RpcResult<u64> {
    let progress = rpc.sync_progress().await?;
    Ok(progress.map_or(0, |p| p.remaining_blocks()))
}

/// Size of the warp-sync block gap, `0` when none is reported.
pub async fn block_gap(rpc: &dyn NodeRpc) -> RpcResult<u64> {
    let raw = rpc.call(CHAIN_STATUS_METHOD, no_params()).await?;
    Ok(ChainStatus::from_value(raw)?.gap_size())
}
