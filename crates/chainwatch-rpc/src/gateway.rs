//! The gateway seam between chainwatch and a node.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::error::RpcResult;
use crate::types::SyncProgress;

/// Boxed future returned by [`NodeRpc`] methods.
pub type RpcFuture<'a, T> = Pin<Box<dyn Future<Output = RpcResult<T>> + Send + 'a>>;

/// JSON-RPC access to a single node.
///
/// Implementations must be safe for concurrent use: the poller and every
/// readiness request share one instance behind an `Arc`.
pub trait NodeRpc: Send + Sync {
    /// Invoke `method` with positional `params` and return the raw `result`.
    fn call<'a>(&'a self, method: &'a str, params: Value) -> RpcFuture<'a, Value>;

    /// Query `eth_syncing`. `None` means the node is not syncing.
    fn sync_progress(&self) -> RpcFuture<'_, Option<SyncProgress>> {
        Box::pin(async move {
            let raw = self.call("eth_syncing", no_params()).await?;
            SyncProgress::from_value(raw)
        })
    }
}

/// Empty positional parameter list.
pub fn no_params() -> Value {
    Value::Array(Vec::new())
}
