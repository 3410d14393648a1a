//! Scripted in-process node for tests.
//!
//! Responses are keyed by method name and can be changed while the mock
//! is shared, so tests can flip a node between synced and failing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::{json, Value};

use crate::error::{RpcError, RpcResult};
use crate::gateway::{NodeRpc, RpcFuture};

#[derive(Debug, Clone)]
enum Script {
    Reply(RpcResult<Value>),
    /// Never completes, like a node that accepted the connection and hung.
    Hang,
}

/// A `NodeRpc` that answers from a per-method script.
///
/// Methods without a script answer with JSON-RPC "method not found",
/// which is what a node without the extended API returns.
#[derive(Debug, Default)]
pub struct MockNode {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_peers(self, peers: u64) -> Self {
        self.respond("net_peerCount", json!(format!("{peers:#x}")));
        self
    }

    pub fn with_sync(self, current: u64, highest: u64) -> Self {
        self.respond(
            "eth_syncing",
            json!({
                "startingBlock": "0x0",
                "currentBlock": format!("{current:#x}"),
                "highestBlock": format!("{highest:#x}"),
            }),
        );
        self
    }

    pub fn not_syncing(self) -> Self {
        self.respond("eth_syncing", json!(false));
        self
    }

    pub fn with_block_gap(self, low: u64, high: u64) -> Self {
        self.respond(
            "parity_chainStatus",
            json!({ "blockGap": [format!("{low:#x}"), format!("{high:#x}")] }),
        );
        self
    }

    /// Answer `method` with `result`.
    pub fn respond(&self, method: &str, result: Value) {
        self.set(method, Script::Reply(Ok(result)));
    }

    /// Fail `method` with `error`.
    pub fn fail(&self, method: &str, error: RpcError) {
        self.set(method, Script::Reply(Err(error)));
    }

    /// Make `method` block forever.
    pub fn hang(&self, method: &str) {
        self.set(method, Script::Hang);
    }

    /// Number of times `method` has been called.
    pub fn calls(&self, method: &str) -> usize {
        lock(&self.calls).get(method).copied().unwrap_or(0)
    }

    fn set(&self, method: &str, script: Script) {
        lock(&self.scripts).insert(method.to_string(), script);
    }
}

impl NodeRpc for MockNode {
    fn call<'a>(&'a self, method: &'a str, _params: Value) -> RpcFuture<'a, Value> {
        *lock(&self.calls).entry(method.to_string()).or_insert(0) += 1;
        let script = lock(&self.scripts).get(method).cloned();

        Box::pin(async move {
            match script {
                Some(Script::Reply(result)) => result,
                Some(Script::Hang) => std::future::pending().await,
                None => Err(RpcError::Server {
                    code: -32601,
                    message: format!("the method {method} does not exist/is not available"),
                }),
            }
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
