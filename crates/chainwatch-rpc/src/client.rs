//! JSON-RPC 2.0 over HTTP.
//!
//! Uses hyper's pooled legacy client, which is `Clone + Send + Sync`, so
//! one `RpcClient` can serve the poller and concurrent readiness requests
//! without extra locking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, USER_AGENT};
use http::{Method, Request, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{RpcError, RpcResult};
use crate::gateway::{NodeRpc, RpcFuture};

/// Default upper bound on a single RPC round trip.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcErrorObject {
    code: i64,
    #[serde(default)]
    message: String,
}

/// HTTP JSON-RPC client for one node endpoint.
#[derive(Clone)]
pub struct RpcClient {
    endpoint: Uri,
    http: Client<HttpConnector, Full<Bytes>>,
    timeout: Duration,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Create a client with the default request timeout.
    pub fn new(endpoint: &str) -> RpcResult<Self> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    /// Create a client whose calls fail with `Timeout` after `timeout`.
    ///
    /// Only the endpoint is validated here; no connection is opened until
    /// the first call.
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> RpcResult<Self> {
        let endpoint = parse_endpoint(endpoint)?;
        let http = Client::builder(TokioExecutor::new()).build_http();

        Ok(Self {
            endpoint,
            http,
            timeout,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn endpoint(&self) -> &Uri {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn round_trip(&self, method: &str, params: Value) -> RpcResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = serde_json::to_vec(&JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        })
        .map_err(|e| RpcError::Encode(e.to_string()))?;

        let req = Request::builder()
            .method(Method::POST)
            .uri(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, concat!("chainwatch/", env!("CARGO_PKG_VERSION")))
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| RpcError::Encode(e.to_string()))?;

        trace!(%method, id, "rpc request");

        let resp = self
            .http
            .request(req)
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            debug!(%method, %status, "rpc non-2xx");
            return Err(RpcError::Status(status.as_u16()));
        }

        let bytes = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| RpcError::Transport(e.to_string()))?
            .to_bytes();

        decode_response(&bytes, id)
    }
}

impl NodeRpc for RpcClient {
    fn call<'a>(&'a self, method: &'a str, params: Value) -> RpcFuture<'a, Value> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.round_trip(method, params)).await {
                Ok(result) => result,
                Err(_) => {
                    debug!(%method, timeout = ?self.timeout, "rpc timed out");
                    Err(RpcError::Timeout(self.timeout))
                }
            }
        })
    }
}

impl fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcClient")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Validate a provider URL. Only plain `http` endpoints are supported.
fn parse_endpoint(endpoint: &str) -> RpcResult<Uri> {
    let invalid = |reason: String| RpcError::InvalidEndpoint {
        endpoint: endpoint.to_string(),
        reason,
    };

    let uri: Uri = endpoint.parse().map_err(|e: http::uri::InvalidUri| invalid(e.to_string()))?;

    match uri.scheme_str() {
        Some("http") => {}
        Some(other) => return Err(invalid(format!("unsupported scheme {other:?}"))),
        None => return Err(invalid("missing scheme".to_string())),
    }
    if uri.authority().is_none() {
        return Err(invalid("missing host".to_string()));
    }

    Ok(uri)
}

/// Extract `result` from a JSON-RPC response body answering request `id`.
fn decode_response(bytes: &[u8], id: u64) -> RpcResult<Value> {
    let value: Value = serde_json::from_slice(bytes)
        .map_err(|e| RpcError::Decode(format!("invalid JSON-RPC response: {e}")))?;

    let Value::Object(mut obj) = value else {
        return Err(RpcError::Decode(
            "JSON-RPC response is not an object".to_string(),
        ));
    };

    match obj.remove("error") {
        None | Some(Value::Null) => {}
        Some(err) => {
            return Err(match serde_json::from_value::<JsonRpcErrorObject>(err.clone()) {
                Ok(e) => RpcError::Server {
                    code: e.code,
                    message: e.message,
                },
                Err(_) => RpcError::Decode(format!("malformed JSON-RPC error {err}")),
            });
        }
    }

    // Error replies may carry a null id; successful ones must echo ours.
    match obj.get("id").and_then(Value::as_u64) {
        Some(got) if got == id => {}
        _ => {
            return Err(RpcError::Decode(format!(
                "JSON-RPC response id {} does not match request id {id}",
                obj.get("id").unwrap_or(&Value::Null)
            )));
        }
    }

    obj.remove("result")
        .ok_or_else(|| RpcError::Decode("JSON-RPC response has no result".to_string()))
}
