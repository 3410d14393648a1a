//! HTTP handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::debug;

use crate::ApiState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = state.registry.render();
    (
        StatusCode::OK,
        [("content-type", PROMETHEUS_CONTENT_TYPE)],
        body,
    )
}

/// GET /health/alive
pub async fn alive() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health/ready
pub async fn ready(State(state): State<ApiState>) -> impl IntoResponse {
    let verdict = state.readiness.check().await;
    let status = if verdict.ready {
        StatusCode::OK
    } else {
        debug!(reason = %verdict.reason, "not ready");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, verdict.body())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chainwatch_health::ReadinessProbe;
    use chainwatch_metrics::GaugeRegistry;
    use chainwatch_rpc::mock::MockNode;
    use chainwatch_rpc::{NodeRpc, RpcError};

    fn test_state(mock: MockNode) -> ApiState {
        let rpc: Arc<dyn NodeRpc> = Arc::new(mock);
        ApiState {
            registry: Arc::new(GaugeRegistry::new()),
            readiness: ReadinessProbe::new(rpc),
        }
    }

    #[tokio::test]
    async fn alive_is_ok() {
        let resp = alive().await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_text() {
        let state = test_state(MockNode::new());
        state
            .registry
            .register_gauge("web3_net_peerCount", "The number of connected peers")
            .unwrap();

        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));
    }

    #[tokio::test]
    async fn ready_when_synced() {
        let state = test_state(MockNode::new().with_sync(100, 108));
        let resp = ready(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn not_ready_when_behind() {
        let state = test_state(MockNode::new().with_sync(100, 115));
        let resp = ready(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn not_ready_when_node_unreachable() {
        let mock = MockNode::new();
        mock.fail("eth_syncing", RpcError::Transport("connection refused".into()));
        let resp = ready(State(test_state(mock))).await.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
