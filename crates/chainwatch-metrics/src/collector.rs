//! Node collectors — one per exported gauge.
//!
//! Each collector calls the node, turns the answer into a [`Reading`],
//! and writes it to its gauge. Failures are flattened to the `-1`
//! sentinel only at that final write.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, warn};

use chainwatch_rpc::{signals, NodeRpc, RpcResult};

use crate::registry::{Gauge, GaugeRegistry, RegistryError};

pub const PEER_COUNT_GAUGE: &str = "web3_net_peerCount";
pub const REMAINING_BLOCKS_GAUGE: &str = "web3_eth_syncing_remaining_blocks";
pub const BLOCK_GAP_GAUGE: &str = "web3_block_gap";

/// Gauge value written when a collection attempt fails.
pub const FAILED_SENTINEL: f64 = -1.0;

/// Outcome of reading one signal from the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    Value(u64),
    Failed,
}

impl Reading {
    /// The number written to the gauge.
    pub fn gauge_value(self) -> f64 {
        match self {
            Reading::Value(v) => v as f64,
            Reading::Failed => FAILED_SENTINEL,
        }
    }
}

/// What a collector did to its gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The gauge was overwritten.
    Recorded(Reading),
    /// The gauge was left at its previous value.
    Retained,
}

/// Future returned by [`Collector::collect`]. Owns everything it needs so
/// it can be spawned as its own task.
pub type CollectFuture = Pin<Box<dyn Future<Output = Outcome> + Send + 'static>>;

/// A single node signal published as a gauge.
pub trait Collector: Send + Sync {
    /// Name of the gauge this collector writes.
    fn gauge_name(&self) -> &'static str;

    /// Query the node once and update the gauge.
    fn collect(&self, rpc: Arc<dyn NodeRpc>) -> CollectFuture;
}

/// `net_peerCount` → `web3_net_peerCount`.
pub struct PeerCountCollector {
    gauge: Gauge,
}

impl PeerCountCollector {
    pub fn register(registry: &GaugeRegistry) -> Result<Self, RegistryError> {
        let gauge = registry.register_gauge(PEER_COUNT_GAUGE, "The number of connected peers")?;
        Ok(Self { gauge })
    }
}

impl Collector for PeerCountCollector {
    fn gauge_name(&self) -> &'static str {
        PEER_COUNT_GAUGE
    }

    fn collect(&self, rpc: Arc<dyn NodeRpc>) -> CollectFuture {
        let gauge = self.gauge.clone();
        Box::pin(async move {
            let reading = to_reading(PEER_COUNT_GAUGE, signals::peer_count(rpc.as_ref()).await);
            gauge.set(reading.gauge_value());
            Outcome::Recorded(reading)
        })
    }
}

/// `eth_syncing` → `web3_eth_syncing_remaining_blocks`.
///
/// A node that is not syncing records `0`, same as one that has caught up.
pub struct SyncCollector {
    gauge: Gauge,
}

impl SyncCollector {
    pub fn register(registry: &GaugeRegistry) -> Result<Self, RegistryError> {
        let gauge = registry.register_gauge(REMAINING_BLOCKS_GAUGE, "Blocks remaining to sync")?;
        Ok(Self { gauge })
    }
}

impl Collector for SyncCollector {
    fn gauge_name(&self) -> &'static str {
        REMAINING_BLOCKS_GAUGE
    }

    fn collect(&self, rpc: Arc<dyn NodeRpc>) -> CollectFuture {
        let gauge = self.gauge.clone();
        Box::pin(async move {
            let result = signals::remaining_blocks(rpc.as_ref()).await;
            let reading = to_reading(REMAINING_BLOCKS_GAUGE, result);
            gauge.set(reading.gauge_value());
            Outcome::Recorded(reading)
        })
    }
}

/// `parity_chainStatus` → `web3_block_gap`.
///
/// Many nodes do not implement the extended API, so a failed call keeps
/// the previous value rather than writing the sentinel.
pub struct BlockGapCollector {
    gauge: Gauge,
}

impl BlockGapCollector {
    pub fn register(registry: &GaugeRegistry) -> Result<Self, RegistryError> {
        let gauge = registry.register_gauge(
            BLOCK_GAP_GAUGE,
            "Block gap, the remaining warp sync blocks",
        )?;
        Ok(Self { gauge })
    }
}

impl Collector for BlockGapCollector {
    fn gauge_name(&self) -> &'static str {
        BLOCK_GAP_GAUGE
    }

    fn collect(&self, rpc: Arc<dyn NodeRpc>) -> CollectFuture {
        let gauge = self.gauge.clone();
        Box::pin(async move {
            match signals::block_gap(rpc.as_ref()).await {
                Ok(gap) => {
                    gauge.set(gap as f64);
                    debug!(gauge = BLOCK_GAP_GAUGE, value = gap, "collected");
                    Outcome::Recorded(Reading::Value(gap))
                }
                Err(e) => {
                    warn!(gauge = BLOCK_GAP_GAUGE, error = %e, "chain status unavailable, keeping previous value");
                    Outcome::Retained
                }
            }
        })
    }
}

fn to_reading(gauge: &'static str, result: RpcResult<u64>) -> Reading {
    match result {
        Ok(value) => {
            debug!(gauge, value, "collected");
            Reading::Value(value)
        }
        Err(e) => {
            warn!(gauge, error = %e, "collection failed");
            Reading::Failed
        }
    }
}

/// Register the gauges and build the collectors chainwatch exports.
///
/// `web3_block_gap` is only registered when `block_gap` is enabled.
pub fn standard_collectors(
    registry: &GaugeRegistry,
    block_gap: bool,
) -> Result<Vec<Arc<dyn Collector>>, RegistryError> {
    let mut collectors: Vec<Arc<dyn Collector>> = vec![
        Arc::new(PeerCountCollector::register(registry)?),
        Arc::new(SyncCollector::register(registry)?),
    ];
    if block_gap {
        collectors.push(Arc::new(BlockGapCollector::register(registry)?));
    }
    Ok(collectors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainwatch_rpc::mock::MockNode;
    use chainwatch_rpc::RpcError;
    use std::time::Duration;

    fn node(mock: MockNode) -> (Arc<MockNode>, Arc<dyn NodeRpc>) {
        let mock = Arc::new(mock);
        let rpc: Arc<dyn NodeRpc> = mock.clone();
        (mock, rpc)
    }

    #[test]
    fn reading_flattens_to_sentinel() {
        assert_eq!(Reading::Value(0).gauge_value(), 0.0);
        assert_eq!(Reading::Value(42).gauge_value(), 42.0);
        assert_eq!(Reading::Failed.gauge_value(), -1.0);
    }

    #[tokio::test]
    async fn peer_count_recorded() {
        let registry = GaugeRegistry::new();
        let collector = PeerCountCollector::register(&registry).unwrap();
        let (_, rpc) = node(MockNode::new().with_peers(12));

        let outcome = collector.collect(rpc).await;
        assert_eq!(outcome, Outcome::Recorded(Reading::Value(12)));
        assert_eq!(registry.value(PEER_COUNT_GAUGE), Some(12.0));
    }

    #[tokio::test]
    async fn peer_timeout_writes_sentinel_only_to_peer_gauge() {
        let registry = GaugeRegistry::new();
        let collectors = standard_collectors(&registry, true).unwrap();
        let (mock, rpc) = node(MockNode::new().with_peers(7).with_sync(100, 108).with_block_gap(5, 5));

        for c in &collectors {
            c.collect(Arc::clone(&rpc)).await;
        }
        assert_eq!(registry.value(PEER_COUNT_GAUGE), Some(7.0));

        mock.fail("net_peerCount", RpcError::Timeout(Duration::from_secs(10)));
        for c in &collectors {
            c.collect(Arc::clone(&rpc)).await;
        }

        assert_eq!(registry.value(PEER_COUNT_GAUGE), Some(-1.0));
        assert_eq!(registry.value(REMAINING_BLOCKS_GAUGE), Some(8.0));
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(0.0));
        assert!(registry.render().contains("web3_net_peerCount -1\n"));
    }

    #[tokio::test]
    async fn malformed_peer_count_writes_sentinel() {
        let registry = GaugeRegistry::new();
        let collector = PeerCountCollector::register(&registry).unwrap();
        let (mock, rpc) = node(MockNode::new());
        mock.respond("net_peerCount", serde_json::json!(25));

        assert_eq!(collector.collect(rpc).await, Outcome::Recorded(Reading::Failed));
        assert_eq!(registry.value(PEER_COUNT_GAUGE), Some(-1.0));
    }

    #[tokio::test]
    async fn sync_remaining_blocks_recorded() {
        let registry = GaugeRegistry::new();
        let collector = SyncCollector::register(&registry).unwrap();
        let (_, rpc) = node(MockNode::new().with_sync(100, 115));

        collector.collect(rpc).await;
        assert_eq!(registry.value(REMAINING_BLOCKS_GAUGE), Some(15.0));
    }

    #[tokio::test]
    async fn not_syncing_records_zero_not_sentinel() {
        let registry = GaugeRegistry::new();
        let collector = SyncCollector::register(&registry).unwrap();
        let (_, rpc) = node(MockNode::new().not_syncing());

        assert_eq!(
            collector.collect(rpc).await,
            Outcome::Recorded(Reading::Value(0))
        );
        assert_eq!(registry.value(REMAINING_BLOCKS_GAUGE), Some(0.0));
    }

    #[tokio::test]
    async fn sync_failure_writes_sentinel() {
        let registry = GaugeRegistry::new();
        let collector = SyncCollector::register(&registry).unwrap();
        let (mock, rpc) = node(MockNode::new().with_sync(1, 3));

        collector.collect(Arc::clone(&rpc)).await;
        assert_eq!(registry.value(REMAINING_BLOCKS_GAUGE), Some(2.0));

        mock.fail("eth_syncing", RpcError::Transport("connection refused".into()));
        collector.collect(rpc).await;
        assert_eq!(registry.value(REMAINING_BLOCKS_GAUGE), Some(-1.0));
    }

    #[tokio::test]
    async fn block_gap_recorded() {
        let registry = GaugeRegistry::new();
        let collector = BlockGapCollector::register(&registry).unwrap();
        let (_, rpc) = node(MockNode::new().with_block_gap(50, 52));

        collector.collect(rpc).await;
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(2.0));
    }

    #[tokio::test]
    async fn malformed_gap_array_records_zero() {
        let registry = GaugeRegistry::new();
        let collector = BlockGapCollector::register(&registry).unwrap();
        let (mock, rpc) = node(MockNode::new());
        mock.respond(
            "parity_chainStatus",
            serde_json::json!({ "blockGap": ["0x32", "0x34", "0x36"] }),
        );

        assert_eq!(
            collector.collect(rpc).await,
            Outcome::Recorded(Reading::Value(0))
        );
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(0.0));
    }

    #[tokio::test]
    async fn block_gap_failure_keeps_previous_value() {
        let registry = GaugeRegistry::new();
        let collector = BlockGapCollector::register(&registry).unwrap();
        let (mock, rpc) = node(MockNode::new().with_block_gap(10, 40));

        collector.collect(Arc::clone(&rpc)).await;
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(30.0));

        mock.fail("parity_chainStatus", RpcError::Transport("reset".into()));
        assert_eq!(collector.collect(rpc).await, Outcome::Retained);
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(30.0));
    }

    #[tokio::test]
    async fn unsupported_chain_status_never_writes_sentinel() {
        let registry = GaugeRegistry::new();
        let collector = BlockGapCollector::register(&registry).unwrap();
        let (_, rpc) = node(MockNode::new());

        assert_eq!(collector.collect(rpc).await, Outcome::Retained);
        assert_eq!(registry.value(BLOCK_GAP_GAUGE), Some(0.0));
    }

    #[test]
    fn standard_collectors_register_expected_gauges() {
        let registry = GaugeRegistry::new();
        let collectors = standard_collectors(&registry, false).unwrap();
        assert_eq!(collectors.len(), 2);
        assert_eq!(
            registry.names(),
            vec![REMAINING_BLOCKS_GAUGE.to_string(), PEER_COUNT_GAUGE.to_string()]
        );

        let registry = GaugeRegistry::new();
        let collectors = standard_collectors(&registry, true).unwrap();
        let names: Vec<_> = collectors.iter().map(|c| c.gauge_name()).collect();
        assert_eq!(names, vec![PEER_COUNT_GAUGE, REMAINING_BLOCKS_GAUGE, BLOCK_GAP_GAUGE]);
        assert_eq!(registry.names().len(), 3);
    }

    #[test]
    fn standard_collectors_twice_is_duplicate() {
        let registry = GaugeRegistry::new();
        standard_collectors(&registry, false).unwrap();
        assert!(matches!(
            standard_collectors(&registry, false),
            Err(RegistryError::Duplicate(_))
        ));
    }
}
