//! chainwatch-metrics — node health gauges for Prometheus.
//!
//! Polls the node on a fixed interval, translates each RPC signal into a
//! gauge value, and renders the registry in Prometheus text exposition
//! format for the `/metrics` endpoint.
//!
//! # Architecture
//!
//! ```text
//! Poller
//!   └── run() → every 5s, spawn each Collector independently
//!         ├── PeerCountCollector       → web3_net_peerCount
//!         ├── SyncCollector            → web3_eth_syncing_remaining_blocks
//!         └── BlockGapCollector (opt)  → web3_block_gap
//!
//! GaugeRegistry
//!   ├── register_gauge() → Gauge handle (once, at startup)
//!   └── render() → text/plain for /metrics
//! ```
//!
//! A gauge value of `-1` means the last collection attempt failed. It is
//! never a real reading.

pub mod collector;
pub mod poller;
pub mod registry;

pub use collector::{
    standard_collectors, Collector, Outcome, Reading, BLOCK_GAP_GAUGE, FAILED_SENTINEL,
    PEER_COUNT_GAUGE, REMAINING_BLOCKS_GAUGE,
};
pub use poller::{Poller, POLL_INTERVAL};
pub use registry::{Gauge, GaugeRegistry, RegistryError};
