//! chainwatch-health — readiness checks for the monitored node.
//!
//! Readiness is evaluated fresh on every request from live RPC calls,
//! never from cached gauge values.
//!
//! # Policy
//!
//! ```text
//! remaining_blocks  (eth_syncing)         failure → not ready (fail-closed)
//! block_gap         (parity_chainStatus)  failure → gap 0     (fail-open)
//!
//! ready ⇔ remaining_blocks <= threshold ∧ block_gap == 0
//! ```
//!
//! The sync signal is mandatory; the gap signal comes from an extended
//! API many nodes lack, so its absence must not take a node out of
//! rotation.

pub mod readiness;

pub use readiness::{
    evaluate, ReadinessProbe, ReadinessVerdict, Reason, SyncSignal, DEFAULT_MAX_REMAINING_BLOCKS,
};
