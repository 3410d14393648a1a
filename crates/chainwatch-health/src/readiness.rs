//! Readiness evaluation.
//!
//! `evaluate` is the pure decision; `ReadinessProbe` gathers the signals
//! from the node and feeds them to it.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use chainwatch_rpc::{signals, NodeRpc};

/// Default tolerated lag before the node is considered not ready.
pub const DEFAULT_MAX_REMAINING_BLOCKS: u64 = 10;

/// Sync lag as seen by the readiness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncSignal {
    Remaining(u64),
    /// The node could not be asked or its answer could not be decoded.
    Unavailable,
}

/// Why a verdict came out the way it did. Logged, never returned to
/// HTTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Synced { remaining: u64 },
    SyncUnavailable,
    Behind { remaining: u64, threshold: u64 },
    BlockGap { gap: u64 },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Synced { remaining } => write!(f, "synced ({remaining} blocks remaining)"),
            Reason::SyncUnavailable => write!(f, "sync progress unavailable"),
            Reason::Behind {
                remaining,
                threshold,
            } => write!(f, "{remaining} blocks remaining exceeds threshold {threshold}"),
            Reason::BlockGap { gap } => write!(f, "block gap of {gap} blocks"),
        }
    }
}

/// Binary readiness decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessVerdict {
    pub ready: bool,
    pub reason: Reason,
}

impl ReadinessVerdict {
    pub fn status_code(&self) -> u16 {
        if self.ready { 200 } else { 500 }
    }

    pub fn body(&self) -> &'static str {
        if self.ready { "OK" } else { "error: syncing" }
    }
}

/// Decide readiness from the collected signals.
///
/// The threshold is inclusive: `remaining == threshold` is ready.
pub fn evaluate(sync: SyncSignal, gap: u64, threshold: u64) -> ReadinessVerdict {
    let reason = match sync {
        SyncSignal::Unavailable => Reason::SyncUnavailable,
        SyncSignal::Remaining(remaining) if remaining > threshold => Reason::Behind {
            remaining,
            threshold,
        },
        SyncSignal::Remaining(_) if gap > 0 => Reason::BlockGap { gap },
        SyncSignal::Remaining(remaining) => Reason::Synced { remaining },
    };

    ReadinessVerdict {
        ready: matches!(reason, Reason::Synced { .. }),
        reason,
    }
}

/// Live readiness check against the node.
#[derive(Clone)]
pub struct ReadinessProbe {
    rpc: Arc<dyn NodeRpc>,
    max_remaining_blocks: u64,
    block_gap: bool,
}

impl ReadinessProbe {
    pub fn new(rpc: Arc<dyn NodeRpc>) -> Self {
        Self {
            rpc,
            max_remaining_blocks: DEFAULT_MAX_REMAINING_BLOCKS,
            block_gap: false,
        }
    }

    pub fn with_max_remaining_blocks(mut self, max_remaining_blocks: u64) -> Self {
        self.max_remaining_blocks = max_remaining_blocks;
        self
    }

    /// Also require a zero `parity_chainStatus` block gap.
    pub fn with_block_gap(mut self, enabled: bool) -> Self {
        self.block_gap = enabled;
        self
    }

    pub fn max_remaining_blocks(&self) -> u64 {
        self.max_remaining_blocks
    }

    /// Query the node and evaluate readiness.
    pub async fn check(&self) -> ReadinessVerdict {
        let sync = match signals::remaining_blocks(self.rpc.as_ref()).await {
            Ok(remaining) => SyncSignal::Remaining(remaining),
            Err(e) => {
                warn!(error = %e, "readiness: sync progress unavailable");
                SyncSignal::Unavailable
            }
        };

        // Not ready regardless of the gap; skip the second call.
        if sync == SyncSignal::Unavailable {
            return evaluate(sync, 0, self.max_remaining_blocks);
        }

        let gap = if self.block_gap {
            match signals::block_gap(self.rpc.as_ref()).await {
                Ok(gap) => gap,
                Err(e) => {
                    warn!(error = %e, "readiness: chain status unavailable, assuming no gap");
                    0
                }
            }
        } else {
            0
        };

        let verdict = evaluate(sync, gap, self.max_remaining_blocks);
        debug!(ready = verdict.ready, reason = %verdict.reason, "readiness evaluated");
        verdict
    }
}
