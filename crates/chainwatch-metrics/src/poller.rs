//! Poll loop — drives the collectors on a fixed interval.
//!
//! Every tick spawns each collector as its own task and does not wait for
//! it, so a node that hangs on one method only stalls that gauge. Ticks
//! may overlap a slow previous tick; collectors are idempotent writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use chainwatch_rpc::NodeRpc;

use crate::collector::{Collector, Outcome};

/// Interval between collection ticks.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Runs the node collectors periodically.
pub struct Poller {
    rpc: Arc<dyn NodeRpc>,
    collectors: Vec<Arc<dyn Collector>>,
    interval: Duration,
}

impl Poller {
    pub fn new(rpc: Arc<dyn NodeRpc>, collectors: Vec<Arc<dyn Collector>>) -> Self {
        Self {
            rpc,
            collectors,
            interval: POLL_INTERVAL,
        }
    }

    /// Override the tick interval (for testing).
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Spawn one task per collector.
    fn dispatch(&self) -> Vec<(&'static str, JoinHandle<Outcome>)> {
        self.collectors
            .iter()
            .map(|collector| {
                let fut = collector.collect(Arc::clone(&self.rpc));
                (collector.gauge_name(), tokio::spawn(fut))
            })
            .collect()
    }

    /// Run every collector once, concurrently, and wait for all of them.
    pub async fn collect_once(&self) -> Vec<(&'static str, Outcome)> {
        let mut outcomes = Vec::with_capacity(self.collectors.len());
        for (gauge, handle) in self.dispatch() {
            match handle.await {
                Ok(outcome) => outcomes.push((gauge, outcome)),
                Err(e) => error!(%gauge, error = %e, "collector task failed"),
            }
        }
        outcomes
    }

    /// Run the poll loop until shutdown signal. The first tick fires
    /// immediately.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.interval.as_secs(),
            collectors = self.collectors.len(),
            "poller started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // Handles are dropped: the tasks stay detached.
                    let spawned = self.dispatch().len();
                    debug!(spawned, "poll tick");
                }
                _ = shutdown.changed() => {
                    info!("poller shutting down");
                    break;
                }
            }
        }
    }
}
