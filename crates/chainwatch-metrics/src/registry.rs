//! Gauge registry and Prometheus text exposition.
//!
//! Gauges are registered once at startup and handed out as cheap
//! cloneable handles. Writes are single atomic stores (last write wins),
//! so collectors and the renderer never contend on a lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

/// Errors raised while registering gauges.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("gauge {0:?} is already registered")]
    Duplicate(String),

    #[error("invalid metric name {0:?}")]
    InvalidName(String),
}

/// Handle to a registered gauge.
#[derive(Debug, Clone)]
pub struct Gauge {
    bits: Arc<AtomicU64>,
}

impl Gauge {
    fn new() -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(0f64.to_bits())),
        }
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

struct GaugeEntry {
    help: String,
    gauge: Gauge,
}

/// Process-wide set of named gauges.
///
/// Constructed once by the daemon and shared by `Arc` with the collectors
/// and the `/metrics` handler.
#[derive(Default)]
pub struct GaugeRegistry {
    gauges: RwLock<BTreeMap<String, GaugeEntry>>,
}

impl GaugeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gauge. Each name may be registered exactly once.
    pub fn register_gauge(&self, name: &str, help: &str) -> Result<Gauge, RegistryError> {
        if !is_valid_metric_name(name) {
            return Err(RegistryError::InvalidName(name.to_string()));
        }

        let mut gauges = self.gauges.write().unwrap_or_else(PoisonError::into_inner);
        if gauges.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        let gauge = Gauge::new();
        gauges.insert(
            name.to_string(),
            GaugeEntry {
                help: help.to_string(),
                gauge: gauge.clone(),
            },
        );
        debug!(gauge = %name, "gauge registered");
        Ok(gauge)
    }

    /// Current value of a registered gauge.
    pub fn value(&self, name: &str) -> Option<f64> {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        gauges.get(name).map(|entry| entry.gauge.get())
    }

    /// Registered gauge names, sorted.
    pub fn names(&self) -> Vec<String> {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        gauges.keys().cloned().collect()
    }

    /// Render every gauge in Prometheus text format, sorted by name.
    pub fn render(&self) -> String {
        let gauges = self.gauges.read().unwrap_or_else(PoisonError::into_inner);
        let mut out = String::new();

        for (name, entry) in gauges.iter() {
            out.push_str(&format!("# HELP {name} {}\n", escape_help(&entry.help)));
            out.push_str(&format!("# TYPE {name} gauge\n"));
            out.push_str(&format!("{name} {}\n", format_value(entry.gauge.get())));
        }

        out
    }
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Integral values print without a fraction (`-1`, `0`, `8`).
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        format!("{value}")
    }
}
