// Metrics hooks for the `matcher` crate.
//
// Callers install a global `ScanMetrics` implementation via [`set_scan_metrics`];
// index builds and per-example classification then report latency and outcome.
// No metrics backend is linked here.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::types::{BuildStats, MatchType};

/// Metrics observer for index builds and scans.
pub trait ScanMetrics: Send + Sync {
    /// Called once when [`IndexBuilder::build`](crate::IndexBuilder::build)
    /// finishes. `latency` spans builder creation to build.
    fn record_build(&self, stats: &BuildStats, latency: Duration);

    /// Called once per classified benchmark example. `match_type` is `None`
    /// for clean examples.
    fn record_example(&self, match_type: Option<MatchType>, latency: Duration);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn ScanMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn ScanMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn ScanMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global scan metrics recorder.
pub fn set_scan_metrics(recorder: Option<Arc<dyn ScanMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
