use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

pub struct Metrics {
    started: Instant,
    simulator_ticks: AtomicU64,
    alerts_raised: AtomicU64,
    insight_requests: AtomicU64,
    insight_failures: AtomicU64,
    insight_rate_limited: AtomicU64,
    insight_quota_exhausted: AtomicU64,
    alert_actions: AtomicU64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub uptime_s: u64,
    pub simulator_ticks: u64,
    pub alerts_raised: u64,
    pub insight_requests: u64,
    pub insight_failures: u64,
    pub insight_rate_limited: u64,
    pub insight_quota_exhausted: u64,
    pub alert_actions: u64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            simulator_ticks: AtomicU64::new(0),
            alerts_raised: AtomicU64::new(0),
            insight_requests: AtomicU64::new(0),
            insight_failures: AtomicU64::new(0),
            insight_rate_limited: AtomicU64::new(0),
            insight_quota_exhausted: AtomicU64::new(0),
            alert_actions: AtomicU64::new(0),
        }
    }

    pub fn inc_simulator_ticks(&self) {
        self.simulator_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_alerts_raised(&self, n: u64) {
        self.alerts_raised.fetch_add(n, Ordering::Relaxed);
    }

    pub fn inc_insight_requests(&self) {
        self.insight_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_insight_failures(&self) {
        self.insight_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_insight_rate_limited(&self) {
        self.insight_rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_insight_quota_exhausted(&self) {
        self.insight_quota_exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_alert_actions(&self) {
        self.alert_actions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn simulator_ticks(&self) -> u64 {
        self.simulator_ticks.load(Ordering::Relaxed)
    }

    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised.load(Ordering::Relaxed)
    }

    pub fn insight_requests(&self) -> u64 {
        self.insight_requests.load(Ordering::Relaxed)
    }

    pub fn insight_failures(&self) -> u64 {
        self.insight_failures.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            uptime_s: self.started.elapsed().as_secs(),
            simulator_ticks: self.simulator_ticks(),
            alerts_raised: self.alerts_raised(),
            insight_requests: self.insight_requests(),
            insight_failures: self.insight_failures(),
            insight_rate_limited: self.insight_rate_limited.load(Ordering::Relaxed),
            insight_quota_exhausted: self.insight_quota_exhausted.load(Ordering::Relaxed),
            alert_actions: self.alert_actions.load(Ordering::Relaxed),
        }
    }
}
