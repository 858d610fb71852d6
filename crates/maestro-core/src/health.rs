use crate::config::HealthThresholds;
use crate::metrics::{AgentMetrics, MetricsStore};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Healthy,
    Warning,
    Critical,
}

impl Health {
    pub fn as_str(self) -> &'static str {
        match self {
            Health::Healthy => "healthy",
            Health::Warning => "warning",
            Health::Critical => "critical",
        }
    }
}

/// Classify against the two threshold tiers: critical trips first, then
/// warning, else healthy.
pub fn compute_health(metrics: &AgentMetrics, thresholds: &HealthThresholds) -> Health {
    let duration = metrics.avg_duration_seconds();
    if metrics.success_rate < thresholds.critical_success_rate
        || duration > thresholds.critical_duration_seconds
    {
        Health::Critical
    } else if metrics.success_rate < thresholds.warning_success_rate
        || duration > thresholds.warning_duration_seconds
    {
        Health::Warning
    } else {
        Health::Healthy
    }
}

// ---------------------------------------------------------------------------
// Error trend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorTrend {
    Increasing,
    Stable,
    Decreasing,
}

/// Slope of the last 5 recorded error rates: the delta between the newest
/// and oldest sample of that window, banded at ±0.05. Needs at least 5
/// samples — fewer yields `None` rather than a guess.
pub fn compute_error_trend(history: &[f64]) -> Option<ErrorTrend> {
    if history.len() < 5 {
        return None;
    }
    let window = &history[history.len() - 5..];
    let delta = window[4] - window[0];
    Some(if delta > 0.05 {
        ErrorTrend::Increasing
    } else if delta < -0.05 {
        ErrorTrend::Decreasing
    } else {
        ErrorTrend::Stable
    })
}

// ---------------------------------------------------------------------------
// HealthMonitor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub health: Health,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_trend: Option<ErrorTrend>,
}

/// Periodic health sweeps, independent of the executor's real-time path.
/// Each sweep samples every agent's current error rate into a bounded
/// history and reclassifies.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    history: HashMap<String, Vec<f64>>,
}

/// Samples kept per agent.
const HISTORY_CAP: usize = 50;

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sweep(
        &mut self,
        store: &MetricsStore,
        thresholds: &HealthThresholds,
    ) -> BTreeMap<String, HealthStatus> {
        let mut statuses = BTreeMap::new();
        for (agent_id, metrics) in store.iter() {
            let history = self.history.entry(agent_id.to_string()).or_default();
            history.push(metrics.error_rate());
            if history.len() > HISTORY_CAP {
                let excess = history.len() - HISTORY_CAP;
                history.drain(..excess);
            }

            statuses.insert(
                agent_id.to_string(),
                HealthStatus {
                    health: compute_health(metrics, thresholds),
                    error_trend: compute_error_trend(history),
                },
            );
        }
        statuses
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn metrics(success_rate: f64, avg_duration_ms: f64) -> AgentMetrics {
        AgentMetrics {
            total_runs: 100,
            success_rate,
            avg_duration_ms,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn healthy_within_both_tiers() {
        let t = HealthThresholds::default();
        assert_eq!(compute_health(&metrics(0.95, 30_000.0), &t), Health::Healthy);
    }

    #[test]
    fn warning_tier() {
        let t = HealthThresholds::default();
        assert_eq!(compute_health(&metrics(0.80, 30_000.0), &t), Health::Warning);
        assert_eq!(compute_health(&metrics(0.95, 90_000.0), &t), Health::Warning);
    }

    #[test]
    fn critical_tier_trips_first() {
        let t = HealthThresholds::default();
        assert_eq!(compute_health(&metrics(0.60, 30_000.0), &t), Health::Critical);
        assert_eq!(compute_health(&metrics(0.95, 150_000.0), &t), Health::Critical);
        // Both tiers violated — critical wins.
        assert_eq!(compute_health(&metrics(0.50, 150_000.0), &t), Health::Critical);
    }

    #[test]
    fn trend_needs_five_samples() {
        assert_eq!(compute_error_trend(&[0.1, 0.2, 0.3, 0.4]), None);
    }

    #[test]
    fn trend_bands() {
        assert_eq!(
            compute_error_trend(&[0.10, 0.12, 0.14, 0.18, 0.30]),
            Some(ErrorTrend::Increasing)
        );
        assert_eq!(
            compute_error_trend(&[0.30, 0.25, 0.20, 0.15, 0.10]),
            Some(ErrorTrend::Decreasing)
        );
        assert_eq!(
            compute_error_trend(&[0.10, 0.20, 0.05, 0.12, 0.13]),
            Some(ErrorTrend::Stable)
        );
    }

    #[test]
    fn trend_uses_most_recent_window() {
        // Older samples outside the window must not matter.
        let history = [0.9, 0.9, 0.10, 0.10, 0.10, 0.10, 0.10];
        assert_eq!(compute_error_trend(&history), Some(ErrorTrend::Stable));
    }

    #[test]
    fn sweep_tracks_history_per_agent() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = MetricsStore::load_from(&dir.path().join("m.json")).unwrap();
        store.record_execution("a", false, 1000);

        let thresholds = HealthThresholds::default();
        let mut monitor = HealthMonitor::new();
        for _ in 0..4 {
            let statuses = monitor.sweep(&store, &thresholds);
            assert!(statuses["a"].error_trend.is_none());
        }
        let statuses = monitor.sweep(&store, &thresholds);
        // Five identical samples: stable.
        assert_eq!(statuses["a"].error_trend, Some(ErrorTrend::Stable));
        assert_eq!(statuses["a"].health, Health::Critical);
    }
}
