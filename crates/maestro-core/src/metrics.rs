use crate::error::{MaestroError, Result};
use crate::executor::{AgentRun, ExecutionObserver};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// AgentMetrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub total_runs: u64,
    /// Running average in [0,1], rounded to 2 decimals on every update.
    pub success_rate: f64,
    /// Exact running average in milliseconds; kept unrounded so repeated
    /// updates don't accumulate rounding error.
    pub avg_duration_ms: f64,
    pub last_updated: DateTime<Utc>,
}

impl AgentMetrics {
    fn new() -> Self {
        Self {
            total_runs: 0,
            success_rate: 0.0,
            avg_duration_ms: 0.0,
            last_updated: Utc::now(),
        }
    }

    /// Average duration as whole seconds.
    pub fn avg_duration_seconds(&self) -> u64 {
        (self.avg_duration_ms / 1000.0).round() as u64
    }

    /// Error rate complement, used for trend history.
    pub fn error_rate(&self) -> f64 {
        1.0 - self.success_rate
    }

    fn record(&mut self, success: bool, duration_ms: u64) {
        let n = self.total_runs + 1;
        let hit = if success { 1.0 } else { 0.0 };
        self.success_rate =
            round2((self.success_rate * (n as f64 - 1.0) + hit) / n as f64);
        self.avg_duration_ms =
            (self.avg_duration_ms * (n as f64 - 1.0) + duration_ms as f64) / n as f64;
        self.total_runs = n;
        self.last_updated = Utc::now();
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// Badges
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Badge {
    TopRated,
    Verified,
    Beta,
}

impl Badge {
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::TopRated => "top_rated",
            Badge::Verified => "verified",
            Badge::Beta => "beta",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeRule {
    pub min_success_rate: f64,
    pub min_runs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BadgeCriteria {
    #[serde(default = "default_top_rule")]
    pub top_rated: BadgeRule,
    #[serde(default = "default_verified_rule")]
    pub verified: BadgeRule,
}

fn default_top_rule() -> BadgeRule {
    BadgeRule {
        min_success_rate: 0.93,
        min_runs: 10_000,
    }
}

fn default_verified_rule() -> BadgeRule {
    BadgeRule {
        min_success_rate: 0.85,
        min_runs: 5_000,
    }
}

impl Default for BadgeCriteria {
    fn default() -> Self {
        Self {
            top_rated: default_top_rule(),
            verified: default_verified_rule(),
        }
    }
}

/// Rules are ranked: the first satisfied tier wins, beta is the floor.
pub fn badge_for(metrics: &AgentMetrics, criteria: &BadgeCriteria) -> Badge {
    let rules = [
        (Badge::TopRated, &criteria.top_rated),
        (Badge::Verified, &criteria.verified),
    ];
    for (badge, rule) in rules {
        if metrics.success_rate >= rule.min_success_rate && metrics.total_runs >= rule.min_runs {
            return badge;
        }
    }
    Badge::Beta
}

// ---------------------------------------------------------------------------
// MetricsStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetricsFile {
    #[serde(default)]
    metrics: BTreeMap<String, AgentMetrics>,
    #[serde(default)]
    badge_criteria: Option<BadgeCriteria>,
}

/// Persisted per-agent execution statistics, normally at
/// `~/.maestro/agent-metrics.json`. Read-modify-write, no cross-process
/// locking — one orchestrator per machine user is assumed.
pub struct MetricsStore {
    path: PathBuf,
    data: MetricsFile,
}

impl MetricsStore {
    /// Load from an explicit file path. A missing file starts empty; a
    /// present-but-malformed file is a fatal configuration error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let data = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str(&raw).map_err(|e| MaestroError::MalformedMetrics {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            MetricsFile::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Load from the per-user config root.
    pub fn load() -> Result<Self> {
        let dir = crate::paths::user_config_dir()?;
        Self::load_from(&crate::paths::metrics_path_in(&dir))
    }

    pub fn record_execution(&mut self, agent_id: &str, success: bool, duration_ms: u64) {
        self.data
            .metrics
            .entry(agent_id.to_string())
            .or_insert_with(AgentMetrics::new)
            .record(success, duration_ms);
    }

    pub fn get(&self, agent_id: &str) -> Option<&AgentMetrics> {
        self.data.metrics.get(agent_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AgentMetrics)> {
        self.data.metrics.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn badge_criteria(&self) -> BadgeCriteria {
        self.data.badge_criteria.clone().unwrap_or_default()
    }

    pub fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        crate::io::atomic_write(&self.path, json.as_bytes())
    }

    /// Best-effort save: metrics are not correctness-critical, so failures
    /// are logged and swallowed.
    pub fn persist(&self) {
        if let Err(e) = self.save() {
            tracing::warn!(error = %e, "failed to persist agent metrics");
        }
    }

    /// Retention sweep: drop entries not updated within `max_age_days`.
    /// Returns how many were removed.
    pub fn cleanup(&mut self, max_age_days: i64) -> usize {
        let cutoff = Utc::now() - chrono::Duration::days(max_age_days);
        let before = self.data.metrics.len();
        self.data.metrics.retain(|_, m| m.last_updated >= cutoff);
        before - self.data.metrics.len()
    }
}

// ---------------------------------------------------------------------------
// MetricsObserver
// ---------------------------------------------------------------------------

/// Feeds executor outcomes into the store; persists once per pipeline.
pub struct MetricsObserver<'a> {
    store: &'a mut MetricsStore,
}

impl<'a> MetricsObserver<'a> {
    pub fn new(store: &'a mut MetricsStore) -> Self {
        Self { store }
    }
}

impl ExecutionObserver for MetricsObserver<'_> {
    fn on_agent_completed(&mut self, run: &AgentRun) {
        self.store
            .record_execution(&run.agent_id, run.success, run.duration_ms);
    }

    fn on_pipeline_completed(&mut self, _success: bool) {
        self.store.persist();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> MetricsStore {
        MetricsStore::load_from(&dir.path().join("agent-metrics.json")).unwrap()
    }

    #[test]
    fn running_average_matches_exact_ratio() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        for success in [true, false, true] {
            s.record_execution("a", success, 1000);
        }
        let m = s.get("a").unwrap();
        assert_eq!(m.total_runs, 3);
        assert!((m.success_rate - 0.67).abs() < 1e-9); // 2/3 rounded
    }

    #[test]
    fn running_average_is_order_independent() {
        let sequences: [&[bool]; 3] = [
            &[true, false, true, false],
            &[false, false, true, true],
            &[true, true, false, false],
        ];
        for seq in sequences {
            let dir = TempDir::new().unwrap();
            let mut s = store(&dir);
            for &success in seq {
                s.record_execution("a", success, 500);
            }
            assert!(
                (s.get("a").unwrap().success_rate - 0.5).abs() < 1e-9,
                "sequence {seq:?}"
            );
        }
    }

    #[test]
    fn duration_running_average_in_seconds() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.record_execution("a", true, 2000);
        s.record_execution("a", true, 4000);
        let m = s.get("a").unwrap();
        assert!((m.avg_duration_ms - 3000.0).abs() < 1e-9);
        assert_eq!(m.avg_duration_seconds(), 3);
    }

    #[test]
    fn roundtrip_persists_metrics() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent-metrics.json");
        let mut s = MetricsStore::load_from(&path).unwrap();
        s.record_execution("agent_styling", true, 1500);
        s.save().unwrap();

        let reloaded = MetricsStore::load_from(&path).unwrap();
        let m = reloaded.get("agent_styling").unwrap();
        assert_eq!(m.total_runs, 1);
        assert!((m.success_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("agent-metrics.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            MetricsStore::load_from(&path),
            Err(MaestroError::MalformedMetrics { .. })
        ));
    }

    #[test]
    fn cleanup_drops_stale_entries() {
        let dir = TempDir::new().unwrap();
        let mut s = store(&dir);
        s.record_execution("fresh", true, 100);
        s.data.metrics.insert(
            "stale".to_string(),
            AgentMetrics {
                total_runs: 5,
                success_rate: 1.0,
                avg_duration_ms: 10.0,
                last_updated: Utc::now() - chrono::Duration::days(120),
            },
        );

        let removed = s.cleanup(90);
        assert_eq!(removed, 1);
        assert!(s.get("fresh").is_some());
        assert!(s.get("stale").is_none());
    }

    #[test]
    fn badge_tiers_in_priority_order() {
        let criteria = BadgeCriteria::default();
        let mut m = AgentMetrics::new();

        m.success_rate = 0.95;
        m.total_runs = 15_000;
        assert_eq!(badge_for(&m, &criteria), Badge::TopRated);

        // High rate but not enough runs for the top tier.
        m.total_runs = 6_000;
        assert_eq!(badge_for(&m, &criteria), Badge::Verified);

        m.success_rate = 0.80;
        assert_eq!(badge_for(&m, &criteria), Badge::Beta);

        m.success_rate = 0.99;
        m.total_runs = 10;
        assert_eq!(badge_for(&m, &criteria), Badge::Beta);
    }

    #[test]
    fn badge_boundary_values() {
        let criteria = BadgeCriteria::default();
        let m = AgentMetrics {
            total_runs: 10_000,
            success_rate: 0.93,
            avg_duration_ms: 0.0,
            last_updated: Utc::now(),
        };
        assert_eq!(badge_for(&m, &criteria), Badge::TopRated);
    }
}
