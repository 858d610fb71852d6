use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Word lists driving pipeline construction. The original product accepted
/// demands in both English and Portuguese, so the defaults carry both; all
/// matching is substring and case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_complexity_indicators")]
    pub complexity_indicators: Vec<String>,
    #[serde(default = "default_github_opt_out_phrases")]
    pub github_opt_out_phrases: Vec<String>,
}

fn default_complexity_indicators() -> Vec<String> {
    [
        "full",
        "complete",
        "completo",
        "completa",
        "system",
        "sistema",
        "application",
        "aplicacao",
        "aplicação",
        "multiple",
        "integrate",
        "integrar",
        "architecture",
        "arquitetura",
        "complex",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_github_opt_out_phrases() -> Vec<String> {
    [
        "no github",
        "without github",
        "sem github",
        "skip github",
        "nao usar github",
        "não usar github",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            complexity_indicators: default_complexity_indicators(),
            github_opt_out_phrases: default_github_opt_out_phrases(),
        }
    }
}

// ---------------------------------------------------------------------------
// HealthThresholds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthThresholds {
    #[serde(default = "default_critical_success")]
    pub critical_success_rate: f64,
    #[serde(default = "default_critical_duration")]
    pub critical_duration_seconds: u64,
    #[serde(default = "default_warning_success")]
    pub warning_success_rate: f64,
    #[serde(default = "default_warning_duration")]
    pub warning_duration_seconds: u64,
}

fn default_critical_success() -> f64 {
    0.70
}

fn default_critical_duration() -> u64 {
    120
}

fn default_warning_success() -> f64 {
    0.85
}

fn default_warning_duration() -> u64 {
    60
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            critical_success_rate: default_critical_success(),
            critical_duration_seconds: default_critical_duration(),
            warning_success_rate: default_warning_success(),
            warning_duration_seconds: default_warning_duration(),
        }
    }
}

// ---------------------------------------------------------------------------
// InvocationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvocationConfig {
    /// Per-agent invocation timeout in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    /// Model passed to the external assistant.
    #[serde(default = "default_model")]
    pub model: String,
    /// Auto-approve file edits in non-interactive runs.
    #[serde(default = "default_auto_approve")]
    pub auto_approve: bool,
}

fn default_timeout_seconds() -> u64 {
    120
}

fn default_model() -> String {
    "claude-sonnet-4-6".to_string()
}

fn default_auto_approve() -> bool {
    true
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            model: default_model(),
            auto_approve: default_auto_approve(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub health: HealthThresholds,
    #[serde(default)]
    pub invocation: InvocationConfig,
}

impl Config {
    /// Load `.maestro/config.yaml`, falling back to defaults when the file
    /// is absent. A present-but-malformed file is a configuration error.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_missing() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.invocation.timeout_seconds, 120);
        assert!((config.health.critical_success_rate - 0.70).abs() < 1e-9);
        assert!(config
            .pipeline
            .complexity_indicators
            .contains(&"architecture".to_string()));
    }

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.invocation.timeout_seconds = 30;
        config.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.invocation.timeout_seconds, 30);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".maestro")).unwrap();
        std::fs::write(
            dir.path().join(".maestro/config.yaml"),
            "invocation:\n  timeout_seconds: 15\n",
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.invocation.timeout_seconds, 15);
        assert_eq!(config.health.warning_duration_seconds, 60);
        assert!(!config.pipeline.github_opt_out_phrases.is_empty());
    }

    #[test]
    fn malformed_yaml_is_error() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".maestro")).unwrap();
        std::fs::write(dir.path().join(".maestro/config.yaml"), "{{nope").unwrap();
        assert!(Config::load(dir.path()).is_err());
    }
}
