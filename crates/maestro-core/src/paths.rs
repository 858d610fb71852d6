use crate::error::{MaestroError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const MAESTRO_DIR: &str = ".maestro";
pub const AGENTS_DIR: &str = ".maestro/agents";
pub const TEMP_DIR: &str = ".maestro/temp";
pub const ARCHIVES_DIR: &str = ".maestro/archives";

pub const CONFIG_FILE: &str = ".maestro/config.yaml";
pub const STATE_MD_FILE: &str = ".maestro/temp/current_pipeline_state.md";
pub const CONTEXT_JSON_FILE: &str = ".maestro/temp/execution_context.json";
pub const HISTORY_LOG_FILE: &str = ".maestro/temp/pipeline_history.log";

pub const METRICS_FILE: &str = "agent-metrics.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn maestro_dir(root: &Path) -> PathBuf {
    root.join(MAESTRO_DIR)
}

pub fn agents_dir(root: &Path) -> PathBuf {
    root.join(AGENTS_DIR)
}

pub fn temp_dir(root: &Path) -> PathBuf {
    root.join(TEMP_DIR)
}

pub fn archives_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVES_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn state_md_path(root: &Path) -> PathBuf {
    root.join(STATE_MD_FILE)
}

pub fn context_json_path(root: &Path) -> PathBuf {
    root.join(CONTEXT_JSON_FILE)
}

pub fn history_log_path(root: &Path) -> PathBuf {
    root.join(HISTORY_LOG_FILE)
}

pub fn agent_file(root: &Path, id: &str) -> PathBuf {
    agents_dir(root).join(format!("{id}.md"))
}

/// Per-user config root (`~/.maestro/`), home of the metrics file.
pub fn user_config_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|h| h.join(MAESTRO_DIR))
        .ok_or(MaestroError::HomeNotFound)
}

pub fn metrics_path_in(config_root: &Path) -> PathBuf {
    config_root.join(METRICS_FILE)
}

// ---------------------------------------------------------------------------
// Agent id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_agent_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(MaestroError::InvalidAgentId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_agent_ids() {
        for id in ["agent_react_components", "a", "code_quality_1", "x1"] {
            validate_agent_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_agent_ids() {
        for id in ["", "_leading", "trailing_", "has space", "UPPER", "a-b"] {
            assert!(validate_agent_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.maestro/config.yaml")
        );
        assert_eq!(
            state_md_path(root),
            PathBuf::from("/tmp/proj/.maestro/temp/current_pipeline_state.md")
        );
        assert_eq!(
            agent_file(root, "agent_code_quality"),
            PathBuf::from("/tmp/proj/.maestro/agents/agent_code_quality.md")
        );
    }
}
