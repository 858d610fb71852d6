use crate::error::{MaestroError, Result};
use crate::paths;
use crate::types::{Category, Priority};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// AgentDefinition
// ---------------------------------------------------------------------------

/// One agent persona loaded from `.maestro/agents/<id>.md`.
///
/// Immutable for the process lifetime; the catalog is only rebuilt on
/// reinitialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,
    pub display_name: String,
    pub description: String,
    #[serde(default)]
    pub capability_tags: Vec<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Category,
    /// Opaque prompt template text — only `{{var}}` substitution is applied.
    #[serde(skip_serializing, default)]
    pub prompt_body: String,
}

/// Frontmatter shape. Required fields are Options here so absence surfaces
/// as a validation error instead of a silent default.
#[derive(Debug, Deserialize)]
struct AgentFrontmatter {
    name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    priority: Option<Priority>,
    #[serde(default)]
    category: Option<Category>,
}

// ---------------------------------------------------------------------------
// Frontmatter parsing
// ---------------------------------------------------------------------------

/// Extract the YAML content between the first pair of `---` delimiters,
/// returning `(frontmatter, body)`.
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix("---")?;
    let rest = if let Some(r) = rest.strip_prefix('\n') {
        r
    } else if let Some(r) = rest.strip_prefix("\r\n") {
        r
    } else {
        return None;
    };
    let end = rest.find("\n---")?;
    let fm = &rest[..end];
    let body = rest[end + 4..].trim_start_matches(['\r', '\n']);
    Some((fm, body))
}

fn parse_agent(id: &str, file: &str, content: &str) -> Result<AgentDefinition> {
    let Some((fm, body)) = split_frontmatter(content) else {
        return Err(MaestroError::InvalidAgentFile {
            file: file.to_string(),
            reason: "missing YAML frontmatter".to_string(),
        });
    };

    let meta: AgentFrontmatter =
        serde_yaml::from_str(fm).map_err(|e| MaestroError::InvalidAgentFile {
            file: file.to_string(),
            reason: e.to_string(),
        })?;

    let display_name = meta.name.ok_or_else(|| MaestroError::InvalidAgentFile {
        file: file.to_string(),
        reason: "missing required field 'name'".to_string(),
    })?;
    let description = meta
        .description
        .ok_or_else(|| MaestroError::InvalidAgentFile {
            file: file.to_string(),
            reason: "missing required field 'description'".to_string(),
        })?;

    Ok(AgentDefinition {
        id: id.to_string(),
        display_name,
        description,
        capability_tags: meta.tags,
        priority: meta.priority.unwrap_or_default(),
        category: meta.category.unwrap_or_default(),
        prompt_body: body.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The loaded agent catalog. Constructed once at process start and passed
/// by reference — there is no module-level registry. Insertion order is the
/// sorted directory scan order and is preserved for stable tie-breaks in
/// keyword lookup.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    agents: Vec<AgentDefinition>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(agents: Vec<AgentDefinition>) -> Self {
        let by_id = agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self { agents, by_id }
    }

    /// Scan `.maestro/agents/` and load every `*.md` persona. The agent id
    /// is the file stem. A missing directory is fatal at startup.
    pub fn load(root: &Path) -> Result<Self> {
        let dir = paths::agents_dir(root);
        if !dir.is_dir() {
            return Err(MaestroError::CatalogMissing(dir.display().to_string()));
        }

        let mut entries: Vec<_> = std::fs::read_dir(&dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "md"))
            .collect();
        entries.sort();

        let mut agents = Vec::with_capacity(entries.len());
        for path in entries {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            paths::validate_agent_id(stem)?;
            let content = std::fs::read_to_string(&path)?;
            agents.push(parse_agent(stem, &path.display().to_string(), &content)?);
        }

        tracing::debug!(count = agents.len(), "agent catalog loaded");
        Ok(Self::new(agents))
    }

    pub fn get(&self, id: &str) -> Option<&AgentDefinition> {
        self.by_id.get(id).map(|&i| &self.agents[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Agents in insertion order.
    pub fn agents(&self) -> &[AgentDefinition] {
        &self.agents
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Render an agent's prompt body, substituting `{{key}}` placeholders.
    /// Unknown placeholders are left as-is; the body is never parsed further.
    pub fn render_prompt(&self, id: &str, vars: &HashMap<&str, String>) -> Result<String> {
        let agent = self
            .get(id)
            .ok_or_else(|| MaestroError::AgentNotFound(id.to_string()))?;
        let mut out = agent.prompt_body.clone();
        for (key, value) in vars {
            out = out.replace(&format!("{{{{{key}}}}}"), value);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
