use crate::catalog::Catalog;
use crate::config::PipelineConfig;
use crate::types::{BuilderPolicy, ProjectType};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Well-known agent ids
// ---------------------------------------------------------------------------

/// Canonical persona ids referenced by the rule tables. The final existence
/// filter drops any id not present in the loaded catalog, so retiring an
/// agent file cannot break construction.
pub mod agents {
    pub const ROUNDTABLE: &str = "agent_roundtable";
    pub const TASK_CLASSIFIER: &str = "agent_task_classifier";
    pub const REACT_COMPONENTS: &str = "agent_react_components";
    pub const STYLING: &str = "agent_styling";
    pub const TEST_VALIDATOR: &str = "agent_test_validator";
    pub const INTEGRATION_TESTS: &str = "agent_integration_tests";
    pub const ACCESSIBILITY: &str = "agent_accessibility";
    pub const PWA: &str = "agent_pwa";
    pub const FIGMA_EXTRACT: &str = "agent_figma_extract";
    pub const NESTJS_BACKEND: &str = "agent_nestjs_backend";
    pub const GOLANG_BACKEND: &str = "agent_golang_backend";
    pub const CODE_QUALITY: &str = "agent_code_quality";
    pub const DEPLOYMENT: &str = "agent_deployment";
    pub const MEMORY_CONTEXT: &str = "agent_memory_context";
    pub const GITHUB_INTEGRATION: &str = "agent_github_integration";
    pub const GITHUB_ISSUES: &str = "agent_github_issues";
}

/// Enrichment agents whose failure never blocks the pipeline.
const OPTIONAL_AGENTS: &[&str] = &[
    agents::MEMORY_CONTEXT,
    agents::GITHUB_INTEGRATION,
    agents::GITHUB_ISSUES,
];

/// Hand-curated groups of agents known to be safe to run concurrently.
/// Positional and greedy: only consecutive pipeline agents sharing a group
/// are merged. This encodes no real data-dependency analysis.
const PARALLEL_GROUPS: &[(&str, &[&str])] = &[
    (
        "frontend",
        &[
            agents::REACT_COMPONENTS,
            agents::STYLING,
            agents::ACCESSIBILITY,
            agents::PWA,
            agents::FIGMA_EXTRACT,
        ],
    ),
    (
        "quality",
        &[
            agents::TEST_VALIDATOR,
            agents::INTEGRATION_TESTS,
            agents::CODE_QUALITY,
        ],
    ),
    (
        "backend",
        &[agents::NESTJS_BACKEND, agents::GOLANG_BACKEND],
    ),
    (
        "github",
        &[agents::GITHUB_INTEGRATION, agents::GITHUB_ISSUES],
    ),
];

// ---------------------------------------------------------------------------
// Domain rule terms
// ---------------------------------------------------------------------------

const UI_TERMS: &[&str] = &[
    "component",
    "componente",
    "button",
    "botao",
    "botão",
    "screen",
    "tela",
    "modal",
    "interface",
    "frontend",
    "react",
    "pagina",
    "página",
];

const TEST_TERMS: &[&str] = &["test", "teste", "validate", "validar"];
const A11Y_TERMS: &[&str] = &["accessibility", "a11y", "acessibilidade"];
const PWA_TERMS: &[&str] = &["pwa", "offline", "service worker"];
const DESIGN_TERMS: &[&str] = &["figma", "design"];

// ---------------------------------------------------------------------------
// Pipeline / Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    pub agent_ids: Vec<String>,
    pub parallel: bool,
    pub mandatory: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pipeline {
    pub phases: Vec<Phase>,
}

impl Pipeline {
    pub fn total_agents(&self) -> usize {
        self.phases.iter().map(|p| p.agent_ids.len()).sum()
    }

    pub fn agent_ids(&self) -> impl Iterator<Item = &str> {
        self.phases
            .iter()
            .flat_map(|p| p.agent_ids.iter().map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }
}

// ---------------------------------------------------------------------------
// BuildOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub policy: BuilderPolicy,
    /// `false` when the caller passed `--no-github`.
    pub include_github: bool,
    /// Whether the working directory is a version-control repository.
    pub is_git_repo: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            policy: BuilderPolicy::default(),
            include_github: true,
            is_git_repo: false,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineBuilder
// ---------------------------------------------------------------------------

/// Deterministic rule-based pipeline construction. Pure: for a fixed
/// catalog, demand and options, the output is identical across calls.
pub struct PipelineBuilder<'a> {
    catalog: &'a Catalog,
    config: &'a PipelineConfig,
}

impl<'a> PipelineBuilder<'a> {
    pub fn new(catalog: &'a Catalog, config: &'a PipelineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn build(&self, demand: &str, _project_type: ProjectType, opts: &BuildOptions) -> Pipeline {
        let lowered = demand.to_lowercase();
        let enhanced = opts.policy == BuilderPolicy::Enhanced;

        let has_complexity = enhanced
            && self
                .config
                .complexity_indicators
                .iter()
                .any(|w| lowered.contains(&w.to_lowercase()));

        // Ordered selection with first-insertion dedup. An id appears at
        // most once in the whole pipeline.
        let mut selected: Vec<&str> = Vec::new();
        let push = |list: &mut Vec<&str>, id: &'static str| {
            if !list.contains(&id) {
                list.push(id);
            }
        };

        // 1. Complexity indicators prepend the planning roundtable.
        if has_complexity {
            push(&mut selected, agents::ROUNDTABLE);
        }

        // 2. The classifier echo always runs.
        push(&mut selected, agents::TASK_CLASSIFIER);

        // 3. Domain rules, each independently testable.
        if contains_any(&lowered, UI_TERMS) {
            push(&mut selected, agents::REACT_COMPONENTS);
            push(&mut selected, agents::STYLING);
        }
        if contains_any(&lowered, TEST_TERMS) {
            if self.catalog.contains(agents::TEST_VALIDATOR) {
                push(&mut selected, agents::TEST_VALIDATOR);
            } else {
                push(&mut selected, agents::INTEGRATION_TESTS);
            }
        }
        if contains_any(&lowered, A11Y_TERMS) {
            push(&mut selected, agents::ACCESSIBILITY);
        }
        if contains_any(&lowered, PWA_TERMS) {
            push(&mut selected, agents::PWA);
        }
        if contains_any(&lowered, DESIGN_TERMS) {
            push(&mut selected, agents::FIGMA_EXTRACT);
        }
        if lowered.contains("nest") {
            push(&mut selected, agents::NESTJS_BACKEND);
        }
        if lowered.contains("golang") || lowered.split_whitespace().any(|w| w == "go") {
            push(&mut selected, agents::GOLANG_BACKEND);
        }

        // 4. Code quality always reviews the result.
        push(&mut selected, agents::CODE_QUALITY);

        // 5. Deployment on request.
        if lowered.contains("deploy") {
            push(&mut selected, agents::DEPLOYMENT);
        }

        // 6. Memory/context enrichment for complex demands.
        if has_complexity && self.catalog.contains(agents::MEMORY_CONTEXT) {
            push(&mut selected, agents::MEMORY_CONTEXT);
        }

        // 7. GitHub integration is on by default in repositories; opting
        //    out takes a flag or an opt-out phrase in the demand itself.
        let github_opt_out = self
            .config
            .github_opt_out_phrases
            .iter()
            .any(|p| lowered.contains(&p.to_lowercase()));
        if opts.is_git_repo && opts.include_github && !github_opt_out {
            push(&mut selected, agents::GITHUB_INTEGRATION);
            push(&mut selected, agents::GITHUB_ISSUES);
        }

        // 8. Existence filter — stale rule references die here.
        selected.retain(|id| self.catalog.contains(id));

        // 9. Partition into phases.
        Pipeline {
            phases: partition(&selected),
        }
    }
}

fn contains_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|t| text.contains(t))
}

fn group_of(id: &str) -> Option<&'static str> {
    PARALLEL_GROUPS
        .iter()
        .find(|(_, members)| members.contains(&id))
        .map(|(name, _)| *name)
}

fn is_optional(id: &str) -> bool {
    OPTIONAL_AGENTS.contains(&id)
}

/// Greedy positional grouping: consecutive agents sharing a parallel-safe
/// group merge into one parallel phase; anything else becomes its own
/// sequential phase. Input order is preserved — no reordering.
fn partition(selected: &[&str]) -> Vec<Phase> {
    let mut phases: Vec<Phase> = Vec::new();
    let mut run: Vec<&str> = Vec::new();
    let mut run_group: Option<&str> = None;

    let flush = |phases: &mut Vec<Phase>, run: &mut Vec<&str>, run_group: Option<&str>| {
        if run.is_empty() {
            return;
        }
        let parallel = run.len() > 1;
        let base_name = if parallel {
            run_group.unwrap_or("stage").to_string()
        } else {
            phase_name(run[0])
        };
        let name = unique_name(phases, base_name);
        let mandatory = run.iter().any(|id| !is_optional(id));
        phases.push(Phase {
            name,
            agent_ids: run.drain(..).map(String::from).collect(),
            parallel,
            mandatory,
        });
    };

    for &id in selected {
        let group = group_of(id);
        match (group, run_group) {
            (Some(g), Some(current)) if g == current => run.push(id),
            _ => {
                flush(&mut phases, &mut run, run_group);
                run.push(id);
                run_group = group;
            }
        }
    }
    flush(&mut phases, &mut run, run_group);
    phases
}

fn phase_name(agent_id: &str) -> String {
    agent_id.strip_prefix("agent_").unwrap_or(agent_id).to_string()
}

fn unique_name(phases: &[Phase], base: String) -> String {
    if !phases.iter().any(|p| p.name == base) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}-{n}");
        if !phases.iter().any(|p| p.name == candidate) {
            return candidate;
        }
        n += 1;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
