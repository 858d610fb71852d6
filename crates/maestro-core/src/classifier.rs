use crate::catalog::Catalog;
use crate::keywords::{tokenize, AgentMatch, KeywordIndex};
use crate::types::{ProjectType, TaskType};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Task-type rules
// ---------------------------------------------------------------------------

/// Ordered substring rules; the first match wins, so the order is a
/// designed tie-break. Terms are bilingual (English + Portuguese) to match
/// the demands this tool receives.
const TASK_TYPE_RULES: &[(TaskType, &[&str])] = &[
    (
        TaskType::ComponentCreation,
        &[
            "component",
            "componente",
            "button",
            "botao",
            "botão",
            "screen",
            "tela",
            "modal",
            "formulario",
            "formulário",
            "interface",
        ],
    ),
    (
        TaskType::Testing,
        &["test", "teste", "validate", "validar", "coverage"],
    ),
    (
        TaskType::Styling,
        &["style", "estilo", "css", "tailwind", "estiliza"],
    ),
    (
        TaskType::Backend,
        &["api", "backend", "nest", "golang", "server", "endpoint"],
    ),
    (TaskType::Deployment, &["deploy", "ci/cd", "cicd"]),
    (
        TaskType::Accessibility,
        &["accessibility", "a11y", "acessibilidade", "aria-"],
    ),
    (
        TaskType::ProgressiveWebApp,
        &["pwa", "offline", "service worker"],
    ),
    (
        TaskType::Security,
        &["security", "auth", "seguranca", "segurança", "vulnerab"],
    ),
    (
        TaskType::Optimization,
        &["performance", "optimize", "otimiza", "desempenho"],
    ),
];

/// Membership sets for the independent stack-detection bits. Not mutually
/// exclusive with each other or with the task type.
const BACKEND_TERMS: &[&str] = &[
    "api", "backend", "nest", "nestjs", "golang", "server", "database", "endpoint", "graphql",
    "microservice",
];

const FRONTEND_TERMS: &[&str] = &[
    "react",
    "component",
    "componente",
    "frontend",
    "button",
    "botao",
    "botão",
    "tela",
    "interface",
    "css",
    "tailwind",
    "style",
    "estilo",
];

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// The classifier's verdict for one demand. Ephemeral — computed fresh per
/// call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub task_type: TaskType,
    pub confidence: f64,
    pub ranked_agents: Vec<RankedAgent>,
    pub is_backend_task: bool,
    pub is_frontend_task: bool,
    pub is_full_stack_task: bool,
    pub project_type: ProjectType,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedAgent {
    pub agent_id: String,
    pub score: f64,
}

impl From<AgentMatch> for RankedAgent {
    fn from(m: AgentMatch) -> Self {
        Self {
            agent_id: m.agent_id,
            score: m.score,
        }
    }
}

// ---------------------------------------------------------------------------
// DemandClassifier
// ---------------------------------------------------------------------------

/// Classifies free-text demands against the loaded catalog.
///
/// Construction builds the keyword index, so an uninitialized classifier is
/// unrepresentable — there is no "call before init" failure mode.
pub struct DemandClassifier {
    index: KeywordIndex,
}

impl DemandClassifier {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            index: KeywordIndex::build(catalog),
        }
    }

    /// Wrap a pre-built (possibly taught) index.
    pub fn with_index(index: KeywordIndex) -> Self {
        Self { index }
    }

    /// Classify a demand. Never fails: with no keyword matches the result
    /// degrades to `general_development` at the lowest confidence.
    pub fn classify(&self, demand: &str, project_type: ProjectType) -> Classification {
        let lowered = demand.to_lowercase();

        let task_type = TASK_TYPE_RULES
            .iter()
            .find(|(_, terms)| terms.iter().any(|t| lowered.contains(t)))
            .map(|(task, _)| *task)
            .unwrap_or(TaskType::GeneralDevelopment);

        let ranked = self.index.lookup(&tokenize(demand));
        let confidence = confidence_for(ranked.len());

        let is_backend_task = BACKEND_TERMS.iter().any(|t| lowered.contains(t));
        let is_frontend_task = FRONTEND_TERMS.iter().any(|t| lowered.contains(t));

        Classification {
            task_type,
            confidence,
            ranked_agents: ranked.into_iter().map(RankedAgent::from).collect(),
            is_backend_task,
            is_frontend_task,
            is_full_stack_task: is_backend_task && is_frontend_task,
            project_type,
        }
    }
}

/// Coarse step function over the count of distinct matching agents. The
/// exact breakpoints are load-bearing for downstream consumers.
fn confidence_for(ranked_count: usize) -> f64 {
    match ranked_count {
        0 => 0.3,
        1 => 0.7,
        2 => 0.85,
        _ => 0.95,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::AgentDefinition;
    use crate::types::{Category, Priority};

    fn agent(id: &str, description: &str) -> AgentDefinition {
        AgentDefinition {
            id: id.to_string(),
            display_name: id.to_string(),
            description: description.to_string(),
            capability_tags: Vec::new(),
            priority: Priority::Normal,
            category: Category::General,
            prompt_body: String::new(),
        }
    }

    fn classifier() -> DemandClassifier {
        let catalog = Catalog::new(vec![
            agent(
                "agent_react_components",
                "Creates React components, buttons and screens",
            ),
            agent("agent_styling", "Styles interfaces with Tailwind"),
            agent("agent_nestjs_backend", "Builds NestJS backend services"),
            agent("agent_code_quality", "Reviews code quality"),
        ]);
        DemandClassifier::new(&catalog)
    }

    #[test]
    fn login_button_is_component_creation() {
        let c = classifier().classify("criar botão de login", ProjectType::Frontend);
        assert_eq!(c.task_type, TaskType::ComponentCreation);
        assert!(c
            .ranked_agents
            .iter()
            .any(|r| r.agent_id == "agent_react_components"));
        assert!(c.confidence >= 0.7);
    }

    #[test]
    fn nestjs_api_is_backend() {
        let c = classifier().classify("criar API REST com NestJS", ProjectType::Backend);
        assert_eq!(c.task_type, TaskType::Backend);
        assert!(c.is_backend_task);
        assert!(!c.is_frontend_task);
        assert!(!c.is_full_stack_task);
    }

    #[test]
    fn fullstack_detection() {
        let c = classifier().classify(
            "app completo com frontend React e backend NestJS",
            ProjectType::Fullstack,
        );
        assert!(c.is_backend_task);
        assert!(c.is_frontend_task);
        assert!(c.is_full_stack_task);
    }

    #[test]
    fn rule_order_is_first_match_wins() {
        // Both component and styling terms present — component rule is first.
        let c = classifier().classify("style a button component", ProjectType::Frontend);
        assert_eq!(c.task_type, TaskType::ComponentCreation);
    }

    #[test]
    fn unmatched_demand_degrades_gracefully() {
        let c = classifier().classify("zzz qqq", ProjectType::Fullstack);
        assert_eq!(c.task_type, TaskType::GeneralDevelopment);
        assert!(c.ranked_agents.is_empty());
        assert!((c.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn confidence_breakpoints_are_exact() {
        assert_eq!(confidence_for(0), 0.3);
        assert_eq!(confidence_for(1), 0.7);
        assert_eq!(confidence_for(2), 0.85);
        assert_eq!(confidence_for(3), 0.95);
        assert_eq!(confidence_for(10), 0.95);
    }

    #[test]
    fn confidence_only_takes_known_values() {
        let c = classifier();
        for demand in [
            "criar botão de login",
            "test everything",
            "deploy now",
            "xyzzy",
            "app completo com react nestjs tailwind quality",
        ] {
            let result = c.classify(demand, ProjectType::Fullstack);
            assert!(
                [0.3, 0.7, 0.85, 0.95].contains(&result.confidence),
                "unexpected confidence {} for '{demand}'",
                result.confidence
            );
        }
    }

    #[test]
    fn classify_is_deterministic() {
        let c = classifier();
        let a = c.classify("criar botão de login", ProjectType::Frontend);
        let b = c.classify("criar botão de login", ProjectType::Frontend);
        assert_eq!(a.task_type, b.task_type);
        assert_eq!(a.confidence, b.confidence);
        let ids_a: Vec<_> = a.ranked_agents.iter().map(|r| &r.agent_id).collect();
        let ids_b: Vec<_> = b.ranked_agents.iter().map(|r| &r.agent_id).collect();
        assert_eq!(ids_a, ids_b);
    }
}
