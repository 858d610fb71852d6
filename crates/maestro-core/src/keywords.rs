use crate::catalog::Catalog;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Tokenization
// ---------------------------------------------------------------------------

/// Common words excluded from keyword harvesting. The product accepts
/// demands in English and Portuguese, so both appear here.
const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "agent", "along", "being", "below", "between", "could",
    "every", "first", "other", "should", "their", "there", "these", "thing", "think", "those",
    "through", "under", "using", "where", "which", "while", "would", "ainda", "antes", "como",
    "deve", "entre", "fazer", "quando", "sobre", "tambem", "também", "todos", "vamos",
];

/// Case-fold, strip punctuation, split on whitespace, keep tokens longer
/// than 4 characters that aren't stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for raw in lowered.split_whitespace() {
        let token: String = raw.chars().filter(|c| c.is_alphanumeric()).collect();
        if token.chars().count() <= 4 || STOP_WORDS.contains(&token.as_str()) {
            continue;
        }
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}

// ---------------------------------------------------------------------------
// Enrichment table
// ---------------------------------------------------------------------------

/// Hand-curated supplemental keywords, keyed by substring of the agent id.
/// Covers the known persona families; unknown agents rely on harvested
/// tokens alone.
const ENRICHMENT: &[(&str, &[&str])] = &[
    (
        "react",
        &[
            "react",
            "component",
            "components",
            "frontend",
            "button",
            "botao",
            "botão",
            "interface",
            "hooks",
            "props",
        ],
    ),
    (
        "styling",
        &[
            "style",
            "styling",
            "tailwind",
            "estilo",
            "estilizacao",
            "estilização",
            "layout",
            "responsive",
            "theme",
        ],
    ),
    (
        "test",
        &[
            "tests",
            "testing",
            "validate",
            "validation",
            "testes",
            "validar",
            "coverage",
            "integration",
        ],
    ),
    (
        "security",
        &[
            "security",
            "secure",
            "authentication",
            "authorization",
            "vulnerability",
            "seguranca",
            "segurança",
        ],
    ),
    (
        "nestjs",
        &["nestjs", "backend", "endpoint", "server", "controller"],
    ),
    (
        "golang",
        &["golang", "backend", "goroutine", "server", "handler"],
    ),
    (
        "accessibility",
        &[
            "accessibility",
            "acessibilidade",
            "screen",
            "reader",
            "contrast",
        ],
    ),
    (
        "pwa",
        &["offline", "manifest", "service", "worker", "progressive"],
    ),
    (
        "deployment",
        &["deploy", "deployment", "release", "rollout", "production"],
    ),
    (
        "quality",
        &["quality", "qualidade", "refactor", "lints", "cleanup"],
    ),
    ("figma", &["figma", "design", "tokens", "mockup", "extract"]),
    (
        "github",
        &["github", "issues", "commit", "repository", "workflow"],
    ),
];

// ---------------------------------------------------------------------------
// KeywordIndex
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct IndexEntry {
    agent_id: String,
    id_lower: String,
    description_lower: String,
    keywords: HashSet<String>,
}

/// A scored lookup hit. Higher scores rank earlier.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentMatch {
    pub agent_id: String,
    pub score: f64,
}

/// Keyword index over the agent catalog, rebuilt in full on every catalog
/// load. Entries preserve catalog insertion order so that equal scores
/// break ties deterministically.
#[derive(Debug, Clone, Default)]
pub struct KeywordIndex {
    entries: Vec<IndexEntry>,
}

impl KeywordIndex {
    /// Harvest keywords from every agent's description and prompt body,
    /// then merge the enrichment table. Always succeeds; an agent with an
    /// empty body simply gets a small (possibly empty) keyword set.
    pub fn build(catalog: &Catalog) -> Self {
        let entries = catalog
            .agents()
            .iter()
            .map(|agent| {
                let mut keywords: HashSet<String> = tokenize(&agent.description)
                    .into_iter()
                    .chain(tokenize(&agent.prompt_body))
                    .collect();

                for (needle, extra) in ENRICHMENT {
                    if agent.id.contains(needle) {
                        keywords.extend(extra.iter().map(|k| k.to_string()));
                    }
                }

                IndexEntry {
                    agent_id: agent.id.clone(),
                    id_lower: agent.id.to_lowercase(),
                    description_lower: agent.description.to_lowercase(),
                    keywords,
                }
            })
            .collect();

        Self { entries }
    }

    /// Add keywords to one agent's set. No-op for unknown agents.
    pub fn teach<I, S>(&mut self, agent_id: &str, keywords: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.agent_id == agent_id) {
            entry
                .keywords
                .extend(keywords.into_iter().map(|k| k.into().to_lowercase()));
        }
    }

    /// Score every agent against the query keywords and return non-zero
    /// scorers in descending order. Long keyword matches (length > 5) count
    /// double; the agent id and description contribute substring bonuses.
    pub fn lookup(&self, keywords: &[String]) -> Vec<AgentMatch> {
        let mut matches: Vec<AgentMatch> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let mut score = 0.0;
                for kw in keywords {
                    if entry.keywords.contains(kw) {
                        score += if kw.chars().count() > 5 { 2.0 } else { 1.0 };
                    }
                    if entry.id_lower.contains(kw.as_str()) {
                        score += 2.0;
                    }
                    if entry.description_lower.contains(kw.as_str()) {
                        score += 1.5;
                    }
                }
                (score > 0.0).then(|| AgentMatch {
                    agent_id: entry.agent_id.clone(),
                    score,
                })
            })
            .collect();

        // Stable sort keeps catalog insertion order for equal scores.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches
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

    fn agent(id: &str, description: &str, body: &str) -> AgentDefinition {
        AgentDefinition {
            id: id.to_string(),
            display_name: id.to_string(),
            description: description.to_string(),
            capability_tags: Vec::new(),
            priority: Priority::Normal,
            category: Category::General,
            prompt_body: body.to_string(),
        }
    }

    fn test_catalog() -> Catalog {
        Catalog::new(vec![
            agent(
                "agent_react_components",
                "Creates React components with hooks and props",
                "Build accessible interface components.",
            ),
            agent(
                "agent_nestjs_backend",
                "Builds NestJS backend services and endpoints",
                "Design controllers and modules.",
            ),
            agent(
                "agent_code_quality",
                "Reviews code quality and refactors",
                "",
            ),
        ])
    }

    #[test]
    fn tokenize_filters_short_and_stop_words() {
        let tokens = tokenize("Create a Login Button using React!");
        assert!(tokens.contains(&"login".to_string()));
        assert!(tokens.contains(&"button".to_string()));
        assert!(tokens.contains(&"react".to_string()));
        assert!(tokens.contains(&"create".to_string()));
        // "a" too short, "using" is a stop word
        assert!(!tokens.contains(&"a".to_string()));
        assert!(!tokens.contains(&"using".to_string()));
    }

    #[test]
    fn tokenize_strips_punctuation_and_dedupes() {
        let tokens = tokenize("deploy, deploy; DEPLOY!");
        assert_eq!(tokens, vec!["deploy".to_string()]);
    }

    #[test]
    fn build_merges_enrichment() {
        let index = KeywordIndex::build(&test_catalog());
        // "botão" never appears in the agent's text — enrichment only.
        let hits = index.lookup(&["botão".to_string()]);
        assert!(hits.iter().any(|m| m.agent_id == "agent_react_components"));
    }

    #[test]
    fn lookup_scores_long_keywords_double() {
        let index = KeywordIndex::build(&test_catalog());
        let long = index.lookup(&["components".to_string()]); // len > 5: set match worth 2
        let short = index.lookup(&["hooks".to_string()]); // len 5: worth 1
        let long_score = long
            .iter()
            .find(|m| m.agent_id == "agent_react_components")
            .unwrap()
            .score;
        let short_score = short
            .iter()
            .find(|m| m.agent_id == "agent_react_components")
            .unwrap()
            .score;
        // "components" also substring-matches id (+2) and description (+1.5).
        assert!(long_score > short_score);
    }

    #[test]
    fn lookup_excludes_zero_scores() {
        let index = KeywordIndex::build(&test_catalog());
        let hits = index.lookup(&["blockchain".to_string()]);
        assert!(hits.is_empty());
    }

    #[test]
    fn lookup_ranks_best_match_first() {
        let index = KeywordIndex::build(&test_catalog());
        let hits = index.lookup(&["nestjs".to_string(), "backend".to_string()]);
        assert_eq!(hits[0].agent_id, "agent_nestjs_backend");
    }

    #[test]
    fn lookup_is_deterministic() {
        let index = KeywordIndex::build(&test_catalog());
        let kws = vec!["react".to_string(), "quality".to_string()];
        assert_eq!(index.lookup(&kws), index.lookup(&kws));
    }

    #[test]
    fn teach_extends_one_agent() {
        let mut index = KeywordIndex::build(&test_catalog());
        assert!(index.lookup(&["webhooks".to_string()]).is_empty());

        index.teach("agent_nestjs_backend", ["webhooks"]);
        let hits = index.lookup(&["webhooks".to_string()]);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].agent_id, "agent_nestjs_backend");
    }

    #[test]
    fn empty_catalog_builds_empty_index() {
        let index = KeywordIndex::build(&Catalog::new(Vec::new()));
        assert!(index.lookup(&["anything".to_string()]).is_empty());
    }
}
