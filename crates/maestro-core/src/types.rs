use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
    System,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
            Priority::System => "system",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Frontend,
    Backend,
    Testing,
    Infrastructure,
    Quality,
    Utility,
    Special,
    Orchestration,
    General,
}

impl Default for Category {
    fn default() -> Self {
        Category::General
    }
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Frontend => "frontend",
            Category::Backend => "backend",
            Category::Testing => "testing",
            Category::Infrastructure => "infrastructure",
            Category::Quality => "quality",
            Category::Utility => "utility",
            Category::Special => "special",
            Category::Orchestration => "orchestration",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskType
// ---------------------------------------------------------------------------

/// Coarse task label assigned by the demand classifier. The variant order
/// here is not the matching order — see `classifier::task_type_rules` for
/// the first-match-wins rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    ComponentCreation,
    Testing,
    Styling,
    Backend,
    Deployment,
    Accessibility,
    ProgressiveWebApp,
    Security,
    Optimization,
    GeneralDevelopment,
}

impl TaskType {
    pub fn all() -> &'static [TaskType] {
        &[
            TaskType::ComponentCreation,
            TaskType::Testing,
            TaskType::Styling,
            TaskType::Backend,
            TaskType::Deployment,
            TaskType::Accessibility,
            TaskType::ProgressiveWebApp,
            TaskType::Security,
            TaskType::Optimization,
            TaskType::GeneralDevelopment,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::ComponentCreation => "component_creation",
            TaskType::Testing => "testing",
            TaskType::Styling => "styling",
            TaskType::Backend => "backend",
            TaskType::Deployment => "deployment",
            TaskType::Accessibility => "accessibility",
            TaskType::ProgressiveWebApp => "progressive_web_app",
            TaskType::Security => "security",
            TaskType::Optimization => "optimization",
            TaskType::GeneralDevelopment => "general_development",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaskType {
    type Err = crate::error::MaestroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::all()
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| crate::error::MaestroError::InvalidTaskType(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// ProjectType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    Frontend,
    Backend,
    Fullstack,
}

impl Default for ProjectType {
    fn default() -> Self {
        ProjectType::Fullstack
    }
}

impl ProjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            ProjectType::Frontend => "frontend",
            ProjectType::Backend => "backend",
            ProjectType::Fullstack => "fullstack",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProjectType {
    type Err = crate::error::MaestroError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "frontend" => Ok(ProjectType::Frontend),
            "backend" => Ok(ProjectType::Backend),
            "fullstack" | "full_stack" | "full-stack" => Ok(ProjectType::Fullstack),
            _ => Err(crate::error::MaestroError::InvalidProjectType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// BuilderPolicy
// ---------------------------------------------------------------------------

/// Pipeline construction policy selected by `--enhanced` / `--standard`.
/// Enhanced runs the full rule set; standard skips the planning prepend
/// and the memory-context append.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuilderPolicy {
    Standard,
    Enhanced,
}

impl Default for BuilderPolicy {
    fn default() -> Self {
        BuilderPolicy::Enhanced
    }
}

// ---------------------------------------------------------------------------
// PipelineStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Ready,
    Orchestrating,
    Executing,
    Completed,
    Failed,
}

impl PipelineStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineStatus::Ready => "READY",
            PipelineStatus::Orchestrating => "ORCHESTRATING",
            PipelineStatus::Executing => "EXECUTING",
            PipelineStatus::Completed => "COMPLETED",
            PipelineStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
