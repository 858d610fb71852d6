use crate::executor::{AgentRun, ExecutionObserver, PhaseResult};
use crate::paths;
use crate::types::PipelineStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ExecutionState
// ---------------------------------------------------------------------------

/// The persisted execution record, mirrored in two documents: a
/// human-readable markdown page (fully overwritten) and a machine-readable
/// JSON context (read-modify-write merged).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionState {
    pub status: PipelineStatus,
    #[serde(default)]
    pub current_agent: Option<String>,
    #[serde(default)]
    pub current_task: Option<String>,
    /// 0–100.
    pub progress: u8,
    pub agents_completed: usize,
    pub total_agents: usize,
    pub last_updated: DateTime<Utc>,
}

impl Default for ExecutionState {
    fn default() -> Self {
        Self {
            status: PipelineStatus::Ready,
            current_agent: None,
            current_task: None,
            progress: 0,
            agents_completed: 0,
            total_agents: 0,
            last_updated: Utc::now(),
        }
    }
}

/// Partial update merged into the last persisted state.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub status: Option<PipelineStatus>,
    pub current_agent: Option<String>,
    pub current_task: Option<String>,
    pub progress: Option<u8>,
    pub agents_completed: Option<usize>,
    pub total_agents: Option<usize>,
}

// ---------------------------------------------------------------------------
// StateEvent
// ---------------------------------------------------------------------------

/// Event classification for history-log throttling: only significant
/// events reach the append-only log, keeping the audit trail readable.
#[derive(Debug, Clone, PartialEq)]
pub enum StateEvent {
    PipelineStarted { demand: String },
    AgentCompleted { agent_id: String, success: bool },
    PipelineCompleted { success: bool },
    ProgressTick,
}

impl StateEvent {
    fn is_significant(&self) -> bool {
        !matches!(self, StateEvent::ProgressTick)
    }

    fn log_line(&self, now: DateTime<Utc>) -> String {
        let body = match self {
            StateEvent::PipelineStarted { demand } => {
                format!("pipeline_started demand=\"{demand}\"")
            }
            StateEvent::AgentCompleted { agent_id, success } => {
                format!("agent_completed agent={agent_id} success={success}")
            }
            StateEvent::PipelineCompleted { success } => {
                format!("pipeline_completed success={success}")
            }
            StateEvent::ProgressTick => "progress_tick".to_string(),
        };
        format!("{} {body}\n", now.to_rfc3339())
    }
}

// ---------------------------------------------------------------------------
// StateRecorder
// ---------------------------------------------------------------------------

/// File-backed progress recorder under `.maestro/temp/`.
///
/// Persistence is best-effort: a failed write is logged and execution
/// continues without it. Assumes a single orchestrator process per project
/// directory — there is no cross-process locking.
pub struct StateRecorder {
    root: PathBuf,
}

impl StateRecorder {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Write the initial READY record. Called at project-init time.
    pub fn init(&self) -> crate::error::Result<()> {
        let state = ExecutionState::default();
        let json = serde_json::to_string_pretty(&state)?;
        crate::io::atomic_write(&paths::context_json_path(&self.root), json.as_bytes())?;
        crate::io::atomic_write(
            &paths::state_md_path(&self.root),
            render_markdown(&state).as_bytes(),
        )
    }

    /// Last persisted state, or the default READY record when absent or
    /// unreadable.
    pub fn load(&self) -> ExecutionState {
        let path = paths::context_json_path(&self.root);
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default()
    }

    /// Merge `patch` into the persisted state and rewrite both documents.
    /// Significant events additionally append one history-log line.
    pub fn update(&self, patch: StatePatch, event: StateEvent) {
        let mut state = self.load();
        if let Some(status) = patch.status {
            state.status = status;
        }
        if let Some(agent) = patch.current_agent {
            state.current_agent = Some(agent);
        }
        if let Some(task) = patch.current_task {
            state.current_task = Some(task);
        }
        if let Some(progress) = patch.progress {
            state.progress = progress.min(100);
        }
        if let Some(completed) = patch.agents_completed {
            state.agents_completed = completed;
        }
        if let Some(total) = patch.total_agents {
            state.total_agents = total;
        }
        state.last_updated = Utc::now();

        if let Err(e) = self.write_documents(&state, &event) {
            tracing::warn!(error = %e, "state persistence failed, continuing without it");
            // One recovery attempt: the temp dir may simply be missing.
            if crate::io::ensure_dir(&paths::temp_dir(&self.root)).is_ok() {
                if let Err(e) = self.write_documents(&state, &event) {
                    tracing::warn!(error = %e, "state persistence retry failed");
                }
            }
        }
    }

    fn write_documents(&self, state: &ExecutionState, event: &StateEvent) -> crate::error::Result<()> {
        let json = serde_json::to_string_pretty(state)?;
        crate::io::atomic_write(&paths::context_json_path(&self.root), json.as_bytes())?;
        crate::io::atomic_write(
            &paths::state_md_path(&self.root),
            render_markdown(state).as_bytes(),
        )?;
        if event.is_significant() {
            crate::io::append_text(
                &paths::history_log_path(&self.root),
                &event.log_line(state.last_updated),
            )?;
        }
        Ok(())
    }

    /// Archive the context document and clear the scratch directory.
    /// Called after a successful pipeline run.
    pub fn archive(&self) -> crate::error::Result<()> {
        let context = paths::context_json_path(&self.root);
        if context.exists() {
            let archive_dir = paths::archives_dir(&self.root);
            crate::io::ensure_dir(&archive_dir)?;
            let stamp = Utc::now().format("%Y%m%d-%H%M%S");
            std::fs::copy(&context, archive_dir.join(format!("execution-{stamp}.json")))?;
        }
        let temp = paths::temp_dir(&self.root);
        if temp.exists() {
            std::fs::remove_dir_all(&temp)?;
        }
        Ok(())
    }
}

fn render_markdown(state: &ExecutionState) -> String {
    let agent = state.current_agent.as_deref().unwrap_or("-");
    let task = state.current_task.as_deref().unwrap_or("-");
    format!(
        "# Pipeline State\n\n\
         - **Status**: {}\n\
         - **Current agent**: {}\n\
         - **Current task**: {}\n\
         - **Progress**: {}% ({}/{} agents)\n\
         - **Updated**: {}\n",
        state.status,
        agent,
        task,
        state.progress,
        state.agents_completed,
        state.total_agents,
        state.last_updated.to_rfc3339(),
    )
}

// ---------------------------------------------------------------------------
// RecorderObserver
// ---------------------------------------------------------------------------

/// Bridges executor callbacks into recorder updates: one significant entry
/// per agent completion, one throttled tick per phase.
pub struct RecorderObserver<'a> {
    recorder: &'a StateRecorder,
    demand: String,
}

impl<'a> RecorderObserver<'a> {
    pub fn new(recorder: &'a StateRecorder, demand: impl Into<String>) -> Self {
        Self {
            recorder,
            demand: demand.into(),
        }
    }
}

impl ExecutionObserver for RecorderObserver<'_> {
    fn on_pipeline_started(&mut self, total_agents: usize) {
        self.recorder.update(
            StatePatch {
                status: Some(PipelineStatus::Executing),
                total_agents: Some(total_agents),
                agents_completed: Some(0),
                progress: Some(0),
                ..Default::default()
            },
            StateEvent::PipelineStarted {
                demand: self.demand.clone(),
            },
        );
    }

    fn on_agent_completed(&mut self, run: &AgentRun) {
        self.recorder.update(
            StatePatch {
                current_agent: Some(run.agent_id.clone()),
                ..Default::default()
            },
            StateEvent::AgentCompleted {
                agent_id: run.agent_id.clone(),
                success: run.success,
            },
        );
    }

    fn on_phase_completed(&mut self, phase: &PhaseResult, completed: usize, total: usize) {
        let progress = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        };
        self.recorder.update(
            StatePatch {
                current_task: Some(phase.name.clone()),
                agents_completed: Some(completed),
                progress: Some(progress),
                ..Default::default()
            },
            StateEvent::ProgressTick,
        );
    }

    fn on_pipeline_completed(&mut self, success: bool) {
        self.recorder.update(
            StatePatch {
                status: Some(if success {
                    PipelineStatus::Completed
                } else {
                    PipelineStatus::Failed
                }),
                ..Default::default()
            },
            StateEvent::PipelineCompleted { success },
        );
        if success {
            if let Err(e) = self.recorder.archive() {
                tracing::warn!(error = %e, "failed to archive execution state");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
