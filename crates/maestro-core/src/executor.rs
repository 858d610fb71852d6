use crate::catalog::Catalog;
use crate::pipeline::{Phase, Pipeline};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// Invocation boundary
// ---------------------------------------------------------------------------

/// One request to the external assistant.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub agent_id: String,
    pub working_dir: PathBuf,
    pub prompt: String,
    pub timeout: Duration,
    pub interactive: bool,
    pub auto_approve: bool,
}

/// The boundary's answer, returned as a value — the fallback decision is a
/// plain branch, never exception handling.
#[derive(Debug, Clone, PartialEq)]
pub enum InvocationOutcome {
    Success {
        output: String,
        files_created: Option<u32>,
    },
    Timeout,
    ToolUnavailable,
    NonZeroExit {
        code: Option<i32>,
        stderr: String,
    },
}

impl InvocationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, InvocationOutcome::Success { .. })
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            InvocationOutcome::Success { .. } => None,
            InvocationOutcome::Timeout => Some("invocation timed out".to_string()),
            InvocationOutcome::ToolUnavailable => {
                Some("external assistant not found on PATH".to_string())
            }
            InvocationOutcome::NonZeroExit { code, stderr } => {
                let code = code.map_or("signal".to_string(), |c| c.to_string());
                if stderr.is_empty() {
                    Some(format!("assistant exited with code {code}"))
                } else {
                    Some(format!("assistant exited with code {code}: {stderr}"))
                }
            }
        }
    }
}

/// The seam to the real `claude` subprocess (or a mock in tests).
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    async fn invoke(&self, request: &InvocationRequest) -> InvocationOutcome;
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct AgentRun {
    pub agent_id: String,
    pub phase: String,
    pub success: bool,
    /// True when the run came from the fallback/simulation path.
    pub simulated: bool,
    pub duration_ms: u64,
    pub files_created: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub name: String,
    pub outcome: PhaseOutcome,
    pub runs: Vec<AgentRun>,
}

#[derive(Debug, Serialize)]
pub struct ExecutionResult {
    pub success: bool,
    pub agents_executed: usize,
    pub files_modified: u64,
    pub phases: Vec<PhaseResult>,
    #[serde(skip)]
    pub duration: Duration,
}

impl ExecutionResult {
    /// The name of the first failed phase, if any.
    pub fn blocking_phase(&self) -> Option<&PhaseResult> {
        self.phases
            .iter()
            .find(|p| p.outcome == PhaseOutcome::Failed)
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Direct callbacks from the executor — state persistence and metrics hang
/// off these instead of polling marker files.
pub trait ExecutionObserver {
    fn on_pipeline_started(&mut self, _total_agents: usize) {}
    fn on_agent_completed(&mut self, _run: &AgentRun) {}
    fn on_phase_completed(&mut self, _phase: &PhaseResult, _completed: usize, _total: usize) {}
    fn on_pipeline_completed(&mut self, _success: bool) {}
}

/// No-op observer for callers that don't track progress.
pub struct NullObserver;

impl ExecutionObserver for NullObserver {}

// ---------------------------------------------------------------------------
// ExecutorOptions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    /// Attempt the simulated path when a real invocation fails.
    pub allow_fallback: bool,
    pub timeout: Duration,
    pub interactive: bool,
    pub auto_approve: bool,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            allow_fallback: true,
            timeout: Duration::from_secs(120),
            interactive: false,
            auto_approve: true,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineExecutor
// ---------------------------------------------------------------------------

/// Walks a pipeline's phases in order, driving the invocation boundary.
///
/// Sequential phases stop at the first mandatory failure; parallel phases
/// use all-settled semantics — every sibling's outcome is collected before
/// the phase verdict. A `ToolUnavailable` outcome flips a standing
/// simulation mode for the remainder of the execution.
pub struct PipelineExecutor<'a> {
    invoker: &'a dyn AgentInvoker,
    catalog: &'a Catalog,
    options: ExecutorOptions,
    simulation_mode: bool,
}

impl<'a> PipelineExecutor<'a> {
    pub fn new(invoker: &'a dyn AgentInvoker, catalog: &'a Catalog, options: ExecutorOptions) -> Self {
        Self {
            invoker,
            catalog,
            options,
            simulation_mode: false,
        }
    }

    pub async fn execute(
        &mut self,
        pipeline: &Pipeline,
        demand: &str,
        working_dir: &Path,
        observer: &mut dyn ExecutionObserver,
    ) -> ExecutionResult {
        let started = Instant::now();
        let total = pipeline.total_agents();
        observer.on_pipeline_started(total);

        let mut phases: Vec<PhaseResult> = Vec::new();
        let mut completed = 0usize;
        let mut aborted = false;

        for phase in &pipeline.phases {
            let result = if phase.parallel {
                self.run_parallel_phase(phase, demand, working_dir).await
            } else {
                self.run_sequential_phase(phase, demand, working_dir).await
            };

            for run in &result.runs {
                completed += 1;
                observer.on_agent_completed(run);
            }
            observer.on_phase_completed(&result, completed, total);

            let failed = result.outcome == PhaseOutcome::Failed;
            phases.push(result);
            if failed {
                tracing::warn!(phase = %phase.name, "mandatory phase failed, aborting pipeline");
                aborted = true;
                break;
            }
        }

        let success = !aborted;
        observer.on_pipeline_completed(success);

        ExecutionResult {
            success,
            agents_executed: phases.iter().map(|p| p.runs.len()).sum(),
            files_modified: phases
                .iter()
                .flat_map(|p| p.runs.iter())
                .map(|r| u64::from(r.files_created))
                .sum(),
            phases,
            duration: started.elapsed(),
        }
    }

    async fn run_sequential_phase(
        &mut self,
        phase: &Phase,
        demand: &str,
        working_dir: &Path,
    ) -> PhaseResult {
        let mut runs = Vec::with_capacity(phase.agent_ids.len());
        let mut failed = false;

        // Agent N+1 never starts before agent N's outcome is known.
        for agent_id in &phase.agent_ids {
            let (run, tool_missing) = self
                .run_one(&phase.name, agent_id, demand, working_dir)
                .await;
            if tool_missing {
                self.simulation_mode = true;
            }
            let success = run.success;
            runs.push(run);

            if !success && phase.mandatory {
                // Abort the phase: remaining agents are never invoked.
                failed = true;
                break;
            }
        }

        PhaseResult {
            name: phase.name.clone(),
            outcome: if failed {
                PhaseOutcome::Failed
            } else {
                PhaseOutcome::Succeeded
            },
            runs,
        }
    }

    async fn run_parallel_phase(
        &mut self,
        phase: &Phase,
        demand: &str,
        working_dir: &Path,
    ) -> PhaseResult {
        // All-settled: one agent's failure never cancels its siblings.
        let futures = phase
            .agent_ids
            .iter()
            .map(|id| self.run_one(&phase.name, id, demand, working_dir));
        let settled = futures::future::join_all(futures).await;

        let mut runs = Vec::with_capacity(settled.len());
        for (run, tool_missing) in settled {
            if tool_missing {
                self.simulation_mode = true;
            }
            runs.push(run);
        }

        let failed = phase.mandatory && runs.iter().any(|r| !r.success);
        PhaseResult {
            name: phase.name.clone(),
            outcome: if failed {
                PhaseOutcome::Failed
            } else {
                PhaseOutcome::Succeeded
            },
            runs,
        }
    }

    /// Run one agent: real invocation, then the fallback path when allowed.
    /// Returns the run plus whether the external tool was found missing.
    async fn run_one(
        &self,
        phase_name: &str,
        agent_id: &str,
        demand: &str,
        working_dir: &Path,
    ) -> (AgentRun, bool) {
        let started = Instant::now();

        if self.simulation_mode {
            let run = simulated_run(phase_name, agent_id, started, None);
            return (run, false);
        }

        let request = InvocationRequest {
            agent_id: agent_id.to_string(),
            working_dir: working_dir.to_path_buf(),
            prompt: self.build_prompt(agent_id, demand, working_dir),
            timeout: self.options.timeout,
            interactive: self.options.interactive,
            auto_approve: self.options.auto_approve,
        };

        tracing::debug!(agent = agent_id, phase = phase_name, "invoking agent");
        let outcome = self.invoker.invoke(&request).await;
        let tool_missing = outcome == InvocationOutcome::ToolUnavailable;

        match outcome {
            InvocationOutcome::Success {
                output: _,
                files_created,
            } => (
                AgentRun {
                    agent_id: agent_id.to_string(),
                    phase: phase_name.to_string(),
                    success: true,
                    simulated: false,
                    duration_ms: started.elapsed().as_millis() as u64,
                    files_created: files_created.unwrap_or(0),
                    error: None,
                },
                false,
            ),
            failure => {
                let message = failure.error_message().unwrap_or_default();
                tracing::warn!(agent = agent_id, error = %message, "agent invocation failed");

                if self.options.allow_fallback {
                    (
                        simulated_run(phase_name, agent_id, started, Some(message)),
                        tool_missing,
                    )
                } else {
                    (
                        AgentRun {
                            agent_id: agent_id.to_string(),
                            phase: phase_name.to_string(),
                            success: false,
                            simulated: false,
                            duration_ms: started.elapsed().as_millis() as u64,
                            files_created: 0,
                            error: Some(message),
                        },
                        tool_missing,
                    )
                }
            }
        }
    }

    fn build_prompt(&self, agent_id: &str, demand: &str, working_dir: &Path) -> String {
        let mut vars = HashMap::new();
        vars.insert("demand", demand.to_string());
        vars.insert("working_dir", working_dir.display().to_string());
        match self.catalog.render_prompt(agent_id, &vars) {
            Ok(prompt) if !prompt.trim().is_empty() => prompt,
            // An unknown or empty persona degrades to the raw demand.
            _ => demand.to_string(),
        }
    }
}

/// The deterministic fallback: always succeeds, marked simulated, touches
/// nothing on disk.
fn simulated_run(
    phase_name: &str,
    agent_id: &str,
    started: Instant,
    original_error: Option<String>,
) -> AgentRun {
    AgentRun {
        agent_id: agent_id.to_string(),
        phase: phase_name.to_string(),
        success: true,
        simulated: true,
        duration_ms: started.elapsed().as_millis() as u64,
        files_created: 0,
        error: original_error,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
