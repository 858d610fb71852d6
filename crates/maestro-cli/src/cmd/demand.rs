use anyhow::Context;
use async_trait::async_trait;
use clap::Args;
use maestro_core::{
    catalog::Catalog,
    classifier::{Classification, DemandClassifier},
    config::Config,
    executor::{
        AgentInvoker, AgentRun, ExecutionObserver, ExecutionResult, ExecutorOptions,
        InvocationOutcome, InvocationRequest, PhaseResult, PipelineExecutor,
    },
    metrics::{MetricsObserver, MetricsStore},
    pipeline::{BuildOptions, Pipeline, PipelineBuilder},
    state::{RecorderObserver, StateRecorder},
    types::{BuilderPolicy, ProjectType},
};
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct DemandArgs {
    /// The demand — a free-text description of what to build
    #[arg(required = true, num_args = 1..)]
    demand: Vec<String>,

    /// Classify and print the pipeline without executing it
    #[arg(long)]
    dry_run: bool,

    /// Full builder policy: planning roundtable and memory enrichment (default)
    #[arg(long, conflicts_with = "standard")]
    enhanced: bool,

    /// Lean builder policy: skip planning and memory enrichment
    #[arg(long)]
    standard: bool,

    /// Capture assistant output instead of attaching the terminal
    #[arg(long)]
    non_interactive: bool,

    /// Skip the GitHub integration agents
    #[arg(long)]
    no_github: bool,

    /// Fail agents outright instead of falling back to simulation
    #[arg(long)]
    no_fallback: bool,

    /// Project context: frontend, backend or fullstack
    #[arg(long, default_value = "fullstack")]
    project_type: ProjectType,
}

// ---------------------------------------------------------------------------
// Exit mapping — typed non-zero exits (no std::process::exit in cmd code)
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct PipelineBlocked {
    pub phase: String,
    pub failures: Vec<String>,
}

impl std::fmt::Display for PipelineBlocked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "pipeline blocked in phase '{}'", self.phase)?;
        for failure in &self.failures {
            write!(f, "\n  - {failure}")?;
        }
        Ok(())
    }
}

impl std::error::Error for PipelineBlocked {}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

pub fn run(root: &Path, args: DemandArgs, json: bool) -> anyhow::Result<()> {
    let demand = args.demand.join(" ");

    let config = Config::load(root).context("failed to load configuration")?;
    let catalog = Catalog::load(root).context("failed to load agent catalog")?;

    let classifier = DemandClassifier::new(&catalog);
    let classification = classifier.classify(&demand, args.project_type);

    // --enhanced is the default; the flags are mutually exclusive.
    let policy = match (args.enhanced, args.standard) {
        (_, true) => BuilderPolicy::Standard,
        _ => BuilderPolicy::Enhanced,
    };
    let build_opts = BuildOptions {
        policy,
        include_github: !args.no_github,
        is_git_repo: root.join(".git").is_dir(),
    };
    let pipeline = PipelineBuilder::new(&catalog, &config.pipeline).build(
        &demand,
        args.project_type,
        &build_opts,
    );

    if args.dry_run {
        return print_plan(&demand, &classification, &pipeline, json);
    }

    // Malformed metrics are a startup configuration error; a missing file
    // just starts empty.
    let mut metrics = MetricsStore::load().context("failed to load agent metrics")?;
    let recorder = StateRecorder::new(root);

    let invoker = CliInvoker {
        model: config.invocation.model.clone(),
    };
    let options = ExecutorOptions {
        allow_fallback: !args.no_fallback,
        timeout: Duration::from_secs(config.invocation.timeout_seconds),
        interactive: !args.non_interactive,
        auto_approve: config.invocation.auto_approve,
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to create tokio runtime")?;
    let result = runtime.block_on(async {
        let mut observer = DemandObserver {
            recorder: RecorderObserver::new(&recorder, demand.clone()),
            metrics: MetricsObserver::new(&mut metrics),
        };
        let mut executor = PipelineExecutor::new(&invoker, &catalog, options);

        // Ctrl-C attempts graceful termination: dropping the execute future
        // kills any in-flight subprocess (kill_on_drop in the bridge).
        tokio::select! {
            result = executor.execute(&pipeline, &demand, root, &mut observer) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        }
    });

    let Some(result) = result else {
        anyhow::bail!("interrupted — in-flight invocation terminated");
    };

    print_result(&result, json)?;

    if !result.success {
        let blocking = result.blocking_phase();
        let phase = blocking.map_or("unknown", |p| p.name.as_str()).to_string();
        let failures = blocking
            .map(|p| {
                p.runs
                    .iter()
                    .filter(|r| !r.success)
                    .map(|r| {
                        format!(
                            "{}: {}",
                            r.agent_id,
                            r.error.as_deref().unwrap_or("unknown error")
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        return Err(PipelineBlocked { phase, failures }.into());
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Invoker adapter
// ---------------------------------------------------------------------------

/// Maps the core invocation seam onto the claude-bridge subprocess call.
struct CliInvoker {
    model: String,
}

#[async_trait]
impl AgentInvoker for CliInvoker {
    async fn invoke(&self, request: &InvocationRequest) -> InvocationOutcome {
        let opts = claude_bridge::InvokeOptions {
            model: Some(self.model.clone()),
            timeout: request.timeout,
            interactive: request.interactive,
            auto_approve: request.auto_approve,
            cwd: Some(request.working_dir.clone()),
            path_to_executable: None,
        };
        match claude_bridge::invoke(&request.prompt, &opts).await {
            Ok(claude_bridge::InvokeOutcome::Completed {
                output,
                files_created,
            }) => InvocationOutcome::Success {
                output,
                files_created,
            },
            Ok(claude_bridge::InvokeOutcome::Timeout) => InvocationOutcome::Timeout,
            Ok(claude_bridge::InvokeOutcome::ToolUnavailable) => {
                InvocationOutcome::ToolUnavailable
            }
            Ok(claude_bridge::InvokeOutcome::NonZeroExit { code, stderr }) => {
                InvocationOutcome::NonZeroExit { code, stderr }
            }
            Err(e) => InvocationOutcome::NonZeroExit {
                code: None,
                stderr: e.to_string(),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Observer composition
// ---------------------------------------------------------------------------

/// Fans executor callbacks out to state persistence and metrics.
struct DemandObserver<'a> {
    recorder: RecorderObserver<'a>,
    metrics: MetricsObserver<'a>,
}

impl ExecutionObserver for DemandObserver<'_> {
    fn on_pipeline_started(&mut self, total_agents: usize) {
        self.recorder.on_pipeline_started(total_agents);
        self.metrics.on_pipeline_started(total_agents);
    }
    fn on_agent_completed(&mut self, run: &AgentRun) {
        self.recorder.on_agent_completed(run);
        self.metrics.on_agent_completed(run);
    }
    fn on_phase_completed(&mut self, phase: &PhaseResult, completed: usize, total: usize) {
        self.recorder.on_phase_completed(phase, completed, total);
        self.metrics.on_phase_completed(phase, completed, total);
    }
    fn on_pipeline_completed(&mut self, success: bool) {
        self.recorder.on_pipeline_completed(success);
        self.metrics.on_pipeline_completed(success);
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct Plan<'a> {
    demand: &'a str,
    classification: &'a Classification,
    pipeline: &'a Pipeline,
}

fn print_plan(
    demand: &str,
    classification: &Classification,
    pipeline: &Pipeline,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        return crate::output::print_json(&Plan {
            demand,
            classification,
            pipeline,
        });
    }

    println!("Demand:      {demand}");
    println!(
        "Task type:   {} (confidence {:.2})",
        classification.task_type, classification.confidence
    );
    if classification.is_full_stack_task {
        println!("Stack:       fullstack");
    } else if classification.is_backend_task {
        println!("Stack:       backend");
    } else if classification.is_frontend_task {
        println!("Stack:       frontend");
    }
    println!();

    let rows = pipeline
        .phases
        .iter()
        .enumerate()
        .map(|(i, p)| {
            vec![
                (i + 1).to_string(),
                p.name.clone(),
                p.agent_ids.join(", "),
                if p.parallel { "parallel" } else { "sequential" }.to_string(),
                if p.mandatory { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    crate::output::print_table(&["#", "phase", "agents", "mode", "mandatory"], rows);
    Ok(())
}

fn print_result(result: &ExecutionResult, json: bool) -> anyhow::Result<()> {
    if json {
        return crate::output::print_json(result);
    }

    for phase in &result.phases {
        for run in &phase.runs {
            let marker = match (run.success, run.simulated) {
                (true, false) => "ok",
                (true, true) => "ok (simulated)",
                _ => "FAILED",
            };
            println!("  {} {} [{}] {}ms", phase.name, run.agent_id, marker, run.duration_ms);
        }
    }
    println!();
    println!(
        "{}: {} agent(s) executed, {} file(s) modified in {:.1}s",
        if result.success { "Completed" } else { "Failed" },
        result.agents_executed,
        result.files_modified,
        result.duration.as_secs_f64()
    );
    Ok(())
}
