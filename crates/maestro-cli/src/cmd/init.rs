use anyhow::Context;
use maestro_core::{config::Config, io, paths, state::StateRecorder};
use std::path::Path;

// ---------------------------------------------------------------------------
// Starter personas
// ---------------------------------------------------------------------------

/// The default catalog written on init. Bodies are plain prompt text with
/// `{{demand}}` / `{{working_dir}}` placeholders; users edit or add files
/// under `.maestro/agents/` to customise.
const STARTER_AGENTS: &[(&str, &str)] = &[
    (
        "agent_roundtable",
        "---\nname: Roundtable Planner\ndescription: Breaks complex demands into an ordered work plan before any code is written\ntags: [Read, Glob, Grep]\npriority: system\ncategory: orchestration\n---\n\nYou are the planning roundtable. Study the project in {{working_dir}} and produce a short, ordered plan for this demand before any implementation starts:\n\n{{demand}}\n\nList the concrete steps, the files you expect to change, and any risk worth flagging. Do not write code.\n",
    ),
    (
        "agent_task_classifier",
        "---\nname: Task Classifier\ndescription: Restates the demand and confirms the detected task type and scope\ntags: [Read]\npriority: system\ncategory: orchestration\n---\n\nRestate the following demand in one paragraph, confirm what kind of task it is, and note anything ambiguous:\n\n{{demand}}\n",
    ),
    (
        "agent_react_components",
        "---\nname: React Components\ndescription: Creates React components with hooks, props typing and sensible structure\ntags: [Read, Write, Edit]\npriority: high\ncategory: frontend\n---\n\nImplement the React components needed for:\n\n{{demand}}\n\nFollow the existing component conventions in {{working_dir}}. Use function components and hooks; keep props typed.\n",
    ),
    (
        "agent_styling",
        "---\nname: Styling\ndescription: Applies styling with the project's CSS or Tailwind conventions\ntags: [Read, Write, Edit]\npriority: normal\ncategory: frontend\n---\n\nStyle the result of this demand using the project's existing styling approach (Tailwind or CSS modules):\n\n{{demand}}\n",
    ),
    (
        "agent_test_validator",
        "---\nname: Test Validator\ndescription: Writes and runs tests that validate the demanded behavior end to end\ntags: [Read, Write, Bash]\npriority: high\ncategory: testing\n---\n\nWrite tests that validate:\n\n{{demand}}\n\nRun the project's test suite in {{working_dir}} and fix failures you introduced.\n",
    ),
    (
        "agent_integration_tests",
        "---\nname: Integration Tests\ndescription: Adds integration test coverage for cross-module behavior\ntags: [Read, Write, Bash]\npriority: normal\ncategory: testing\n---\n\nAdd integration tests covering:\n\n{{demand}}\n",
    ),
    (
        "agent_accessibility",
        "---\nname: Accessibility\ndescription: Audits and fixes accessibility issues (ARIA, contrast, keyboard navigation)\ntags: [Read, Edit]\npriority: normal\ncategory: frontend\n---\n\nAudit the surfaces touched by this demand for accessibility problems and fix them:\n\n{{demand}}\n",
    ),
    (
        "agent_pwa",
        "---\nname: Progressive Web App\ndescription: Adds offline support, manifest and service worker wiring\ntags: [Read, Write, Edit]\npriority: normal\ncategory: frontend\n---\n\nImplement the progressive-web-app aspects of:\n\n{{demand}}\n",
    ),
    (
        "agent_figma_extract",
        "---\nname: Design Extraction\ndescription: Translates design references into component structure and tokens\ntags: [Read, Write]\npriority: normal\ncategory: frontend\n---\n\nExtract the design intent referenced by this demand into concrete markup and tokens:\n\n{{demand}}\n",
    ),
    (
        "agent_nestjs_backend",
        "---\nname: NestJS Backend\ndescription: Builds NestJS modules, controllers and services\ntags: [Read, Write, Edit, Bash]\npriority: high\ncategory: backend\n---\n\nImplement the NestJS backend work for:\n\n{{demand}}\n\nFollow the module/controller/service layout already present in {{working_dir}}.\n",
    ),
    (
        "agent_golang_backend",
        "---\nname: Go Backend\ndescription: Builds Go services and HTTP handlers\ntags: [Read, Write, Edit, Bash]\npriority: high\ncategory: backend\n---\n\nImplement the Go backend work for:\n\n{{demand}}\n",
    ),
    (
        "agent_code_quality",
        "---\nname: Code Quality\ndescription: Reviews the changes for quality, naming and dead code; applies small fixes\ntags: [Read, Edit, Bash]\npriority: normal\ncategory: quality\n---\n\nReview everything changed for this demand and clean it up — naming, duplication, dead code, missing error handling:\n\n{{demand}}\n",
    ),
    (
        "agent_deployment",
        "---\nname: Deployment\ndescription: Prepares deploy configuration and CI steps\ntags: [Read, Write, Bash]\npriority: normal\ncategory: infrastructure\n---\n\nPrepare the deployment pieces for:\n\n{{demand}}\n",
    ),
    (
        "agent_memory_context",
        "---\nname: Memory Context\ndescription: Records decisions and context from this run for future sessions\ntags: [Read, Write]\npriority: low\ncategory: utility\n---\n\nSummarise the decisions made while handling this demand and store them as project notes:\n\n{{demand}}\n",
    ),
    (
        "agent_github_integration",
        "---\nname: GitHub Integration\ndescription: Creates branches and commits for the changes produced by the pipeline\ntags: [Bash]\npriority: low\ncategory: utility\n---\n\nCommit the work produced for this demand on a sensibly named branch:\n\n{{demand}}\n",
    ),
    (
        "agent_github_issues",
        "---\nname: GitHub Issues\ndescription: Files follow-up issues for anything the pipeline left undone\ntags: [Bash]\npriority: low\ncategory: utility\n---\n\nFile follow-up issues for loose ends from:\n\n{{demand}}\n",
    ),
];

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

/// Scaffold `.maestro/`. Idempotent: existing files are left untouched.
pub fn run(root: &Path) -> anyhow::Result<()> {
    io::ensure_dir(&paths::maestro_dir(root)).context("failed to create .maestro/")?;
    io::ensure_dir(&paths::agents_dir(root))?;
    io::ensure_dir(&paths::temp_dir(root))?;

    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::default()
            .save(root)
            .context("failed to write default config")?;
    }

    let mut written = 0;
    for (id, content) in STARTER_AGENTS {
        if io::write_if_missing(&paths::agent_file(root, id), content.as_bytes())? {
            written += 1;
        }
    }

    StateRecorder::new(root)
        .init()
        .context("failed to write initial state")?;

    // Scratch state is per-run noise, keep it out of version control.
    io::ensure_gitignore_entry(root, ".maestro/temp/")?;
    io::ensure_gitignore_entry(root, ".maestro/archives/")?;

    println!(
        "Initialized .maestro/ ({} agent persona{} written)",
        written,
        if written == 1 { "" } else { "s" }
    );
    Ok(())
}
