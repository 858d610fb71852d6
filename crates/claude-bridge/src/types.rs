use std::path::PathBuf;
use std::time::Duration;

// ─── InvokeOptions ────────────────────────────────────────────────────────

/// Options for one Claude CLI invocation.
#[derive(Debug, Clone)]
pub struct InvokeOptions {
    /// Model name passed as `--model`.
    pub model: Option<String>,
    /// Hard deadline; the subprocess is killed when it elapses.
    pub timeout: Duration,
    /// Inherit the terminal instead of capturing output — the user drives
    /// approvals directly.
    pub interactive: bool,
    /// Auto-accept file edits (`--permission-mode acceptEdits`).
    pub auto_approve: bool,
    /// Working directory for the subprocess (default: current dir).
    pub cwd: Option<PathBuf>,
    /// Custom path to the `claude` binary (default: `"claude"`).
    pub path_to_executable: Option<String>,
}

impl Default for InvokeOptions {
    fn default() -> Self {
        Self {
            model: None,
            timeout: Duration::from_secs(120),
            interactive: false,
            auto_approve: true,
            cwd: None,
            path_to_executable: None,
        }
    }
}

// ─── InvokeOutcome ────────────────────────────────────────────────────────

/// The boundary's verdict, returned as a value so callers branch instead of
/// catching. `ToolUnavailable` means the binary isn't on PATH at all —
/// callers typically switch to simulation for the rest of the session.
#[derive(Debug, Clone, PartialEq)]
pub enum InvokeOutcome {
    Completed {
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

impl InvokeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, InvokeOutcome::Completed { .. })
    }
}
