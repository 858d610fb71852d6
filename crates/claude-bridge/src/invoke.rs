use crate::process::{build_command, ClaudeProcess};
use crate::types::{InvokeOptions, InvokeOutcome};
use crate::Result;

// ─── Public API ───────────────────────────────────────────────────────────

/// Drive a single Claude CLI invocation to completion.
///
/// The four expected endings — completed, timeout, binary missing, non-zero
/// exit — come back as an [`InvokeOutcome`] value. `Err` is reserved for
/// unexpected plumbing failures (e.g. the pipe read itself failing).
///
/// On timeout the subprocess is forcibly terminated before returning.
pub async fn invoke(prompt: &str, opts: &InvokeOptions) -> Result<InvokeOutcome> {
    let exe = opts.path_to_executable.as_deref().unwrap_or("claude");
    if which::which(exe).is_err() {
        tracing::warn!(exe, "assistant binary not found on PATH");
        return Ok(InvokeOutcome::ToolUnavailable);
    }

    let cmd = build_command(prompt, opts);
    let mut process = if opts.interactive {
        ClaudeProcess::spawn_interactive(cmd)?
    } else {
        ClaudeProcess::spawn(cmd)?
    };

    match tokio::time::timeout(opts.timeout, process.wait_with_output()).await {
        Err(_elapsed) => {
            tracing::warn!(timeout_secs = opts.timeout.as_secs(), "invocation timed out");
            process.kill().await;
            Ok(InvokeOutcome::Timeout)
        }
        Ok(Err(e)) => {
            process.kill().await;
            Err(e)
        }
        Ok(Ok((code, output))) => match code {
            Some(0) => Ok(InvokeOutcome::Completed {
                output,
                files_created: None,
            }),
            code => Ok(InvokeOutcome::NonZeroExit {
                code,
                stderr: process.stderr(),
            }),
        },
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Write an executable shell script and return its path.
    #[cfg(unix)]
    fn script(dir: &tempfile::TempDir, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.path().join("fake-claude");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn opts(exe: String) -> InvokeOptions {
        InvokeOptions {
            path_to_executable: Some(exe),
            timeout: Duration::from_secs(5),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_binary_is_tool_unavailable() {
        let options = opts("definitely-not-a-real-binary-xyz".to_string());
        let outcome = invoke("hello", &options).await.unwrap();
        assert_eq!(outcome, InvokeOutcome::ToolUnavailable);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn zero_exit_captures_output() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = opts(script(&dir, "echo agent output"));
        let outcome = invoke("hello", &options).await.unwrap();
        match outcome {
            InvokeOutcome::Completed { output, .. } => {
                assert!(output.contains("agent output"));
            }
            other => panic!("expected Completed, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_carries_code_and_stderr() {
        let dir = tempfile::TempDir::new().unwrap();
        let options = opts(script(&dir, "echo broken >&2\nexit 3"));
        let outcome = invoke("hello", &options).await.unwrap();
        match outcome {
            InvokeOutcome::NonZeroExit { code, stderr } => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("broken"));
            }
            other => panic!("expected NonZeroExit, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_process_times_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut options = opts(script(&dir, "sleep 30"));
        options.timeout = Duration::from_millis(200);
        let outcome = invoke("hello", &options).await.unwrap();
        assert_eq!(outcome, InvokeOutcome::Timeout);
    }
}
