use std::process::Stdio;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{Child, Command};

use crate::types::InvokeOptions;
use crate::{BridgeError, Result};

// ─── Command builder ──────────────────────────────────────────────────────

pub(crate) fn build_command(prompt: &str, opts: &InvokeOptions) -> Command {
    let exe = opts.path_to_executable.as_deref().unwrap_or("claude");
    let mut cmd = Command::new(exe);

    if opts.interactive {
        // Interactive: the prompt is the positional arg and the terminal is
        // inherited so the user can answer approval prompts.
        cmd.arg(prompt);
    } else {
        cmd.arg("-p").arg(prompt).arg("--output-format").arg("text");
    }

    if let Some(model) = &opts.model {
        cmd.arg("--model").arg(model);
    }

    if opts.auto_approve {
        cmd.arg("--permission-mode").arg("acceptEdits");
    }

    if let Some(cwd) = &opts.cwd {
        cmd.current_dir(cwd);
    }

    // `CLAUDECODE` is removed so this works both from a terminal and from
    // inside a running Claude session.
    cmd.env_remove("CLAUDECODE");

    // If the caller's future is cancelled (Ctrl-C, timeout race), the
    // subprocess must not outlive it.
    cmd.kill_on_drop(true);

    cmd
}

// ─── ClaudeProcess ────────────────────────────────────────────────────────

/// A running `claude` subprocess with captured output.
///
/// Stderr is drained by a background task and surfaced on non-zero exit,
/// so a chatty failing process can't deadlock on a full pipe.
pub(crate) struct ClaudeProcess {
    child: Child,
    stdout: Option<tokio::process::ChildStdout>,
    stderr_buf: Arc<Mutex<String>>,
}

impl ClaudeProcess {
    pub(crate) fn spawn(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(BridgeError::Io)?;

        let stdout = child.stdout.take();

        let stderr_buf = Arc::new(Mutex::new(String::new()));
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                use tokio::io::AsyncBufReadExt;
                let mut reader = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = reader.next_line().await {
                    if let Ok(mut b) = buf.lock() {
                        if !b.is_empty() {
                            b.push('\n');
                        }
                        b.push_str(&line);
                    }
                }
            });
        }

        Ok(Self {
            child,
            stdout,
            stderr_buf,
        })
    }

    /// Spawn with the terminal inherited; nothing is captured.
    pub(crate) fn spawn_interactive(mut cmd: Command) -> Result<Self> {
        cmd.stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        let child = cmd.spawn().map_err(BridgeError::Io)?;
        Ok(Self {
            child,
            stdout: None,
            stderr_buf: Arc::new(Mutex::new(String::new())),
        })
    }

    /// Drain stdout to completion and wait for exit.
    /// Returns `(exit_code, stdout)`; `None` code means killed by signal.
    pub(crate) async fn wait_with_output(&mut self) -> Result<(Option<i32>, String)> {
        let mut output = String::new();
        if let Some(mut stdout) = self.stdout.take() {
            stdout
                .read_to_string(&mut output)
                .await
                .map_err(BridgeError::Io)?;
        }
        let status = self.child.wait().await.map_err(BridgeError::Io)?;
        Ok((status.code(), output))
    }

    pub(crate) fn stderr(&self) -> String {
        self.stderr_buf
            .lock()
            .ok()
            .map(|b| b.clone())
            .unwrap_or_default()
    }

    /// Kill the subprocess (best-effort; errors are silently ignored).
    pub(crate) async fn kill(&mut self) {
        let _ = self.child.kill().await;
    }
}
