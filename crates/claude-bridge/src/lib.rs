//! `claude-bridge` — subprocess boundary to the Claude CLI.
//!
//! One call in, one verdict out:
//!
//! ```text
//! InvokeOptions
//!     │
//!     ▼
//! ClaudeProcess   ← spawns `claude -p <prompt> --output-format text …`
//!     │              drains stderr in a background task
//!     ▼
//! InvokeOutcome   ← Completed | Timeout | ToolUnavailable | NonZeroExit
//! ```
//!
//! The outcome is a returned value, never an exception path — the caller's
//! fallback decision is a plain branch. Timeouts forcibly terminate the
//! subprocess; `kill_on_drop` covers cancellation (Ctrl-C) as well.

pub mod error;
pub mod invoke;
pub mod types;

pub(crate) mod process;

pub use error::BridgeError;
pub use invoke::invoke;
pub use types::{InvokeOptions, InvokeOutcome};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, BridgeError>;
