// Task Unit Domain Model

use serde::{Deserialize, Serialize};

/// Exit code used by fatal escalation unless a launcher overrides it
pub const DEFAULT_FATAL_EXIT_CODE: i32 = 1;

/// Execution Mode of a background unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionMode {
    /// Shares address space and file descriptors with the caller
    Thread,
    /// Isolated child process, bound to die with its parent
    Process,
}

impl std::fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionMode::Thread => write!(f, "THREAD"),
            ExecutionMode::Process => write!(f, "PROCESS"),
        }
    }
}

/// A named unit of background work
///
/// Created once per wrapped routine. Running/terminated status is never
/// tracked: every launch produces a brand-new detached unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUnit {
    pub name: String,
    pub mode: ExecutionMode,
    pub exit_code: i32,
}

impl TaskUnit {
    pub fn new(name: impl Into<String>, mode: ExecutionMode) -> Self {
        Self {
            name: name.into(),
            mode,
            exit_code: DEFAULT_FATAL_EXIT_CODE,
        }
    }

    /// Override the exit code applied when this unit fails
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }
}
