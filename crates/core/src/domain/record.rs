// Error Record - classified failure with diagnostic trace

use std::backtrace::Backtrace;

/// Disposition of an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Logged and swallowed; the fallback value is retained
    Recoverable,
    /// Logged, then the process terminates
    Fatal,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Recoverable => write!(f, "RECOVERABLE"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

#[derive(Debug)]
pub struct ErrorRecord {
    pub severity: Severity,
    pub message: Option<String>,
    pub detail: String,
    pub trace: Backtrace,
}

impl ErrorRecord {
    /// Capture a record at the call site (trace is always captured)
    pub fn capture(severity: Severity, message: Option<String>, detail: impl Into<String>) -> Self {
        Self {
            severity,
            message,
            detail: detail.into(),
            trace: Backtrace::force_capture(),
        }
    }

    /// Trace rendered line by line
    pub fn trace_lines(&self) -> Vec<String> {
        self.trace
            .to_string()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{}: {}", msg, self.detail),
            None => f.write_str(&self.detail),
        }
    }
}
