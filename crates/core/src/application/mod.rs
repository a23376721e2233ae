// Application Layer - Execution and extraction engines

pub mod escalation;
pub mod executor;
pub mod extract;

// Re-exports
pub use escalation::{abort_now, escalate_fatal, log_fatal, log_recoverable, Incident};
pub use executor::{wrap, Launcher, ProcessSpawner, ThreadSpawner};
pub use extract::{extract_rows, extract_value, refresh_from_text, ParserConfig, PathSpec};
