// Protective boundary around a background routine
use crate::error::AppError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Result of a guarded execution
#[derive(Debug)]
pub enum GuardOutcome {
    /// Routine returned Ok
    Completed,
    /// Routine returned an error
    Failed(AppError),
    /// Routine panicked
    Panicked(String),
}

/// Execute a routine, catching both returned errors and panics
///
/// Nothing escapes: the caller decides what to do with the outcome.
///
/// # Example
/// ```text
/// match execute_guarded(|| refresh(&table)) {
///     GuardOutcome::Completed => {}
///     GuardOutcome::Failed(e) => escalate_fatal(Incident::Error(&e), 1),
///     GuardOutcome::Panicked(msg) => escalate_fatal(Incident::Message(&msg), 1),
/// }
/// ```
pub fn execute_guarded<F>(f: F) -> GuardOutcome
where
    F: FnOnce() -> crate::Result<()>,
{
    // The unit is torn down on any failure, so no broken state is observed
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => GuardOutcome::Completed,
        Ok(Err(e)) => GuardOutcome::Failed(e),
        Err(payload) => GuardOutcome::Panicked(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
