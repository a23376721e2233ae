// Error escalation policy
//
// Recoverable errors are logged with their trace and swallowed. Fatal
// incidents are logged and then terminate the process through `abort_now`,
// which skips destructors, atexit handlers and stdio flushing. Code that
// needs guaranteed cleanup must not rely on running after a fatal incident.

use crate::domain::{ErrorRecord, Severity};
use std::error::Error;
use tracing::{debug, error, event, Level};

/// What a fatal escalation is about
#[derive(Debug, Clone, Copy)]
pub enum Incident<'a> {
    Error(&'a (dyn Error + 'static)),
    Message(&'a str),
}

impl<'a> From<&'a str> for Incident<'a> {
    fn from(msg: &'a str) -> Self {
        Incident::Message(msg)
    }
}

/// Render an error and its source chain as one line
pub fn error_chain(err: &(dyn Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Log an error that execution survives
///
/// Returns the captured record so callers can inspect it.
pub fn log_recoverable(err: &(dyn Error + 'static), context: Option<&str>) -> ErrorRecord {
    let record = ErrorRecord::capture(
        Severity::Recoverable,
        context.map(str::to_string),
        error_chain(err),
    );
    emit(&record);
    record
}

/// Log a fatal incident and, if `exit_code` is set, terminate immediately
///
/// Errors are always logged at ERROR with their trace; plain messages are
/// logged at `level`. With `exit_code == None` this returns normally.
pub fn log_fatal(incident: Incident<'_>, level: Level, exit_code: Option<i32>) {
    match incident {
        Incident::Error(err) => {
            let record = ErrorRecord::capture(Severity::Fatal, None, error_chain(err));
            emit(&record);
        }
        Incident::Message(msg) => log_at(level, msg),
    }

    if let Some(code) = exit_code {
        error!(exit_code = code, "Terminating process");
        abort_now(code);
    }
}

/// Log a fatal incident at ERROR and terminate with `exit_code`
pub fn escalate_fatal(incident: Incident<'_>, exit_code: i32) -> ! {
    log_fatal(incident, Level::ERROR, None);
    error!(exit_code, "Terminating process");
    abort_now(exit_code)
}

/// Terminate the process now
///
/// Deliberately bypasses unwinding, `Drop` impls and atexit handlers.
pub fn abort_now(exit_code: i32) -> ! {
    #[cfg(unix)]
    {
        // SAFETY: _exit(2) is async-signal-safe and never returns
        unsafe { nix::libc::_exit(exit_code) }
    }

    #[cfg(not(unix))]
    {
        std::process::exit(exit_code)
    }
}

fn emit(record: &ErrorRecord) {
    error!(severity = %record.severity, "{}", record);
    for line in record.trace_lines() {
        debug!("  {}", line);
    }
}

// event! needs a constant level
fn log_at(level: Level, msg: &str) {
    match level {
        Level::TRACE => event!(Level::TRACE, "{}", msg),
        Level::DEBUG => event!(Level::DEBUG, "{}", msg),
        Level::INFO => event!(Level::INFO, "{}", msg),
        Level::WARN => event!(Level::WARN, "{}", msg),
        _ => event!(Level::ERROR, "{}", msg),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::error::AppError;

    #[test]
    fn test_error_chain_includes_sources() {
        let err = AppError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert_eq!(error_chain(&err), "IO error: no such file: no such file");
    }

    #[test]
    fn test_log_recoverable_returns_record() {
        let err = DomainError::UnknownType("float".to_string());
        let record = log_recoverable(&err, Some("refresh load"));

        assert_eq!(record.severity, Severity::Recoverable);
        assert_eq!(record.to_string(), "refresh load: Unknown semantic type: float");
    }

    #[test]
    fn test_log_fatal_without_exit_returns() {
        let err = DomainError::Derivation("bad mode".to_string());
        log_fatal(Incident::Error(&err), Level::ERROR, None);
        log_fatal(Incident::from("plain message"), Level::WARN, None);
    }
}
