// Central Error Type for the Application

use crate::domain::Severity;
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Execution error: {0}")]
    Execution(#[from] crate::port::ExecutionError),

    #[error("Task failed: {0}")]
    Task(String),
}

impl AppError {
    /// Default disposition of this error outside a background unit
    ///
    /// Anything escaping a background unit is fatal regardless of this.
    pub fn severity(&self) -> Severity {
        match self {
            AppError::Task(_) => Severity::Fatal,
            AppError::Domain(_)
            | AppError::Io(_)
            | AppError::Config(_)
            | AppError::Execution(_) => Severity::Recoverable,
        }
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;

    #[test]
    fn test_severity_classification() {
        let conversion: AppError = DomainError::UnknownType("float".to_string()).into();
        assert_eq!(conversion.severity(), Severity::Recoverable);

        let io: AppError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(io.severity(), Severity::Recoverable);

        assert_eq!(AppError::Task("boom".to_string()).severity(), Severity::Fatal);
    }
}
