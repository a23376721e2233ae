// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Unknown semantic type: {0}")]
    UnknownType(String),

    #[error("Cannot convert {text:?} to {semantic}: {reason}")]
    Conversion {
        text: String,
        semantic: String,
        reason: String,
    },

    #[error("Aggregation '{aggregation}' is not defined for {semantic} values")]
    UnsupportedAggregation {
        aggregation: String,
        semantic: String,
    },

    #[error("Aggregation '{0}' requires at least one value")]
    EmptyAggregation(String),

    #[error("Aggregation '{0}' overflowed")]
    Overflow(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid parser: {0}")]
    InvalidParser(String),

    #[error("Derivation failed: {0}")]
    Derivation(String),

    #[error("Unknown item: {0}")]
    UnknownItem(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
