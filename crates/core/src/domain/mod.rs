// Domain Layer - Pure measurement model

pub mod descriptor;
pub mod error;
pub mod record;
pub mod table;
pub mod task;
pub mod value;

// Re-exports
pub use descriptor::{compile_pattern, Aggregation, DeriveFn, ValueDescriptor, ValueSource};
pub use error::DomainError;
pub use record::{ErrorRecord, Severity};
pub use table::{Row, RowTable, ValueTable};
pub use task::{ExecutionMode, TaskUnit, DEFAULT_FATAL_EXIT_CODE};
pub use value::{SemanticType, Value};
