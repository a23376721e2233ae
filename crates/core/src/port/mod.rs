// Port Layer - Interfaces for external dependencies

pub mod id_provider; // For deterministic testing
pub mod module;
pub mod task_executor;
pub mod time_provider;

// Re-exports
pub use id_provider::IdProvider;
pub use module::{MeasurementModule, ModuleSnapshot};
pub use task_executor::{ExecutionError, UnitBody, UnitSpawner};
pub use time_provider::TimeProvider;
