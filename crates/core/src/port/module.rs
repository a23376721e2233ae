// Measurement module port
// Plugins that own a container and refresh it on demand or in the background

use crate::domain::{Row, Value};
use crate::error::Result;
use serde::Serialize;

/// Point-in-time copy of a module's container
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ModuleSnapshot {
    /// Named scalar items in declaration order
    Values(Vec<(String, Value)>),
    /// Rows from structured extraction
    Rows(Vec<Row>),
}

impl ModuleSnapshot {
    pub fn len(&self) -> usize {
        match self {
            ModuleSnapshot::Values(v) => v.len(),
            ModuleSnapshot::Rows(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Measurement module port
///
/// Implemented by the system adapters (file_value, file_table, service_status).
pub trait MeasurementModule: Send + Sync {
    /// Configured module name
    fn name(&self) -> &str;

    /// On-demand refresh
    ///
    /// Modules that refresh from a background unit may make this a no-op.
    ///
    /// # Errors
    /// Returns an error when the underlying source cannot be read; the
    /// container keeps its previous values.
    fn update(&self) -> Result<()>;

    /// Copy of the current values
    fn snapshot(&self) -> ModuleSnapshot;
}
