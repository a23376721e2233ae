// Meterd Infrastructure - System measurement modules
// Implements: MeasurementModule (file_value, file_table, service_status)

pub mod config;
pub mod file_table;
pub mod file_value;
pub mod service_status;

pub use config::{ItemConfig, ModuleConfig, ModuleKind};
pub use file_table::{FileTableConfig, FileTableModule};
pub use file_value::{FileValueConfig, FileValueModule};
pub use service_status::{ServiceStatusConfig, ServiceStatusModule};

use meterd_core::port::MeasurementModule;
use meterd_core::Result;
use std::sync::Arc;
use tracing::info;

/// Construct a module from its configuration
///
/// Modules with background refresh start their unit here.
pub fn build_module(config: ModuleConfig) -> Result<Arc<dyn MeasurementModule>> {
    let module: Arc<dyn MeasurementModule> = match config.kind {
        ModuleKind::FileValue(cfg) => Arc::new(FileValueModule::new(config.name, cfg)?),
        ModuleKind::FileTable(cfg) => Arc::new(FileTableModule::new(config.name, cfg)),
        ModuleKind::ServiceStatus(cfg) => Arc::new(ServiceStatusModule::new(config.name, cfg)?),
    };
    info!(module = %module.name(), "Module initialized");
    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;
    use meterd_core::AppError;

    #[test]
    fn test_build_file_value_module() {
        let config: ModuleConfig = serde_json::from_value(serde_json::json!({
            "name": "hosts",
            "kind": "file_value",
            "object": "/etc/hosts",
            "use_text": true,
            "items": [
                {"name": "localhost", "type": "string", "regex": "(localhost)", "cdef": "len"}
            ]
        }))
        .unwrap();

        let module = build_module(config).unwrap();
        assert_eq!(module.name(), "hosts");
        assert_eq!(module.snapshot().len(), 1);
    }

    #[test]
    fn test_build_rejects_bad_item() {
        let config: ModuleConfig = serde_json::from_value(serde_json::json!({
            "name": "bad",
            "kind": "file_value",
            "object": "/etc/hosts",
            "items": [{"name": "x", "type": "float"}]
        }))
        .unwrap();

        assert!(matches!(build_module(config), Err(AppError::Config(_))));
    }
}
