//! Refresh loop helpers

use meterd_core::application::escalation::log_recoverable;
use meterd_core::port::MeasurementModule;
use meterd_infra_system::{build_module, ModuleConfig};
use std::sync::Arc;
use tracing::debug;

pub type ModuleHandle = Arc<dyn MeasurementModule>;

/// Build every configured module, stopping at the first failure
pub fn build_modules(configs: Vec<ModuleConfig>) -> meterd_core::Result<Vec<ModuleHandle>> {
    configs.into_iter().map(build_module).collect()
}

/// Refresh every module once; returns how many failed
///
/// Failures are recoverable: the module keeps its previous values.
pub fn refresh_all(modules: &[ModuleHandle]) -> usize {
    let mut failed = 0;
    for module in modules {
        if let Err(e) = module.update() {
            let context = format!("refresh {}", module.name());
            log_recoverable(&e, Some(&context));
            failed += 1;
        }
    }
    debug!(modules = modules.len(), failed, "Refresh round complete");
    failed
}

/// All module snapshots keyed by module name
pub fn snapshot_json(modules: &[ModuleHandle]) -> serde_json::Value {
    let map = modules
        .iter()
        .map(|m| {
            let snapshot = serde_json::to_value(m.snapshot()).unwrap_or(serde_json::Value::Null);
            (m.name().to_string(), snapshot)
        })
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}
