// Service status module - exit codes of `service <name> status`, refreshed
// by a detached THREAD unit that sweeps all services forever
use serde::{Deserialize, Serialize};
use std::process::{Command, Stdio};
use std::time::Duration;
use tracing::debug;

use meterd_core::application::executor::{wrap, Launcher};
use meterd_core::domain::{ExecutionMode, SemanticType, Value, ValueDescriptor, ValueTable};
use meterd_core::port::{MeasurementModule, ModuleSnapshot};
use meterd_core::{AppError, Result};

/// Default pause between two sweeps (30s)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 30;

/// Default status command
pub const DEFAULT_STATUS_COMMAND: &str = "service";

/// Stored when the status command was killed by a signal
pub const SIGNALED_STATUS: i64 = -1;

fn default_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

fn default_command() -> String {
    DEFAULT_STATUS_COMMAND.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatusConfig {
    /// Service names; each becomes an integer item
    pub items: Vec<String>,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Invoked as `<command> <service> status`
    #[serde(default = "default_command")]
    pub command: String,
}

impl ServiceStatusConfig {
    pub fn new(items: Vec<String>) -> Self {
        Self {
            items,
            interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
            command: default_command(),
        }
    }
}

pub struct ServiceStatusModule {
    name: String,
    table: ValueTable,
}

impl ServiceStatusModule {
    /// Declare one item per service and start the background sweep
    ///
    /// # Errors
    /// AppError::Execution if the sweep thread cannot be spawned
    pub fn new(name: impl Into<String>, config: ServiceStatusConfig) -> Result<Self> {
        let name = name.into();
        let table = ValueTable::new();
        for service in &config.items {
            table.declare(service.clone(), ValueDescriptor::direct(SemanticType::Integer));
        }

        let launcher = check_services(&name, table.clone(), config.command.clone());
        launcher.launch(Duration::from_secs(config.interval_secs))?;

        Ok(Self { name, table })
    }

    pub fn table(&self) -> &ValueTable {
        &self.table
    }
}

impl MeasurementModule for ServiceStatusModule {
    fn name(&self) -> &str {
        &self.name
    }

    /// Values are refreshed by the background sweep
    fn update(&self) -> Result<()> {
        Ok(())
    }

    fn snapshot(&self) -> ModuleSnapshot {
        ModuleSnapshot::Values(self.table.snapshot())
    }
}

/// Launcher for the endless sweep loop; the argument is the pause between sweeps
///
/// Failing to run the status command escapes the unit and is fatal.
pub fn check_services(module: &str, table: ValueTable, command: String) -> Launcher<Duration> {
    wrap(
        format!("{}::check_services", module),
        ExecutionMode::Thread,
        move |interval: Duration| loop {
            sweep(&table, &command)?;
            std::thread::sleep(interval);
        },
    )
}

/// Run the status command once per service and store its exit code
pub fn sweep(table: &ValueTable, command: &str) -> Result<()> {
    for service in table.names() {
        let status = Command::new(command)
            .arg(&service)
            .arg("status")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| AppError::Task(format!("{} {} status: {}", command, service, e)))?;

        let code = status.code().map_or(SIGNALED_STATUS, i64::from);
        debug!(service = %service, code, "Service status");
        table.set(&service, Value::Int(code))?;
    }
    Ok(())
}
