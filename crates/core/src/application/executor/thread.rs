// THREAD execution mode
use crate::domain::{ExecutionMode, TaskUnit};
use crate::port::{ExecutionError, UnitBody, UnitSpawner};
use tracing::debug;

/// Spawns each unit on a new detached OS thread
///
/// The join handle is dropped immediately: the thread never blocks process
/// exit and nobody waits for it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSpawner;

impl UnitSpawner for ThreadSpawner {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Thread
    }

    fn spawn(&self, unit: &TaskUnit, unit_id: &str, body: UnitBody) -> Result<(), ExecutionError> {
        let thread_name = format!("task-{}", unit.name.replace('\0', ""));

        std::thread::Builder::new()
            .name(thread_name)
            .spawn(body)
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;

        debug!(task = %unit.name, unit_id = %unit_id, "Spawned detached thread");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    #[test]
    fn test_body_runs_on_named_thread() {
        let (tx, rx) = mpsc::channel();
        let unit = TaskUnit::new("poll", ExecutionMode::Thread);

        ThreadSpawner
            .spawn(
                &unit,
                "unit-1",
                Box::new(move || {
                    let name = std::thread::current().name().map(str::to_string);
                    tx.send(name).unwrap();
                }),
            )
            .unwrap();

        let name = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(name.as_deref(), Some("task-poll"));
    }
}
