// Task Executor - fire-and-forget background units
//
// `wrap` turns a refresh routine into a `Launcher`. Every `launch` starts a
// brand-new detached unit and returns without a handle. Any error or panic
// escaping the routine terminates the process hosting the unit.

mod panic_guard;
mod process;
mod thread;

pub use panic_guard::{execute_guarded, GuardOutcome};
pub use process::ProcessSpawner;
pub use thread::ThreadSpawner;

use crate::application::escalation::{escalate_fatal, Incident};
use crate::domain::{ExecutionMode, TaskUnit};
use crate::port::id_provider::UuidProvider;
use crate::port::{ExecutionError, IdProvider, UnitBody, UnitSpawner};
use std::sync::Arc;
use tracing::{debug, info};

/// A refresh routine taking launch arguments `A`
pub type Routine<A> = dyn Fn(A) -> crate::Result<()> + Send + Sync;

/// Default spawner for an execution mode
pub fn spawner_for(mode: ExecutionMode) -> Arc<dyn UnitSpawner> {
    match mode {
        ExecutionMode::Thread => Arc::new(ThreadSpawner),
        ExecutionMode::Process => Arc::new(ProcessSpawner),
    }
}

/// Wrap `routine` so that each launch runs it in a new detached unit
///
/// # Example
/// ```text
/// let launcher = wrap("check_services", ExecutionMode::Thread, move |interval| {
///     loop { sweep(&table)?; std::thread::sleep(interval); }
/// });
/// launcher.launch(Duration::from_secs(30))?;
/// ```
pub fn wrap<A, F>(name: impl Into<String>, mode: ExecutionMode, routine: F) -> Launcher<A>
where
    A: Send + 'static,
    F: Fn(A) -> crate::Result<()> + Send + Sync + 'static,
{
    Launcher::new(
        TaskUnit::new(name, mode),
        spawner_for(mode),
        Arc::new(UuidProvider),
        routine,
    )
}

/// Launches a wrapped routine
pub struct Launcher<A> {
    unit: TaskUnit,
    routine: Arc<Routine<A>>,
    spawner: Arc<dyn UnitSpawner>,
    id_provider: Arc<dyn IdProvider>,
}

impl<A: Send + 'static> Launcher<A> {
    /// Create a launcher with explicit dependencies
    ///
    /// # Arguments
    /// * `unit` - Task unit descriptor (name, mode, exit code on failure)
    /// * `spawner` - Starts the detached unit
    /// * `id_provider` - Generates a per-launch unit id for log correlation
    /// * `routine` - The wrapped routine
    pub fn new<F>(
        unit: TaskUnit,
        spawner: Arc<dyn UnitSpawner>,
        id_provider: Arc<dyn IdProvider>,
        routine: F,
    ) -> Self
    where
        F: Fn(A) -> crate::Result<()> + Send + Sync + 'static,
    {
        Self {
            unit,
            routine: Arc::new(routine),
            spawner,
            id_provider,
        }
    }

    /// Exit code applied when the routine fails
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.unit = self.unit.with_exit_code(exit_code);
        self
    }

    pub fn unit(&self) -> &TaskUnit {
        &self.unit
    }

    /// Start the routine in a new detached unit and return immediately
    ///
    /// # Errors
    /// Only the spawn itself can fail; the routine's outcome is never reported.
    pub fn launch(&self, args: A) -> Result<(), ExecutionError> {
        let unit_id = self.id_provider.generate_id();
        let routine = Arc::clone(&self.routine);
        let unit = self.unit.clone();
        let body_id = unit_id.clone();

        let body: UnitBody = Box::new(move || run_unit(&unit, &body_id, move || routine(args)));
        self.spawner.spawn(&self.unit, &unit_id, body)
    }
}

impl<A> Clone for Launcher<A> {
    fn clone(&self) -> Self {
        Self {
            unit: self.unit.clone(),
            routine: Arc::clone(&self.routine),
            spawner: Arc::clone(&self.spawner),
            id_provider: Arc::clone(&self.id_provider),
        }
    }
}

/// Body of every unit: log, run behind the boundary, escalate failures
fn run_unit<F>(unit: &TaskUnit, unit_id: &str, routine: F)
where
    F: FnOnce() -> crate::Result<()>,
{
    info!(
        task = %unit.name,
        unit_id = %unit_id,
        mode = %unit.mode,
        "Starting background task"
    );

    match execute_guarded(routine) {
        GuardOutcome::Completed => {
            debug!(task = %unit.name, unit_id = %unit_id, "Background task finished");
        }
        GuardOutcome::Failed(e) => escalate_fatal(Incident::Error(&e), unit.exit_code),
        GuardOutcome::Panicked(msg) => {
            let msg = format!("Background task {} panicked: {}", unit.name, msg);
            escalate_fatal(Incident::Message(&msg), unit.exit_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::id_provider::mocks::SequentialIdProvider;
    use crate::port::task_executor::mocks::MockSpawner;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    fn launcher_with<F>(spawner: Arc<MockSpawner>, routine: F) -> Launcher<usize>
    where
        F: Fn(usize) -> crate::Result<()> + Send + Sync + 'static,
    {
        Launcher::new(
            TaskUnit::new("refresh", ExecutionMode::Thread),
            spawner,
            Arc::new(SequentialIdProvider::default()),
            routine,
        )
    }

    #[test]
    fn test_launch_passes_arguments() {
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in = seen.clone();
        let spawner = Arc::new(MockSpawner::new_inline());

        let launcher = launcher_with(spawner.clone(), move |n| {
            seen_in.fetch_add(n, Ordering::SeqCst);
            Ok(())
        });

        launcher.launch(3).unwrap();
        launcher.launch(4).unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_each_launch_is_a_fresh_unit() {
        let spawner = Arc::new(MockSpawner::new_discard());
        let launcher = launcher_with(spawner.clone(), |_| Ok(()));

        launcher.launch(1).unwrap();
        launcher.clone().launch(2).unwrap();

        assert_eq!(
            spawner.spawned(),
            vec![
                ("refresh".to_string(), "unit-1".to_string()),
                ("refresh".to_string(), "unit-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_spawn_failure_is_reported_to_caller() {
        let spawner = Arc::new(MockSpawner::new_fail("no threads left"));
        let launcher = launcher_with(spawner, |_| Ok(()));

        let result = launcher.launch(1);
        assert!(matches!(
            result,
            Err(ExecutionError::SpawnFailed(msg)) if msg == "no threads left"
        ));
    }

    #[test]
    fn test_launch_returns_before_routine_completes() {
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let (done_tx, done_rx) = mpsc::channel::<usize>();
        let release_rx = std::sync::Mutex::new(release_rx);

        let launcher = wrap("blocked", ExecutionMode::Thread, move |n: usize| {
            release_rx.lock().unwrap().recv().unwrap();
            done_tx.send(n).unwrap();
            Ok(())
        });

        // The routine is parked until released, so a blocking launch would hang here
        launcher.launch(9).unwrap();
        assert!(done_rx.try_recv().is_err());

        release_tx.send(()).unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 9);
    }

    #[test]
    fn test_with_exit_code() {
        let launcher = wrap("x", ExecutionMode::Process, |_: ()| Ok(())).with_exit_code(3);
        assert_eq!(launcher.unit().exit_code, 3);
        assert_eq!(launcher.unit().mode, ExecutionMode::Process);
    }
}
