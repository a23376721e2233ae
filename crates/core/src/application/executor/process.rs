// PROCESS execution mode
use crate::domain::{ExecutionMode, TaskUnit};
use crate::port::{ExecutionError, UnitBody, UnitSpawner};

/// Spawns each unit in a forked child process
///
/// The child binds SIGTERM to its parent's death before running the body and
/// leaves through `_exit`, so it never runs the parent's cleanup. The parent
/// reaps the child from a detached thread; the caller is never blocked.
///
/// Forking a multi-threaded process only duplicates the calling thread.
/// Locks held by other threads at fork time stay locked in the child, so
/// bodies should avoid state shared with concurrently running threads.
///
/// On Linux the death signal follows the thread that called `launch`, not the
/// whole parent process: launch PROCESS units from a long-lived thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSpawner;

impl UnitSpawner for ProcessSpawner {
    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Process
    }

    fn spawn(&self, unit: &TaskUnit, unit_id: &str, body: UnitBody) -> Result<(), ExecutionError> {
        #[cfg(unix)]
        {
            unix::spawn_forked(unit, unit_id, body)
        }

        #[cfg(not(unix))]
        {
            let _ = (unit, unit_id, body);
            Err(ExecutionError::Unsupported(ExecutionMode::Process))
        }
    }
}

#[cfg(unix)]
mod unix {
    use super::*;
    use crate::application::escalation::{abort_now, escalate_fatal, Incident};
    use nix::sys::wait::{waitpid, WaitStatus};
    use nix::unistd::{fork, getpid, getppid, ForkResult, Pid};
    use tracing::{debug, info, warn};

    pub(super) fn spawn_forked(
        unit: &TaskUnit,
        unit_id: &str,
        body: UnitBody,
    ) -> Result<(), ExecutionError> {
        let parent = getpid();

        // SAFETY: the child only runs `body` and then leaves via _exit
        match unsafe { fork() } {
            Ok(ForkResult::Child) => {
                bind_parent_death(parent, unit.exit_code);
                body();
                abort_now(0)
            }
            Ok(ForkResult::Parent { child }) => {
                info!(
                    task = %unit.name,
                    unit_id = %unit_id,
                    pid = %child,
                    "Spawned background process"
                );
                spawn_reaper(&unit.name, unit_id, child);
                Ok(())
            }
            Err(e) => Err(ExecutionError::SpawnFailed(format!("fork failed: {}", e))),
        }
    }

    /// Ask the kernel for SIGTERM once the parent exits
    fn bind_parent_death(parent: Pid, exit_code: i32) {
        #[cfg(any(target_os = "linux", target_os = "android"))]
        {
            use nix::sys::signal::Signal;
            if let Err(e) = nix::sys::prctl::set_pdeathsig(Signal::SIGTERM) {
                escalate_fatal(Incident::Error(&e), exit_code);
            }
        }

        #[cfg(not(any(target_os = "linux", target_os = "android")))]
        let _ = exit_code;

        // Parent died before the binding took effect
        if getppid() != parent {
            abort_now(0);
        }
    }

    fn spawn_reaper(task: &str, unit_id: &str, child: Pid) {
        let task_name = task.to_string();
        let unit_id = unit_id.to_string();

        let spawned = std::thread::Builder::new()
            .name(format!("reap-{}", child))
            .spawn(move || match waitpid(child, None) {
                Ok(WaitStatus::Exited(_, 0)) => {
                    debug!(
                        task = %task_name,
                        unit_id = %unit_id,
                        pid = %child,
                        "Background process finished"
                    );
                }
                Ok(WaitStatus::Exited(_, code)) => {
                    warn!(
                        task = %task_name,
                        unit_id = %unit_id,
                        pid = %child,
                        exit_code = code,
                        "Background process exited with failure"
                    );
                }
                Ok(WaitStatus::Signaled(_, signal, _)) => {
                    warn!(
                        task = %task_name,
                        unit_id = %unit_id,
                        pid = %child,
                        signal = ?signal,
                        "Background process killed by signal"
                    );
                }
                Ok(status) => {
                    debug!(
                        task = %task_name,
                        pid = %child,
                        status = ?status,
                        "Background process status"
                    );
                }
                Err(e) => {
                    warn!(
                        task = %task_name,
                        pid = %child,
                        error = %e,
                        "Failed to reap background process"
                    );
                }
            });

        if let Err(e) = spawned {
            warn!(task = %task, pid = %child, error = %e, "Could not start reaper thread");
        }
    }
}
