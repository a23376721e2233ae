// Unit Spawner Port
// Abstraction for starting detached background units (thread or process)

use crate::domain::{ExecutionMode, TaskUnit};
use thiserror::Error;

/// Work handed to a spawner; the execution boundary is already applied
pub type UnitBody = Box<dyn FnOnce() + Send + 'static>;

/// Execution errors
///
/// Only the act of spawning can fail from the caller's point of view; the
/// outcome of the routine itself is never reported back.
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Spawn failed: {0}")]
    SpawnFailed(String),

    #[error("Execution mode {0} is not supported on this platform")]
    Unsupported(ExecutionMode),
}

/// Unit Spawner trait
///
/// Implementations:
/// - ThreadSpawner: detached OS thread
/// - ProcessSpawner: forked child with a parent-death signal
pub trait UnitSpawner: Send + Sync {
    /// Execution mode this spawner provides
    fn mode(&self) -> ExecutionMode;

    /// Start `body` in a brand-new detached unit and return immediately
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the thread or process cannot be created
    /// - ExecutionError::Unsupported if the mode is unavailable on this platform
    fn spawn(&self, unit: &TaskUnit, unit_id: &str, body: UnitBody) -> Result<(), ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock spawner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Run the body synchronously on the calling thread
        RunInline,
        /// Accept the unit but never run it
        Discard,
        /// Always fail with message
        Fail(String),
    }

    /// Mock Unit Spawner for testing
    pub struct MockSpawner {
        mode: ExecutionMode,
        behavior: MockBehavior,
        spawned: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockSpawner {
        pub fn new(mode: ExecutionMode, behavior: MockBehavior) -> Self {
            Self {
                mode,
                behavior,
                spawned: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn new_inline() -> Self {
            Self::new(ExecutionMode::Thread, MockBehavior::RunInline)
        }

        pub fn new_discard() -> Self {
            Self::new(ExecutionMode::Thread, MockBehavior::Discard)
        }

        pub fn new_fail(message: impl Into<String>) -> Self {
            Self::new(ExecutionMode::Thread, MockBehavior::Fail(message.into()))
        }

        /// (unit name, unit id) of every accepted spawn
        pub fn spawned(&self) -> Vec<(String, String)> {
            self.spawned.lock().unwrap().clone()
        }
    }

    impl UnitSpawner for MockSpawner {
        fn mode(&self) -> ExecutionMode {
            self.mode
        }

        fn spawn(
            &self,
            unit: &TaskUnit,
            unit_id: &str,
            body: UnitBody,
        ) -> Result<(), ExecutionError> {
            if let MockBehavior::Fail(msg) = &self.behavior {
                return Err(ExecutionError::SpawnFailed(msg.clone()));
            }

            self.spawned
                .lock()
                .unwrap()
                .push((unit.name.clone(), unit_id.to_string()));

            if let MockBehavior::RunInline = self.behavior {
                body();
            }
            Ok(())
        }
    }
}
