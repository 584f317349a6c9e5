//! Scheduler errors.

use crate::task::TaskId;
use crate::tick::TickSourceError;

/// Errors returned by scheduler operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A task could not be added to the registry.
    #[error("failed to register task: {0}")]
    RegistrationFailed(#[from] RegistrationError),

    /// No tick source could be allocated. The scheduler cannot run.
    #[error("failed to allocate a system timer: {0}")]
    TimerAllocationFailed(#[from] TickSourceError),

    /// The state machine held a value it does not recognize. Returned by
    /// [`Scheduler::state`](crate::Scheduler::state); the dispatch loop
    /// itself only reports it once and keeps going.
    #[error("invalid scheduler state {0:#04x}")]
    InvalidState(u8),

    /// `kill_task` was given an identifier that was never issued.
    #[error("no task with id {0}")]
    KillNotFound(TaskId),

    /// `init` was called on a scheduler that already owns a tick source.
    #[error("scheduler is already initialized")]
    AlreadyInitialized,
}

/// Why a registration was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegistrationError {
    /// Every slot in the registry has been spent.
    #[error("task registry is full ({capacity} tasks)")]
    Full { capacity: usize },

    /// The definition cannot be scheduled.
    #[error("invalid task definition: {0}")]
    InvalidDefinition(&'static str),
}
