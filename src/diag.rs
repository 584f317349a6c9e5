//! Scheduler diagnostics.
//!
//! Every diagnostic is logged through `tracing`. A kernel may also inject a
//! [`DiagnosticSink`] (usually the serial console) to receive the same
//! events as human-readable text.

use core::fmt;

use crate::error::RegistrationError;
use crate::task::TaskId;
use crate::tick::TickSourceError;

/// An event worth telling a human about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diagnostic {
    /// The dispatch loop saw a state value it does not know.
    InvalidState { raw: u8 },
    /// A task ran past its period, measured from its activation tick.
    TaskOverrun {
        task: TaskId,
        elapsed: u64,
        period: u64,
    },
    /// A task definition was rejected.
    RegistrationFailed {
        name: &'static str,
        error: RegistrationError,
    },
    /// The system clock wrapped around to zero.
    ClockRollover,
    /// No tick source could be allocated.
    TimerAllocationFailed(TickSourceError),
}

impl Diagnostic {
    pub(crate) fn log(&self) {
        match self {
            Diagnostic::InvalidState { raw } => {
                tracing::error!(raw, "{self}");
            }
            Diagnostic::TaskOverrun {
                task,
                elapsed,
                period,
            } => {
                tracing::warn!(task = task.raw(), elapsed, period, "{self}");
            }
            Diagnostic::RegistrationFailed { name, .. } => {
                tracing::warn!(name, "{self}");
            }
            Diagnostic::ClockRollover => tracing::warn!("{self}"),
            Diagnostic::TimerAllocationFailed(_) => tracing::error!("{self}"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Diagnostic::InvalidState { .. } => write!(f, "invalid scheduler state"),
            Diagnostic::TaskOverrun { task, .. } => write!(f, "task overrun on task {task}"),
            Diagnostic::RegistrationFailed { name, error } => {
                write!(f, "failed to register task `{name}`: {error}")
            }
            Diagnostic::ClockRollover => write!(f, "system tick roll over detected"),
            Diagnostic::TimerAllocationFailed(e) => {
                write!(f, "failed to allocate a system timer ({e}), cannot run scheduler")
            }
        }
    }
}

/// Destination for scheduler diagnostics.
///
/// Called from both the tick handler and the dispatch loop, so
/// implementations must not block for long.
pub trait DiagnosticSink: Sync {
    fn emit(&self, diagnostic: &Diagnostic);
}
