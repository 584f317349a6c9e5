//! StratOS cooperative tick scheduler.
//!
//! The scheduler decides, tick by tick, which registered periodic task runs
//! next, runs it to completion and notices when a task overstays its period.
//! It is not preemptive: there are no priorities, no synchronization
//! primitives between tasks and no memory protection. Tasks are expected to
//! return promptly.
//!
//! - [`task`] holds the task model, the registry and the [`Scheduler`].
//! - [`tick`] defines the one external capability the scheduler needs.
//! - [`diag`] carries human-readable diagnostics.
//! - [`sim`] provides a deterministic tick source for host builds.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod diag;
pub mod error;
pub mod sim;
pub mod task;
pub mod tick;

pub use config::{Config, DEFAULT_CAPACITY, DEFAULT_TICK_US};
pub use diag::{Diagnostic, DiagnosticSink};
pub use error::{Error, RegistrationError};
pub use task::scheduler::{Scheduler, State};
pub use task::{Runnable, TaskDefinition, TaskId, TaskSnapshot};
pub use tick::{TickHandler, TickSource, TickSourceError, TickSourceId};
