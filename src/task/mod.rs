//! Periodic tasks for the cooperative scheduler.
//!
//! A task is a period (in ticks) and a function that runs to completion
//! every time the scheduler selects it. Tasks are never preempted: a task
//! that does not return starves every other task in the system.

pub mod registry;
pub mod scheduler;

use core::fmt;

/// Unique task identifier.
///
/// Identifiers are issued in registration order and never reused, even
/// after the task is killed. Callers should treat the value as opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(u32);

impl TaskId {
    pub(crate) const fn new(raw: u32) -> Self {
        TaskId(raw)
    }

    /// Get the raw numeric ID (for display).
    pub fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Something the scheduler can run.
///
/// Implemented for every `Fn() + Sync`, so closures and plain functions work
/// directly. Task bodies must return promptly.
pub trait Runnable: Sync {
    fn run(&self);
}

impl<F> Runnable for F
where
    F: Fn() + Sync,
{
    fn run(&self) {
        self()
    }
}

#[derive(Clone, Copy)]
enum Body {
    Fn(fn()),
    Runnable(&'static dyn Runnable),
}

/// A periodic task as supplied by the kernel or a client.
///
/// Immutable once registered.
#[derive(Clone, Copy)]
pub struct TaskDefinition {
    name: &'static str,
    period: u64,
    body: Body,
}

impl TaskDefinition {
    /// Define a task from a plain function.
    pub const fn new(name: &'static str, period: u64, task: fn()) -> Self {
        TaskDefinition {
            name,
            period,
            body: Body::Fn(task),
        }
    }

    /// Define a task from any [`Runnable`] with a static lifetime.
    pub const fn from_runnable(
        name: &'static str,
        period: u64,
        task: &'static dyn Runnable,
    ) -> Self {
        TaskDefinition {
            name,
            period,
            body: Body::Runnable(task),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Period in ticks.
    pub fn period(&self) -> u64 {
        self.period
    }

    pub(crate) fn run(&self) {
        match self.body {
            Body::Fn(f) => f(),
            Body::Runnable(r) => r.run(),
        }
    }
}

impl fmt::Debug for TaskDefinition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TaskDefinition")
            .field("name", &self.name)
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

bitflags::bitflags! {
    /// Scheduling flags carried by every task control block.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(crate) struct TaskFlags: u8 {
        /// Eligible for future selection. Cleared by a kill.
        const ALIVE     = 0b0000_0001;
        /// Currently selected for dispatch.
        const SCHEDULED = 0b0000_0010;
    }
}

/// Task control block. Owned by the scheduler.
#[derive(Clone, Copy)]
pub(crate) struct Tcb {
    pub(crate) id: TaskId,
    pub(crate) flags: TaskFlags,
    pub(crate) def: TaskDefinition,
    pub(crate) last_activation: u64,
    pub(crate) last_completion: u64,
    pub(crate) runs: u32,
    pub(crate) overruns: u32,
}

impl Tcb {
    pub(crate) fn new(id: TaskId, def: TaskDefinition) -> Self {
        Tcb {
            id,
            flags: TaskFlags::ALIVE,
            def,
            last_activation: 0,
            last_completion: 0,
            runs: 0,
            overruns: 0,
        }
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.flags.contains(TaskFlags::ALIVE)
    }

    pub(crate) fn is_scheduled(&self) -> bool {
        self.flags.contains(TaskFlags::SCHEDULED)
    }

    /// Ticks elapsed since this task was last selected.
    pub(crate) fn elapsed(&self, now: u64) -> u64 {
        now.wrapping_sub(self.last_activation)
    }

    pub(crate) fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            name: self.def.name,
            period: self.def.period,
            alive: self.is_alive(),
            scheduled: self.is_scheduled(),
            last_activation_tick: self.last_activation,
            last_completion_tick: self.last_completion,
            runs: self.runs,
            overruns: self.overruns,
        }
    }
}

/// Point-in-time copy of a task's scheduling bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub id: TaskId,
    pub name: &'static str,
    pub period: u64,
    pub alive: bool,
    pub scheduled: bool,
    pub last_activation_tick: u64,
    pub last_completion_tick: u64,
    /// Completed executions.
    pub runs: u32,
    /// Executions that outlived the task's period.
    pub overruns: u32,
}
