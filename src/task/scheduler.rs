//! Tick-driven cooperative scheduler.
//!
//! Work is split between two contexts on a single core:
//!
//! - the **tick handler** ([`Scheduler::tick`]) runs at interrupt time. It
//!   advances the clock, picks the next ready task and detects overruns. It
//!   never calls a task function.
//! - the **dispatch loop** ([`Scheduler::run`]) runs in the background
//!   forever. It watches the scheduler state and runs the selected task to
//!   completion.
//!
//! Task control blocks, the clock and the current selection live behind a
//! critical section; each context touches them only with interrupts masked,
//! and the dispatch loop never holds the critical section while a task runs.
//! The state itself is handed from the tick handler to the loop through an
//! atomic: the handler publishes it with `Release` after updating the TCB,
//! the loop reads it with `Acquire`.
//!
//! Selection is first-match by registration order, not earliest deadline: a
//! low-index task with a long period is always preferred over a high-index
//! task that became ready on the same tick.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

use critical_section::{CriticalSection, Mutex};

use super::registry::Registry;
use super::{TaskDefinition, TaskFlags, TaskId, TaskSnapshot};
use crate::config::{Config, DEFAULT_CAPACITY};
use crate::diag::{Diagnostic, DiagnosticSink};
use crate::error::Error;
use crate::tick::{TickHandler, TickSource, TickSourceId};

/// Scheduler state shared between the tick handler and the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum State {
    /// Nothing selected.
    Idle = 0,
    /// A task has been selected and is waiting for, or in, execution.
    Dispatching = 1,
    /// The selected task ran past its period.
    Overrun = 2,
}

impl State {
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for State {
    type Error = u8;

    fn try_from(raw: u8) -> Result<Self, u8> {
        match raw {
            0 => Ok(State::Idle),
            1 => Ok(State::Dispatching),
            2 => Ok(State::Overrun),
            raw => Err(raw),
        }
    }
}

/// The one task currently selected for dispatch.
#[derive(Debug, Clone, Copy)]
struct Selection {
    slot: usize,
    /// The dispatch loop has started running the task.
    started: bool,
    /// An overrun has already been counted for this execution.
    overrun: bool,
}

struct Core<const N: usize> {
    registry: Registry<N>,
    now: u64,
    /// No task has ever been dispatched.
    booting: bool,
    current: Option<Selection>,
}

/// What the dispatch loop should do with the current selection.
enum Job {
    Run(TaskDefinition),
    /// Selected, then killed before it started. Nothing to run.
    Skip,
}

/// The cooperative scheduler.
///
/// Construct it in a `static` with [`Scheduler::new`], call
/// [`init`](Scheduler::init) once during boot, then hand control to
/// [`run`](Scheduler::run).
pub struct Scheduler<const N: usize = DEFAULT_CAPACITY> {
    core: Mutex<RefCell<Core<N>>>,
    state: AtomicU8,
    enabled: AtomicBool,
    running: AtomicBool,
    overruns: AtomicU32,
    invalid_state_reported: AtomicBool,
    timer: spin::Once<TickSourceId>,
    diagnostics: spin::Once<&'static dyn DiagnosticSink>,
    config: Config,
}

impl<const N: usize> Scheduler<N> {
    /// Create a scheduler with the default configuration.
    pub const fn new() -> Self {
        Self::with_config(Config::DEFAULT)
    }

    pub const fn with_config(config: Config) -> Self {
        Scheduler {
            core: Mutex::new(RefCell::new(Core {
                registry: Registry::new(),
                now: 0,
                booting: true,
                current: None,
            })),
            state: AtomicU8::new(State::Idle as u8),
            enabled: AtomicBool::new(true),
            running: AtomicBool::new(false),
            overruns: AtomicU32::new(0),
            invalid_state_reported: AtomicBool::new(false),
            timer: spin::Once::new(),
            diagnostics: spin::Once::new(),
            config,
        }
    }

    /// Route diagnostics to `sink` in addition to `tracing`.
    ///
    /// Only the first sink installed is kept.
    pub fn set_diagnostics(&self, sink: &'static dyn DiagnosticSink) {
        self.diagnostics.call_once(|| sink);
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    /// Register the initial task set and allocate the tick source.
    ///
    /// Tasks are registered in slice order, which fixes both their
    /// identifiers and their selection priority. Any failure is fatal: a
    /// kernel that cannot schedule should not finish booting.
    pub fn init<S>(&'static self, tasks: &[TaskDefinition], source: &S) -> Result<TickSourceId, Error>
    where
        S: TickSource + ?Sized,
    {
        if self.timer.is_completed() {
            return Err(Error::AlreadyInitialized);
        }

        for def in tasks {
            self.register_task(*def)?;
        }

        let id = source
            .allocate_periodic_tick(self, self.config.tick_us)
            .map_err(|e| {
                self.report(Diagnostic::TimerAllocationFailed(e));
                Error::TimerAllocationFailed(e)
            })?;
        self.timer.call_once(|| id);

        tracing::info!(
            tasks = tasks.len(),
            capacity = N,
            tick_us = self.config.tick_us,
            timer = id.raw(),
            "scheduler initialized"
        );
        Ok(id)
    }

    /// Transfer control to the dispatch loop. Never returns.
    pub fn run(&self) -> ! {
        self.run_with(core::hint::spin_loop)
    }

    /// Like [`run`](Self::run), calling `idle` after every loop pass.
    ///
    /// A kernel can pass something like `hlt` to sleep until the next
    /// interrupt.
    pub fn run_with(&self, mut idle: impl FnMut()) -> ! {
        self.enter();
        loop {
            self.dispatch_once();
            idle();
        }
    }

    /// Run the dispatch loop for as long as `keep_going` returns `true`.
    pub fn run_while(&self, mut keep_going: impl FnMut() -> bool) {
        self.enter();
        while keep_going() {
            self.dispatch_once();
        }
    }

    /// Run exactly `passes` iterations of the dispatch loop.
    pub fn run_for(&self, passes: usize) {
        let mut remaining = passes;
        self.run_while(|| {
            let go = remaining > 0;
            remaining = remaining.saturating_sub(1);
            go
        });
    }

    fn enter(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            tracing::info!("dispatch loop started");
        }
    }

    /// Whether the dispatch loop has taken control.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop selecting tasks. The clock keeps advancing.
    ///
    /// Used around time-critical kernel work. A task that is already in
    /// flight still runs to completion.
    pub fn suspend(&self) {
        self.enabled.store(false, Ordering::Release);
        tracing::debug!("scheduling suspended");
    }

    /// Resume selection after [`suspend`](Self::suspend).
    pub fn resume(&self) {
        self.enabled.store(true, Ordering::Release);
        tracing::debug!("scheduling resumed");
    }

    pub fn is_suspended(&self) -> bool {
        !self.enabled.load(Ordering::Acquire)
    }

    // ─── Registry ───────────────────────────────────────────────────

    /// Register a new periodic task.
    pub fn register_task(&self, def: TaskDefinition) -> Result<TaskId, Error> {
        let result = critical_section::with(|cs| self.core.borrow_ref_mut(cs).registry.register(def));
        match result {
            Ok(id) => {
                tracing::debug!(task = id.raw(), name = def.name(), period = def.period(), "registered task");
                Ok(id)
            }
            Err(error) => {
                self.report(Diagnostic::RegistrationFailed {
                    name: def.name(),
                    error,
                });
                Err(error.into())
            }
        }
    }

    /// Prevent a task from ever being selected again.
    ///
    /// A task that is currently executing finishes normally.
    pub fn kill_task(&self, id: TaskId) -> Result<(), Error> {
        critical_section::with(|cs| self.core.borrow_ref_mut(cs).registry.kill(id))?;
        tracing::debug!(task = id.raw(), "killed task");
        Ok(())
    }

    // ─── Tick handler ───────────────────────────────────────────────

    /// Handle one timer tick.
    ///
    /// Called from interrupt context by the tick source. Bounded by a single
    /// pass over the registry. Until the dispatch loop has taken control, or
    /// while scheduling is suspended, a tick only advances the clock.
    pub fn tick(&self) {
        let (rolled_over, overrun) = critical_section::with(|cs| {
            let mut core = self.core.borrow_ref_mut(cs);
            let now = core.now.wrapping_add(1);
            core.now = now;

            let mut overrun = None;
            if self.is_running() && !self.is_suspended() {
                if let Some(selection) = core.current {
                    overrun = self.check_overrun(&mut core, selection, now);
                } else if core.booting {
                    self.select(&mut core, now, |_| true);
                } else {
                    self.select(&mut core, now, |tcb| tcb.elapsed(now) >= tcb.def.period());
                }
            }

            (now == 0, overrun)
        });

        if rolled_over {
            self.report(Diagnostic::ClockRollover);
        }
        if let Some(diagnostic) = overrun {
            self.report(diagnostic);
        }
    }

    /// Select the first alive task, in registration order, that `ready`
    /// accepts.
    fn select(&self, core: &mut Core<N>, now: u64, ready: impl Fn(&super::Tcb) -> bool) {
        let Some(slot) = core.registry.iter().position(|tcb| tcb.is_alive() && ready(tcb)) else {
            return;
        };
        let Some(tcb) = core.registry.get_mut(slot) else {
            return;
        };

        tcb.flags.insert(TaskFlags::SCHEDULED);
        tcb.last_activation = now;
        tracing::trace!(task = tcb.id.raw(), now, "selected task");

        core.current = Some(Selection {
            slot,
            started: false,
            overrun: false,
        });
        core.booting = false;
        self.state.store(State::Dispatching as u8, Ordering::Release);
    }

    /// Count an overrun the first time the current execution outlives its
    /// period. The diagnostic is reported as soon as it is detected, so a
    /// task that never returns is still reported.
    fn check_overrun(&self, core: &mut Core<N>, mut selection: Selection, now: u64) -> Option<Diagnostic> {
        if selection.overrun {
            return None;
        }
        let tcb = core.registry.get_mut(selection.slot)?;
        let elapsed = tcb.elapsed(now);
        if elapsed <= tcb.def.period() {
            return None;
        }

        tcb.overruns = tcb.overruns.saturating_add(1);
        let diagnostic = Diagnostic::TaskOverrun {
            task: tcb.id,
            elapsed,
            period: tcb.def.period(),
        };
        selection.overrun = true;
        core.current = Some(selection);
        self.overruns.fetch_add(1, Ordering::Relaxed);
        self.state.store(State::Overrun as u8, Ordering::Release);
        Some(diagnostic)
    }

    // ─── Dispatch loop ──────────────────────────────────────────────

    /// One pass of the dispatch loop.
    pub fn dispatch_once(&self) {
        let raw = self.state.load(Ordering::Acquire);
        match State::try_from(raw) {
            Ok(State::Idle) => {}
            Ok(State::Dispatching) => self.dispatch(),
            Ok(State::Overrun) => self.acknowledge_overrun(),
            Err(raw) => self.invalid_state(raw),
        }
    }

    fn dispatch(&self) {
        let job = critical_section::with(|cs| {
            let mut core = self.core.borrow_ref_mut(cs);
            let Some(mut selection) = core.current else {
                self.state.store(State::Idle as u8, Ordering::Release);
                return None;
            };
            let Some(tcb) = core.registry.get(selection.slot) else {
                core.current = None;
                self.state.store(State::Idle as u8, Ordering::Release);
                return None;
            };
            let job = if tcb.is_alive() {
                Job::Run(tcb.def)
            } else {
                Job::Skip
            };
            selection.started = true;
            core.current = Some(selection);
            Some(job)
        });

        match job {
            Some(Job::Run(def)) => {
                def.run();
                self.complete(true);
            }
            Some(Job::Skip) => self.complete(false),
            None => {}
        }
    }

    /// Completion bookkeeping for the current selection.
    fn complete(&self, ran: bool) {
        critical_section::with(|cs| {
            let mut core = self.core.borrow_ref_mut(cs);
            let now = core.now;
            let Some(selection) = core.current.take() else {
                return;
            };
            self.state.store(State::Idle as u8, Ordering::Release);

            if let Some(tcb) = core.registry.get_mut(selection.slot) {
                tcb.flags.remove(TaskFlags::SCHEDULED);
                if ran {
                    tcb.last_completion = now;
                    tcb.runs = tcb.runs.saturating_add(1);
                }
            }
        });
    }

    /// The tick handler flagged an overrun. No corrective action is taken;
    /// a selection that has not started yet is still dispatched.
    fn acknowledge_overrun(&self) {
        let pending = critical_section::with(|cs| {
            let core = self.core.borrow_ref(cs);
            match core.current {
                Some(selection) => !selection.started,
                None => {
                    self.state.store(State::Idle as u8, Ordering::Release);
                    false
                }
            }
        });

        if pending {
            self.dispatch();
        }
    }

    fn invalid_state(&self, raw: u8) {
        if !self.invalid_state_reported.swap(true, Ordering::AcqRel) {
            self.report(Diagnostic::InvalidState { raw });
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        diagnostic.log();
        if let Some(sink) = self.diagnostics.get() {
            sink.emit(&diagnostic);
        }
    }

    // ─── Observability ──────────────────────────────────────────────

    /// Current value of the system clock.
    pub fn now(&self) -> u64 {
        self.with_core(|core| core.now)
    }

    /// Current state.
    ///
    /// Fails with [`Error::InvalidState`] if the state word holds a value the
    /// state machine does not recognize.
    pub fn state(&self) -> Result<State, Error> {
        State::try_from(self.state.load(Ordering::Acquire)).map_err(Error::InvalidState)
    }

    /// Total overruns detected since boot.
    pub fn overrun_count(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// The task currently selected for dispatch, if any.
    pub fn current(&self) -> Option<TaskId> {
        self.with_core(|core| {
            let selection = core.current?;
            core.registry.get(selection.slot).map(|tcb| tcb.id)
        })
    }

    /// Snapshot of one task's bookkeeping.
    pub fn task(&self, id: TaskId) -> Option<TaskSnapshot> {
        self.with_core(|core| core.registry.find(id).map(|tcb| tcb.snapshot()))
    }

    /// Visit a snapshot of every registered task, in registration order.
    ///
    /// Runs inside a critical section; keep `f` short.
    pub fn for_each_task(&self, mut f: impl FnMut(TaskSnapshot)) {
        self.with_core(|core| core.registry.iter().for_each(|tcb| f(tcb.snapshot())))
    }

    /// Snapshot of the first task registered under `name`.
    ///
    /// Linear search; meant for diagnostics, not hot paths.
    pub fn task_by_name(&self, name: &str) -> Option<TaskSnapshot> {
        self.with_core(|core| {
            core.registry
                .iter()
                .find(|tcb| tcb.def.name() == name)
                .map(|tcb| tcb.snapshot())
        })
    }

    /// Number of registered tasks, killed ones included.
    pub fn task_count(&self) -> usize {
        self.with_core(|core| core.registry.len())
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// The tick source allocated by [`init`](Self::init).
    pub fn timer(&self) -> Option<TickSourceId> {
        self.timer.get().copied()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn with_core<R>(&self, f: impl FnOnce(&Core<N>) -> R) -> R {
        critical_section::with(|cs: CriticalSection<'_>| f(&*self.core.borrow_ref(cs)))
    }

    #[cfg(test)]
    fn force_state(&self, raw: u8) {
        self.state.store(raw, Ordering::Release);
    }

    #[cfg(test)]
    fn force_selection(&self, slot: usize) {
        critical_section::with(|cs| {
            self.core.borrow_ref_mut(cs).current = Some(Selection {
                slot,
                started: false,
                overrun: false,
            })
        });
        self.state.store(State::Dispatching as u8, Ordering::Release);
    }

    #[cfg(test)]
    fn set_clock(&self, now: u64) {
        critical_section::with(|cs| self.core.borrow_ref_mut(cs).now = now);
    }
}

impl<const N: usize> Default for Scheduler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TickHandler for Scheduler<N> {
    fn on_tick(&self) {
        self.tick();
    }
}
