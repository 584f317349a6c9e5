#![allow(dead_code)]

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use stratos::sim::SimTickSource;
use stratos::{Diagnostic, DiagnosticSink, Scheduler, TaskDefinition};

pub fn trace_init() -> tracing::dispatcher::DefaultGuard {
    use tracing_subscriber::prelude::*;
    tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .with_target(false)
        .with_timer(())
        .set_default()
}

pub fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// A fresh scheduler wired to its own simulated timer. The dispatch loop
/// has not taken control yet.
pub fn initialized<const N: usize>(
    tasks: &[TaskDefinition],
) -> (&'static Scheduler<N>, &'static SimTickSource) {
    let sched: &'static Scheduler<N> = leak(Scheduler::new());
    let source: &'static SimTickSource = leak(SimTickSource::new());
    sched.init(tasks, source).expect("scheduler init");
    (sched, source)
}

/// Like [`initialized`], with the dispatch loop entered.
pub fn booted<const N: usize>(
    tasks: &[TaskDefinition],
) -> (&'static Scheduler<N>, &'static SimTickSource) {
    let (sched, source) = initialized(tasks);
    sched.run_for(0);
    (sched, source)
}

/// A task that counts its own invocations.
pub fn counting(name: &'static str, period: u64) -> (TaskDefinition, &'static AtomicU32) {
    let count: &'static AtomicU32 = leak(AtomicU32::new(0));
    let task = leak(move || {
        count.fetch_add(1, Ordering::SeqCst);
    });
    (TaskDefinition::from_runnable(name, period, task), count)
}

pub fn load(count: &AtomicU32) -> u32 {
    count.load(Ordering::SeqCst)
}

/// Records every invocation, by name, in order.
#[derive(Default)]
pub struct Trace(Mutex<Vec<&'static str>>);

impl Trace {
    pub fn task(&'static self, name: &'static str, period: u64) -> TaskDefinition {
        let task = leak(move || self.0.lock().unwrap().push(name));
        TaskDefinition::from_runnable(name, period, task)
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }
}

/// Collects diagnostics as text.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<String>>);

impl DiagnosticSink for Recorder {
    fn emit(&self, diagnostic: &Diagnostic) {
        self.0.lock().unwrap().push(diagnostic.to_string());
    }
}

impl Recorder {
    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}
