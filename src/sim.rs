//! Host-side tick source.
//!
//! Stands in for the hardware timer when the scheduler runs on a
//! development machine: ticks are delivered only when [`SimTickSource::advance`]
//! is called, which makes scheduling fully deterministic.

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::tick::{TickHandler, TickSource, TickSourceError, TickSourceId};

/// A simulated single-channel periodic timer.
pub struct SimTickSource {
    handler: spin::Once<&'static dyn TickHandler>,
    period_us: AtomicU32,
    fired: AtomicU64,
    unavailable: AtomicBool,
}

impl SimTickSource {
    pub const fn new() -> Self {
        SimTickSource {
            handler: spin::Once::new(),
            period_us: AtomicU32::new(0),
            fired: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// A source whose allocation always fails.
    pub const fn unavailable() -> Self {
        SimTickSource {
            handler: spin::Once::new(),
            period_us: AtomicU32::new(0),
            fired: AtomicU64::new(0),
            unavailable: AtomicBool::new(true),
        }
    }

    /// Deliver `ticks` timer interrupts, one after another.
    ///
    /// Does nothing until a handler has been allocated.
    pub fn advance(&self, ticks: u64) {
        let Some(handler) = self.handler.get() else {
            return;
        };
        for _ in 0..ticks {
            self.fired.fetch_add(1, Ordering::Relaxed);
            handler.on_tick();
        }
    }

    /// Ticks delivered so far.
    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }

    /// Period requested at allocation, if allocated.
    pub fn period_us(&self) -> Option<u32> {
        self.handler
            .get()
            .map(|_| self.period_us.load(Ordering::Relaxed))
    }

    pub fn is_allocated(&self) -> bool {
        self.handler.is_completed()
    }
}

impl Default for SimTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SimTickSource {
    fn allocate_periodic_tick(
        &self,
        handler: &'static dyn TickHandler,
        period_us: u32,
    ) -> Result<TickSourceId, TickSourceError> {
        if period_us == 0 {
            return Err(TickSourceError::InvalidParameters);
        }
        if self.unavailable.load(Ordering::Relaxed) || self.handler.is_completed() {
            return Err(TickSourceError::ResourceUnavailable);
        }

        self.period_us.store(period_us, Ordering::Relaxed);
        self.handler.call_once(|| handler);
        Ok(TickSourceId::new(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Count(AtomicU64);

    impl TickHandler for Count {
        fn on_tick(&self) {
            self.0.fetch_add(1, Ordering::Relaxed);
        }
    }

    static COUNT: Count = Count(AtomicU64::new(0));

    #[test]
    fn delivers_ticks_after_allocation() {
        let source = SimTickSource::new();
        source.advance(3);
        assert_eq!(source.fired(), 0);

        let id = source.allocate_periodic_tick(&COUNT, 1000).unwrap();
        assert_eq!(id.raw(), 0);
        assert_eq!(source.period_us(), Some(1000));

        source.advance(5);
        assert_eq!(source.fired(), 5);
        assert_eq!(COUNT.0.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn single_channel() {
        static OTHER: Count = Count(AtomicU64::new(0));
        let source = SimTickSource::new();
        source.allocate_periodic_tick(&OTHER, 10).unwrap();
        assert_eq!(
            source.allocate_periodic_tick(&OTHER, 10),
            Err(TickSourceError::ResourceUnavailable)
        );
    }

    #[test]
    fn rejects_bad_parameters() {
        static OTHER: Count = Count(AtomicU64::new(0));
        assert_eq!(
            SimTickSource::new().allocate_periodic_tick(&OTHER, 0),
            Err(TickSourceError::InvalidParameters)
        );
        assert_eq!(
            SimTickSource::unavailable().allocate_periodic_tick(&OTHER, 10),
            Err(TickSourceError::ResourceUnavailable)
        );
    }
}
