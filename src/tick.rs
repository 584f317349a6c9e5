//! Periodic tick sources.
//!
//! The scheduler needs exactly one external capability: something that
//! calls it back at a fixed cadence. On hardware that is a timer interrupt;
//! on a host it is [`SimTickSource`](crate::sim::SimTickSource).

use core::fmt;

/// Identifier of an allocated tick source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickSourceId(u8);

impl TickSourceId {
    pub const fn new(raw: u8) -> Self {
        TickSourceId(raw)
    }

    pub fn raw(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for TickSourceId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Timer#{}", self.0)
    }
}

/// Tick source allocation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TickSourceError {
    /// No timer is left to hand out.
    #[error("timer resource unavailable")]
    ResourceUnavailable,
    /// The requested period cannot be produced by this source.
    #[error("invalid timer parameters")]
    InvalidParameters,
}

/// Receives one call per tick, at interrupt time.
///
/// Implementations must return quickly and must never block.
pub trait TickHandler: Sync {
    fn on_tick(&self);
}

/// A timer that can drive a [`TickHandler`] periodically.
pub trait TickSource {
    /// Start calling `handler` every `period_us` microseconds.
    ///
    /// The allocation is permanent; there is no release operation.
    fn allocate_periodic_tick(
        &self,
        handler: &'static dyn TickHandler,
        period_us: u32,
    ) -> Result<TickSourceId, TickSourceError>;
}
