//! PIT channel 0 as the scheduler's tick source.

use stratos::{TickHandler, TickSource, TickSourceError, TickSourceId};
use x86_64::instructions::port::Port;

/// PIT input clock in Hz.
const PIT_HZ: u64 = 1_193_182;

/// Channel 0, lobyte/hibyte, rate generator.
const CHANNEL0_RATE_GENERATOR: u8 = 0x34;

static HANDLER: spin::Once<&'static dyn TickHandler> = spin::Once::new();

/// The legacy programmable interval timer. Only channel 0 is wired to IRQ0,
/// so it can be allocated once.
pub struct Pit;

impl TickSource for Pit {
    fn allocate_periodic_tick(
        &self,
        handler: &'static dyn TickHandler,
        period_us: u32,
    ) -> Result<TickSourceId, TickSourceError> {
        let divisor = PIT_HZ * u64::from(period_us) / 1_000_000;
        let divisor = u16::try_from(divisor).map_err(|_| TickSourceError::InvalidParameters)?;
        if divisor < 2 {
            return Err(TickSourceError::InvalidParameters);
        }
        if HANDLER.is_completed() {
            return Err(TickSourceError::ResourceUnavailable);
        }
        HANDLER.call_once(|| handler);

        let [lo, hi] = divisor.to_le_bytes();
        unsafe {
            Port::<u8>::new(0x43).write(CHANNEL0_RATE_GENERATOR);
            let mut data = Port::<u8>::new(0x40);
            data.write(lo);
            data.write(hi);
        }
        Ok(TickSourceId::new(0))
    }
}

/// Deliver one tick. Called from the timer interrupt.
pub fn fire() {
    if let Some(handler) = HANDLER.get() {
        handler.on_tick();
    }
}
