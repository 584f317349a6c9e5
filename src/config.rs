//! Compile-time scheduler configuration.

/// Maximum number of tasks a scheduler holds over its whole lifetime.
///
/// Slots are never reclaimed, so this counts killed tasks too. Kernel tasks
/// share the budget with everything else.
pub const DEFAULT_CAPACITY: usize = 20;

/// Microseconds per scheduler tick.
///
/// Pick something in the same order of magnitude as the common task
/// periods. Timer precision varies with the hardware; 1ms or more is a
/// safe choice.
pub const DEFAULT_TICK_US: u32 = 1000;

/// Runtime-visible scheduler configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Period of the tick source in microseconds.
    pub tick_us: u32,
}

impl Config {
    pub const DEFAULT: Config = Config {
        tick_us: DEFAULT_TICK_US,
    };

    pub const fn new(tick_us: u32) -> Self {
        Config { tick_us }
    }

    /// Convert a period in microseconds into whole ticks.
    ///
    /// Rounds up so a task never runs more often than requested, and never
    /// returns less than one tick.
    pub const fn ticks_from_us(&self, us: u64) -> u64 {
        let tick = self.tick_us as u64;
        if tick == 0 {
            return 1;
        }
        let ticks = us.div_ceil(tick);
        if ticks == 0 {
            1
        } else {
            ticks
        }
    }

    /// Convert a period in milliseconds into whole ticks.
    pub const fn ticks_from_ms(&self, ms: u64) -> u64 {
        self.ticks_from_us(ms.saturating_mul(1000))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tick_is_one_millisecond() {
        let config = Config::default();
        assert_eq!(config.tick_us, 1000);
        assert_eq!(config.ticks_from_ms(10), 10);
        assert_eq!(config.ticks_from_ms(5000), 5000);
    }

    #[test]
    fn partial_ticks_round_up() {
        let config = Config::new(250);
        assert_eq!(config.ticks_from_us(1000), 4);
        assert_eq!(config.ticks_from_us(1001), 5);
        assert_eq!(config.ticks_from_us(1), 1);
    }

    #[test]
    fn never_zero_ticks() {
        assert_eq!(Config::DEFAULT.ticks_from_us(0), 1);
        assert_eq!(Config::new(0).ticks_from_us(500), 1);
    }
}
