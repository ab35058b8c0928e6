//! Timer Abstractions
//!
//! Millisecond uptime clock for the link scheduler, backed by the
//! embassy time driver.

use embassy_time::Instant;

use crate::link::hardware::Clock;

/// Uptime clock truncated to a wrapping 32-bit millisecond counter
#[derive(Clone, Copy, Debug)]
pub struct UptimeClock {
    /// Instant treated as time zero
    epoch: Instant,
}

impl UptimeClock {
    /// Create a clock that starts at zero now
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Create a clock counting from boot
    #[must_use]
    pub const fn since_boot() -> Self {
        Self {
            epoch: Instant::from_ticks(0),
        }
    }

    /// Milliseconds since the epoch, wrapping at 2^32
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn millis(&self) -> u32 {
        (Instant::now() - self.epoch).as_millis() as u32
    }
}

impl Default for UptimeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for UptimeClock {
    fn now_ms(&mut self) -> u32 {
        self.millis()
    }
}

impl defmt::Format for UptimeClock {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Uptime({}ms)", self.millis());
    }
}
