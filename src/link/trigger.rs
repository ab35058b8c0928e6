//! Send Triggers
//!
//! The two ways a send can be triggered: an elapsed interval on a
//! wrapping millisecond counter, or a rising edge on a button.

/// Interval timer on a wrapping 32-bit millisecond counter
///
/// Elapsed time is computed as `now.wrapping_sub(last)`, which is exact
/// modulo 2^32, so the comparison stays correct across counter overflow
/// as long as sends are less than ~49.7 days apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    /// Interval between sends
    interval_ms: u32,
    /// Time of the last send
    last_ms: u32,
}

impl IntervalTimer {
    /// Create a timer whose last-send mark is at time zero
    #[must_use]
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: 0,
        }
    }

    /// Create a timer that is due on the first tick past time zero
    ///
    /// The last-send mark starts one interval before zero.
    #[must_use]
    pub const fn primed(interval_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: 0u32.wrapping_sub(interval_ms),
        }
    }

    /// Create a timer with an explicit last-send mark
    #[must_use]
    pub const fn with_last(interval_ms: u32, last_ms: u32) -> Self {
        Self { interval_ms, last_ms }
    }

    /// Milliseconds since the last send, modulo 2^32
    #[must_use]
    pub const fn elapsed(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.last_ms)
    }

    /// Check if strictly more than one interval has elapsed
    #[must_use]
    pub const fn is_due(&self, now_ms: u32) -> bool {
        self.elapsed(now_ms) > self.interval_ms
    }

    /// Record a send at `now_ms`
    pub fn mark(&mut self, now_ms: u32) {
        self.last_ms = now_ms;
    }

    /// Check and mark in one step, returns true if a send is due
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.is_due(now_ms) {
            self.mark(now_ms);
            true
        } else {
            false
        }
    }

    /// Get the interval
    #[must_use]
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Get the last-send mark
    #[must_use]
    pub const fn last_ms(&self) -> u32 {
        self.last_ms
    }
}

/// Button edge state machine state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ButtonEdgeState {
    /// Button is up
    #[default]
    Idle,
    /// Button is down
    Pressed,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ButtonEdgeState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "Idle"),
            Self::Pressed => defmt::write!(f, "Pressed"),
        }
    }
}

/// Transition seen by the edge detector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Edge {
    /// Idle -> Pressed
    Rising,
    /// Pressed -> Idle
    Falling,
}

/// Two-state edge detector with no debounce or timeout
#[derive(Clone, Copy, Debug, Default)]
pub struct EdgeDetector {
    state: ButtonEdgeState,
}

impl EdgeDetector {
    /// Create a detector in the Idle state
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ButtonEdgeState::Idle,
        }
    }

    /// Feed one sample, returns the edge if the state changed
    pub fn update(&mut self, pressed: bool) -> Option<Edge> {
        use ButtonEdgeState::{Idle, Pressed};

        let (new_state, edge) = match (self.state, pressed) {
            (Idle, true) => (Pressed, Some(Edge::Rising)),
            (Pressed, false) => (Idle, Some(Edge::Falling)),
            // Level held
            (state, _) => (state, None),
        };

        self.state = new_state;
        edge
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> ButtonEdgeState {
        self.state
    }

    /// Return to Idle
    pub fn reset(&mut self) {
        self.state = ButtonEdgeState::Idle;
    }
}
