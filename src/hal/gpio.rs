//! GPIO Abstractions
//!
//! Type-safe GPIO pin wrappers for the link board.
//! Provides semantic meaning to pins through the type system.

use embassy_stm32::gpio::Input;

use crate::link::hardware::ButtonInput;

/// Electrical level that means "pressed"
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Pressed pulls the pin low (internal pull-up)
    #[default]
    ActiveLow,
    /// Pressed drives the pin high (internal pull-down)
    ActiveHigh,
}

impl defmt::Format for Polarity {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ActiveLow => defmt::write!(f, "active-low"),
            Self::ActiveHigh => defmt::write!(f, "active-high"),
        }
    }
}

/// Send button input, sampled without debouncing
pub struct SendButton<'d> {
    pin: Input<'d>,
    polarity: Polarity,
}

impl<'d> SendButton<'d> {
    /// Create a send button with the given polarity
    #[must_use]
    pub fn new(pin: Input<'d>, polarity: Polarity) -> Self {
        Self { pin, polarity }
    }

    /// Create an active-low send button
    #[must_use]
    pub fn active_low(pin: Input<'d>) -> Self {
        Self::new(pin, Polarity::ActiveLow)
    }

    /// Check if the button is pressed
    #[must_use]
    pub fn is_pressed(&self) -> bool {
        match self.polarity {
            Polarity::ActiveLow => self.pin.is_low(),
            Polarity::ActiveHigh => self.pin.is_high(),
        }
    }
}

impl ButtonInput for SendButton<'_> {
    fn is_pressed(&mut self) -> bool {
        SendButton::is_pressed(self)
    }
}
