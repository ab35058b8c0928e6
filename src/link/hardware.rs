//! Collaborator Interfaces
//!
//! Traits the scheduler is built on. Each one is a thin, non-blocking
//! view of a piece of hardware so the loop can be exercised with test
//! doubles on the host.

use core::convert::Infallible;
use core::fmt;

use crate::config::{ADC_REFERENCE_VOLTS, SENSOR_OFFSET_VOLTS, SENSOR_VOLTS_PER_DEGREE};
use crate::types::{Payload, RadioConfig};

/// Radio error category
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioErrorKind {
    /// SPI (or other bus) transfer failed
    Bus,
    /// Control pin could not be driven
    Pin,
    /// Transmission did not complete in the allotted polls
    TransmitTimeout,
    /// Radio rejected the configuration
    InvalidConfig,
    /// Driver-specific failure
    Other,
}

impl fmt::Display for RadioErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bus => "bus transfer failed",
            Self::Pin => "control pin failed",
            Self::TransmitTimeout => "transmit timed out",
            Self::InvalidConfig => "invalid configuration",
            Self::Other => "radio error",
        };
        f.write_str(s)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioErrorKind {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Bus => defmt::write!(f, "Bus"),
            Self::Pin => defmt::write!(f, "Pin"),
            Self::TransmitTimeout => defmt::write!(f, "TransmitTimeout"),
            Self::InvalidConfig => defmt::write!(f, "InvalidConfig"),
            Self::Other => defmt::write!(f, "Other"),
        }
    }
}

/// Radio driver error
pub trait RadioError: fmt::Debug {
    /// Map the driver error to a generic category
    fn kind(&self) -> RadioErrorKind;
}

impl RadioError for RadioErrorKind {
    fn kind(&self) -> RadioErrorKind {
        *self
    }
}

impl RadioError for Infallible {
    fn kind(&self) -> RadioErrorKind {
        match *self {}
    }
}

/// Packet radio used by the link
///
/// Every method must complete in bounded time.
pub trait Radio {
    /// Driver error type
    type Error: RadioError;

    /// One-time setup of channel, power, data rate, address and width
    ///
    /// # Errors
    ///
    /// Fails if the configuration could not be written.
    fn configure(&mut self, config: &RadioConfig) -> Result<(), Self::Error>;

    /// Put the radio in receive mode
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error.
    fn set_receive_mode(&mut self) -> Result<(), Self::Error>;

    /// Start the radio (listening when in receive mode)
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error.
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Transmit one payload, no retry
    ///
    /// # Errors
    ///
    /// Fails if the payload could not be handed to the radio or sent.
    fn send(&mut self, payload: &Payload) -> Result<(), Self::Error>;

    /// Check whether inbound data is waiting
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    fn poll_readable(&mut self) -> Result<bool, Self::Error>;

    /// Read pending data into `buf`, returns the number of bytes read
    ///
    /// The count is between 0 and `buf.len()`.
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;
}

/// Monotonic millisecond counter, wraps at 2^32
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&mut self) -> u32;
}

/// Push button sampled by the loop
pub trait ButtonInput {
    /// Instantaneous pressed state (polarity already applied)
    fn is_pressed(&mut self) -> bool;
}

/// 12-bit analog input
pub trait AnalogInput {
    /// Instantaneous raw sample (0-4095)
    fn read_raw(&mut self) -> u16;
}

/// Source of temperature readings
pub trait TemperatureSensor {
    /// Instantaneous temperature in degrees Celsius
    fn read_celsius(&mut self) -> f32;
}

impl ButtonInput for Infallible {
    fn is_pressed(&mut self) -> bool {
        match *self {}
    }
}

impl TemperatureSensor for Infallible {
    fn read_celsius(&mut self) -> f32 {
        match *self {}
    }
}

impl<F: FnMut() -> u32> Clock for F {
    fn now_ms(&mut self) -> u32 {
        self()
    }
}

/// Linear voltage-output sensor calibration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorCalibration {
    /// Sensor output slope in volts per degree
    pub volts_per_degree: f32,
    /// Sensor output at 0 degrees in volts
    pub offset_volts: f32,
    /// ADC full-scale reference in volts
    pub reference_volts: f32,
}

impl SensorCalibration {
    /// Full-scale 12-bit ADC count
    pub const ADC_FULL_SCALE: f32 = 4095.0;

    /// Convert a raw 12-bit sample to degrees Celsius
    #[must_use]
    pub fn celsius(&self, raw: u16) -> f32 {
        let volts = f32::from(raw.min(4095)) / Self::ADC_FULL_SCALE * self.reference_volts;
        (volts - self.offset_volts) / self.volts_per_degree
    }
}

impl Default for SensorCalibration {
    fn default() -> Self {
        Self {
            volts_per_degree: SENSOR_VOLTS_PER_DEGREE,
            offset_volts: SENSOR_OFFSET_VOLTS,
            reference_volts: ADC_REFERENCE_VOLTS,
        }
    }
}

/// Temperature sensor read through an analog input
pub struct AnalogTemperatureSensor<A> {
    input: A,
    calibration: SensorCalibration,
}

impl<A: AnalogInput> AnalogTemperatureSensor<A> {
    /// Create a sensor with the default (LM35) calibration
    #[must_use]
    pub fn new(input: A) -> Self {
        Self::with_calibration(input, SensorCalibration::default())
    }

    /// Create a sensor with an explicit calibration
    #[must_use]
    pub const fn with_calibration(input: A, calibration: SensorCalibration) -> Self {
        Self { input, calibration }
    }

    /// Get the calibration in use
    #[must_use]
    pub const fn calibration(&self) -> &SensorCalibration {
        &self.calibration
    }
}

impl<A: AnalogInput> TemperatureSensor for AnalogTemperatureSensor<A> {
    fn read_celsius(&mut self) -> f32 {
        self.calibration.celsius(self.input.read_raw())
    }
}
