//! Payload Codec
//!
//! Pure conversion between application values and the fixed-width wire
//! payload. Two encodings share the same [`Payload`]:
//!
//! - raw: up to [`PAYLOAD_LEN`] literal bytes, zero padded
//! - temperature: a 2-decimal fixed-point Celsius value offset by
//!   +200.00, stored big-endian in bytes 0-1, bytes 2-3 zero
//!
//! ```text
//!  byte:   0        1        2        3
//!        ┌────────┬────────┬────────┬────────┐
//!        │ raw_hi │ raw_lo │  0x00  │  0x00  │   raw = round((t + 200) * 100)
//!        └────────┴────────┴────────┴────────┘
//! ```

use core::fmt;

use micromath::F32Ext;

use crate::config::PAYLOAD_LEN;
use crate::types::Payload;

/// Offset added before scaling so the encoded value is non-negative
pub const TEMPERATURE_OFFSET: f32 = 200.0;

/// Fixed-point scale (two decimal places)
pub const TEMPERATURE_SCALE: f32 = 100.0;

/// Lowest temperature representable on the wire
pub const TEMPERATURE_MIN: f32 = -200.0;

/// Highest temperature representable on the wire
pub const TEMPERATURE_MAX: f32 = 455.35;

/// Side on which an out-of-range temperature was clamped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Saturation {
    /// Below -200.00 (or NaN), clamped to raw 0
    Low,
    /// Above 455.35, clamped to raw 65535
    High,
}

impl fmt::Display for Saturation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("clamped to -200.00"),
            Self::High => f.write_str("clamped to 455.35"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Saturation {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Low => defmt::write!(f, "Low"),
            Self::High => defmt::write!(f, "High"),
        }
    }
}

/// Raw fixed-point temperature: hundredths of a degree above -200 C
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TemperatureReading(u16);

impl TemperatureReading {
    /// Build from the raw wire value
    #[must_use]
    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    /// Convert a Celsius value, saturating at the representable extremes
    ///
    /// The returned [`Saturation`] is `Some` when the input had to be
    /// clamped. NaN clamps low.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_celsius(celsius: f32) -> (Self, Option<Saturation>) {
        // micromath rounding maps NaN to 0.0, so NaN is caught on the input
        if celsius.is_nan() {
            return (Self(0), Some(Saturation::Low));
        }
        let scaled = F32Ext::round((celsius + TEMPERATURE_OFFSET) * TEMPERATURE_SCALE);
        if scaled < 0.0 {
            (Self(0), Some(Saturation::Low))
        } else if scaled > f32::from(u16::MAX) {
            (Self(u16::MAX), Some(Saturation::High))
        } else {
            (Self(scaled as u16), None)
        }
    }

    /// Get the raw wire value
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Convert back to degrees Celsius
    #[must_use]
    pub fn celsius(self) -> f32 {
        f32::from(self.0) / TEMPERATURE_SCALE - TEMPERATURE_OFFSET
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for TemperatureReading {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}C", self.celsius());
    }
}

/// Value decoded from a received payload
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DecodedValue {
    /// Payload bytes as received
    Raw([u8; PAYLOAD_LEN]),
    /// Temperature in degrees Celsius
    Temperature(f32),
}

#[cfg(feature = "embedded")]
impl defmt::Format for DecodedValue {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Raw(bytes) => defmt::write!(f, "{=[u8]:#04x}", &bytes[..]),
            Self::Temperature(c) => defmt::write!(f, "{}C", c),
        }
    }
}

/// Result of encoding a temperature
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemperatureEncoding {
    /// Encoded payload (always valid)
    pub payload: Payload,
    /// Set when the value was clamped
    pub saturation: Option<Saturation>,
}

/// Copy up to [`PAYLOAD_LEN`] literal bytes into a payload
///
/// Fewer bytes are zero padded; extra bytes are ignored.
#[must_use]
pub fn encode_raw(bytes: &[u8]) -> Payload {
    let mut payload = Payload::ZERO;
    let n = bytes.len().min(PAYLOAD_LEN);
    payload.as_bytes_mut()[..n].copy_from_slice(&bytes[..n]);
    payload
}

/// Return the payload bytes unchanged
#[must_use]
pub const fn decode_raw(payload: &Payload) -> [u8; PAYLOAD_LEN] {
    *payload.as_bytes()
}

/// Encode a Celsius temperature into bytes 0-1 (big-endian)
#[must_use]
pub fn encode_temperature(celsius: f32) -> TemperatureEncoding {
    let (reading, saturation) = TemperatureReading::from_celsius(celsius);
    let mut payload = Payload::ZERO;
    payload.as_bytes_mut()[..2].copy_from_slice(&reading.raw().to_be_bytes());
    TemperatureEncoding { payload, saturation }
}

/// Decode bytes 0-1 (big-endian) as a Celsius temperature
///
/// No plausibility check is made on the result.
#[must_use]
pub fn decode_temperature(payload: &Payload) -> f32 {
    let bytes = payload.as_bytes();
    TemperatureReading::from_raw(u16::from_be_bytes([bytes[0], bytes[1]])).celsius()
}
