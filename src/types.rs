//! Shared types used across the link firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

use core::fmt;

use crate::config::PAYLOAD_LEN;

/// Fixed-length radio payload
///
/// Every payload sent or received over the link has exactly
/// [`PAYLOAD_LEN`] bytes. There is no framing beyond this length.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Payload([u8; PAYLOAD_LEN]);

impl Payload {
    /// Payload length in bytes
    pub const LEN: usize = PAYLOAD_LEN;

    /// All-zero payload
    pub const ZERO: Self = Self([0; PAYLOAD_LEN]);

    /// Create a payload from an exact byte array
    #[must_use]
    pub const fn new(bytes: [u8; PAYLOAD_LEN]) -> Self {
        Self(bytes)
    }

    /// Create a payload from a received slice, None unless the length matches
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; PAYLOAD_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    /// Borrow the payload bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PAYLOAD_LEN] {
        &self.0
    }

    /// Mutable access to the payload bytes
    pub fn as_bytes_mut(&mut self) -> &mut [u8; PAYLOAD_LEN] {
        &mut self.0
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Payload(")?;
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "0x{byte:02X}")?;
        }
        f.write_str(")")
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Payload {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{=[u8]:#04x}", &self.0[..]);
    }
}

/// RF channel (0-125), frequency is 2400 MHz + channel
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Channel(u8);

impl Channel {
    /// Highest channel the nRF24L01+ can tune
    pub const MAX: u8 = 125;

    /// Base RF frequency in MHz (channel 0)
    pub const BASE_MHZ: u16 = 2400;

    /// Create a channel, returns None if out of range
    #[must_use]
    pub const fn new(channel: u8) -> Option<Self> {
        if channel <= Self::MAX {
            Some(Self(channel))
        } else {
            None
        }
    }

    /// Get the raw channel number
    #[must_use]
    pub const fn number(self) -> u8 {
        self.0
    }

    /// Get the RF frequency in MHz
    #[must_use]
    pub const fn frequency_mhz(self) -> u16 {
        Self::BASE_MHZ + self.0 as u16
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Channel({} = {} MHz)", self.0, self.frequency_mhz())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "ch{} ({}MHz)", self.0, self.frequency_mhz());
    }
}

/// 40-bit pipe address
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address(u64);

impl Address {
    /// Address width in bytes
    pub const WIDTH: usize = 5;

    /// Chip reset address
    pub const DEFAULT: Self = Self(0xE7_E7E7_E7E7);

    const MASK: u64 = (1 << 40) - 1;

    /// Create an address, returns None if it does not fit in 40 bits
    #[must_use]
    pub const fn new(raw: u64) -> Option<Self> {
        if raw & !Self::MASK == 0 {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Get the raw 40-bit value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Bytes in over-the-air register order (least significant first)
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; Self::WIDTH] {
        let b = self.0.to_le_bytes();
        [b[0], b[1], b[2], b[3], b[4]]
    }

    /// Rebuild from register bytes (least significant first)
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; Self::WIDTH]) -> Self {
        Self(u64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], 0, 0, 0,
        ]))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address(0x{:010X})", self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Address {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "0x{:010X}", self.0);
    }
}

/// Transmitter output power
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputPower {
    /// -18 dBm
    #[default]
    Minus18Dbm,
    /// -12 dBm
    Minus12Dbm,
    /// -6 dBm
    Minus6Dbm,
    /// 0 dBm
    ZeroDbm,
}

impl OutputPower {
    /// Output power in dBm
    #[must_use]
    pub const fn dbm(self) -> i8 {
        match self {
            Self::Minus18Dbm => -18,
            Self::Minus12Dbm => -12,
            Self::Minus6Dbm => -6,
            Self::ZeroDbm => 0,
        }
    }

    /// RF_PWR field value (bits 2:1 of RF_SETUP, unshifted)
    #[must_use]
    pub const fn bits(self) -> u8 {
        match self {
            Self::Minus18Dbm => 0b00,
            Self::Minus12Dbm => 0b01,
            Self::Minus6Dbm => 0b10,
            Self::ZeroDbm => 0b11,
        }
    }

    /// Decode the RF_PWR field
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Minus18Dbm,
            0b01 => Self::Minus12Dbm,
            0b10 => Self::Minus6Dbm,
            _ => Self::ZeroDbm,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OutputPower {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}dBm", self.dbm());
    }
}

/// Air data rate
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataRate {
    /// 250 kbps
    Kbps250,
    /// 1 Mbps
    #[default]
    Mbps1,
    /// 2 Mbps
    Mbps2,
}

impl DataRate {
    /// Data rate in kbps
    #[must_use]
    pub const fn kbps(self) -> u16 {
        match self {
            Self::Kbps250 => 250,
            Self::Mbps1 => 1000,
            Self::Mbps2 => 2000,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DataRate {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}kbps", self.kbps());
    }
}

/// One-time radio setup parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RadioConfig {
    /// RF channel
    pub channel: Channel,
    /// Transmit output power
    pub output_power: OutputPower,
    /// Air data rate
    pub data_rate: DataRate,
    /// Shared TX/RX pipe address
    pub address: Address,
    /// Static payload width in bytes
    pub payload_size: u8,
}

impl RadioConfig {
    /// Largest static payload the chip supports
    pub const MAX_PAYLOAD_SIZE: u8 = 32;

    /// Check that the payload width is one the chip accepts
    #[must_use]
    pub const fn payload_size_valid(&self) -> bool {
        self.payload_size >= 1 && self.payload_size <= Self::MAX_PAYLOAD_SIZE
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioConfig {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(
            f,
            "RadioConfig({}, {}, {}, {}, {}B)",
            self.channel,
            self.output_power,
            self.data_rate,
            self.address,
            self.payload_size
        );
    }
}
