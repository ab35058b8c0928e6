//! System configuration and deployment constants
//!
//! This module defines compile-time constants for the link: radio
//! parameters, send timing, pin mapping and firmware version. All of
//! them are centralized here; [`LinkConfig`] bundles them for code that
//! wants to select a configuration at run time.

use core::fmt;

use crate::types::{Address, Channel, DataRate, OutputPower, RadioConfig};

/// Firmware version number
pub const VERSION_NUMBER: &str = "v1.1";

/// Firmware version date
pub const VERSION_DATE: &str = "2022-11-21";

/// Firmware name shown in the startup banner
pub const FIRMWARE_NAME: &str = "nRF24Radio";

/// Size of the send/receive buffer in bytes
pub const PAYLOAD_LEN: usize = 4;

/// Interval between sends in milliseconds (interval mode)
pub const SEND_INTERVAL_MS: u32 = 2500;

/// Shared 'mailing' address for TX and RX (chip default is 0xE7E7E7E7E7)
pub const LINK_ADDRESS: u64 = 0xA7_B7C7_D7E7;

/// RF channel for this network
pub const LINK_CHANNEL: u8 = 12;

/// Transmit output power
pub const OUTPUT_POWER: OutputPower = OutputPower::Minus18Dbm;

/// Air data rate
pub const DATA_RATE: DataRate = DataRate::Mbps1;

/// Fixed pattern sent in interval mode
pub const TEST_PATTERN: [u8; PAYLOAD_LEN] = [0x42, 66, b'B', 0b0100_0010];

/// Scheduling policy of this deployment
pub const LINK_MODE: LinkMode = LinkMode::Interval;

/// Send immediately on the first iteration instead of waiting one interval
pub const SEND_ON_START: bool = true;

/// Period of the outer ticker driving the scheduler, in milliseconds
pub const TICK_PERIOD_MS: u64 = 1;

/// Temperature sensor scale in volts per degree Celsius (LM35)
pub const SENSOR_VOLTS_PER_DEGREE: f32 = 0.010;

/// Temperature sensor output at 0 degrees Celsius in volts
pub const SENSOR_OFFSET_VOLTS: f32 = 0.0;

/// ADC reference voltage
pub const ADC_REFERENCE_VOLTS: f32 = 3.3;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the board wiring
    //!
    //! The radio shares IO with push buttons 6 and 7 on the carrier
    //! board; avoid using those switches while the radio is fitted.

    /// SPI1 MOSI to radio
    pub const RADIO_MOSI: &str = "PB5";

    /// SPI1 MISO from radio
    pub const RADIO_MISO: &str = "PB4";

    /// SPI1 SCK to radio
    pub const RADIO_SCK: &str = "PB3";

    /// Radio chip select (active low)
    pub const RADIO_CSN: &str = "PB10";

    /// Radio chip enable
    pub const RADIO_CE: &str = "PA8";

    /// Radio interrupt (active low, unused by the polling loop)
    pub const RADIO_IRQ: &str = "PA9";

    /// Send button (active low with pull-up)
    pub const SEND_BUTTON: &str = "PA0";

    /// Temperature sensor analog input
    pub const TEMP_SENSOR: &str = "PA1";
}

/// Scheduling policy selector
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkMode {
    /// Send the test pattern every interval
    Interval,
    /// Send a temperature reading on each button press
    ButtonEdge,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LinkMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Interval => defmt::write!(f, "Interval"),
            Self::ButtonEdge => defmt::write!(f, "ButtonEdge"),
        }
    }
}

/// Invalid configuration value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Channel above 125
    ChannelOutOfRange(u8),
    /// Address does not fit in 40 bits
    AddressTooWide(u64),
    /// Payload width does not match the codec
    PayloadSize(u8),
    /// Send interval of zero
    ZeroInterval,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChannelOutOfRange(ch) => write!(f, "channel {ch} out of range (0-125)"),
            Self::AddressTooWide(addr) => write!(f, "address 0x{addr:X} wider than 40 bits"),
            Self::PayloadSize(size) => {
                write!(f, "payload size {size} does not match {PAYLOAD_LEN}")
            }
            Self::ZeroInterval => f.write_str("send interval must be non-zero"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ConfigError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::ChannelOutOfRange(ch) => defmt::write!(f, "channel {} out of range", ch),
            Self::AddressTooWide(addr) => defmt::write!(f, "address {:X} too wide", addr),
            Self::PayloadSize(size) => defmt::write!(f, "payload size {}", size),
            Self::ZeroInterval => defmt::write!(f, "zero interval"),
        }
    }
}

/// Complete link configuration
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkConfig {
    /// RF channel number
    pub channel: u8,
    /// Raw 40-bit address
    pub address: u64,
    /// Transmit output power
    pub output_power: OutputPower,
    /// Air data rate
    pub data_rate: DataRate,
    /// Payload width in bytes
    pub payload_size: u8,
    /// Interval between sends in interval mode
    pub send_interval_ms: u32,
    /// Whether the first interval send happens immediately
    pub send_on_start: bool,
    /// Pattern sent in interval mode
    pub test_pattern: [u8; PAYLOAD_LEN],
    /// Scheduling policy
    pub mode: LinkMode,
}

impl LinkConfig {
    /// Check every field and build the radio setup from it
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<RadioConfig, ConfigError> {
        let channel = Channel::new(self.channel).ok_or(ConfigError::ChannelOutOfRange(self.channel))?;
        let address = Address::new(self.address).ok_or(ConfigError::AddressTooWide(self.address))?;
        if usize::from(self.payload_size) != PAYLOAD_LEN {
            return Err(ConfigError::PayloadSize(self.payload_size));
        }
        if self.send_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        Ok(RadioConfig {
            channel,
            output_power: self.output_power,
            data_rate: self.data_rate,
            address,
            payload_size: self.payload_size,
        })
    }
}

impl Default for LinkConfig {
    #[allow(clippy::cast_possible_truncation)]
    fn default() -> Self {
        Self {
            channel: LINK_CHANNEL,
            address: LINK_ADDRESS,
            output_power: OUTPUT_POWER,
            data_rate: DATA_RATE,
            payload_size: PAYLOAD_LEN as u8,
            send_interval_ms: SEND_INTERVAL_MS,
            send_on_start: SEND_ON_START,
            test_pattern: TEST_PATTERN,
            mode: LINK_MODE,
        }
    }
}

/// Build the default radio setup
#[must_use]
pub fn default_radio_config() -> Option<RadioConfig> {
    LinkConfig::default().validate().ok()
}
