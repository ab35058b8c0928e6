//! `nRF24L01+` Radio Driver
//!
//! Register-level driver for the Nordic `nRF24L01+` 2.4 GHz transceiver,
//! generic over the `embedded-hal` SPI bus, output pin and delay traits.
//!
//! The link runs without the chip's Enhanced ShockBurst acknowledgement:
//! auto-ack and auto-retransmit are switched off, a single pipe (P0)
//! carries a static-width payload, and TX and RX share one address.
//!
//! Every operation is bounded: a send polls STATUS at most
//! [`TX_POLL_LIMIT`] times before giving up.

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use heapless::Vec;

use crate::link::hardware::{Radio, RadioError, RadioErrorKind};
use crate::types::{Address, Channel, DataRate, OutputPower, Payload, RadioConfig};

/// `nRF24L01+` register addresses
pub mod reg {
    /// Configuration
    pub const CONFIG: u8 = 0x00;
    /// Enable auto acknowledgement
    pub const EN_AA: u8 = 0x01;
    /// Enabled RX addresses
    pub const EN_RXADDR: u8 = 0x02;
    /// Address width
    pub const SETUP_AW: u8 = 0x03;
    /// Automatic retransmission
    pub const SETUP_RETR: u8 = 0x04;
    /// RF channel
    pub const RF_CH: u8 = 0x05;
    /// RF setup (data rate, power)
    pub const RF_SETUP: u8 = 0x06;
    /// Status
    pub const STATUS: u8 = 0x07;
    /// Pipe 0 receive address
    pub const RX_ADDR_P0: u8 = 0x0A;
    /// Transmit address
    pub const TX_ADDR: u8 = 0x10;
    /// Pipe 0 payload width
    pub const RX_PW_P0: u8 = 0x11;
    /// FIFO status
    pub const FIFO_STATUS: u8 = 0x17;
    /// Dynamic payload length
    pub const DYNPD: u8 = 0x1C;
    /// Feature register
    pub const FEATURE: u8 = 0x1D;
}

/// SPI command bytes
pub mod cmd {
    /// Read register (OR with address)
    pub const R_REGISTER: u8 = 0x00;
    /// Write register (OR with address)
    pub const W_REGISTER: u8 = 0x20;
    /// Read RX payload
    pub const R_RX_PAYLOAD: u8 = 0x61;
    /// Write TX payload
    pub const W_TX_PAYLOAD: u8 = 0xA0;
    /// Flush TX FIFO
    pub const FLUSH_TX: u8 = 0xE1;
    /// Flush RX FIFO
    pub const FLUSH_RX: u8 = 0xE2;
    /// No operation (reads STATUS)
    pub const NOP: u8 = 0xFF;
}

/// Register bit fields
pub mod bits {
    /// CONFIG: enable CRC
    pub const EN_CRC: u8 = 1 << 3;
    /// CONFIG: 2-byte CRC
    pub const CRCO: u8 = 1 << 2;
    /// CONFIG: power up
    pub const PWR_UP: u8 = 1 << 1;
    /// CONFIG: primary receiver
    pub const PRIM_RX: u8 = 1 << 0;
    /// STATUS: data ready in RX FIFO
    pub const RX_DR: u8 = 1 << 6;
    /// STATUS: data sent
    pub const TX_DS: u8 = 1 << 5;
    /// STATUS: maximum retransmits
    pub const MAX_RT: u8 = 1 << 4;
    /// STATUS: RX pipe number field
    pub const RX_P_NO_MASK: u8 = 0b111 << 1;
    /// STATUS: RX pipe number value meaning RX FIFO empty
    pub const RX_P_NO_EMPTY: u8 = 0b111 << 1;
    /// RF_SETUP: 250 kbps
    pub const RF_DR_LOW: u8 = 1 << 5;
    /// RF_SETUP: 2 Mbps
    pub const RF_DR_HIGH: u8 = 1 << 3;
    /// RF_SETUP: output power field
    pub const RF_PWR_MASK: u8 = 0b11 << 1;
    /// SETUP_AW: 5-byte addresses
    pub const AW_5_BYTES: u8 = 0b11;
    /// EN_RXADDR: pipe 0
    pub const ERX_P0: u8 = 1 << 0;
}

/// Maximum STATUS polls while waiting for a transmission to complete
pub const TX_POLL_LIMIT: u32 = 100;

/// Delay between STATUS polls in microseconds
pub const TX_POLL_INTERVAL_US: u32 = 20;

/// Minimum CE high pulse to start a transmission in microseconds
pub const CE_PULSE_US: u32 = 10;

/// Power down to standby settling time in microseconds
pub const POWER_UP_DELAY_US: u32 = 1_500;

/// RX/TX settling time in microseconds
pub const SETTLING_DELAY_US: u32 = 130;

/// Largest SPI frame: command byte plus 32 payload bytes
const MAX_FRAME: usize = 33;

/// Driver error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nrf24Error<SpiE, PinE> {
    /// SPI transfer failed
    Spi(SpiE),
    /// CSN or CE could not be driven
    Pin(PinE),
    /// TX_DS never asserted
    TransmitTimeout,
    /// Payload width outside 1-32 bytes, or payload longer than configured
    InvalidConfig,
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> fmt::Display for Nrf24Error<SpiE, PinE> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spi(e) => write!(f, "SPI error: {e:?}"),
            Self::Pin(e) => write!(f, "pin error: {e:?}"),
            Self::TransmitTimeout => f.write_str("transmit timed out"),
            Self::InvalidConfig => f.write_str("invalid configuration"),
        }
    }
}

impl<SpiE: fmt::Debug, PinE: fmt::Debug> RadioError for Nrf24Error<SpiE, PinE> {
    fn kind(&self) -> RadioErrorKind {
        match self {
            Self::Spi(_) => RadioErrorKind::Bus,
            Self::Pin(_) => RadioErrorKind::Pin,
            Self::TransmitTimeout => RadioErrorKind::TransmitTimeout,
            Self::InvalidConfig => RadioErrorKind::InvalidConfig,
        }
    }
}

#[cfg(feature = "embedded")]
impl<SpiE, PinE> defmt::Format for Nrf24Error<SpiE, PinE> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Spi(_) => defmt::write!(f, "Spi"),
            Self::Pin(_) => defmt::write!(f, "Pin"),
            Self::TransmitTimeout => defmt::write!(f, "TransmitTimeout"),
            Self::InvalidConfig => defmt::write!(f, "InvalidConfig"),
        }
    }
}

/// Result type for driver operations
pub type Nrf24Result<T, SPI, CSN> =
    Result<T, Nrf24Error<<SPI as embedded_hal::spi::ErrorType>::Error, <CSN as embedded_hal::digital::ErrorType>::Error>>;

/// `nRF24L01+` driver
pub struct Nrf24<SPI, CSN, CE, D> {
    spi: SPI,
    csn: CSN,
    ce: CE,
    delay: D,
    /// Shadow of the CONFIG register
    config: u8,
    /// Configured static payload width
    payload_size: u8,
    /// CE currently held high
    enabled: bool,
}

impl<SPI, CSN, CE, D> Nrf24<SPI, CSN, CE, D>
where
    SPI: SpiBus,
    CSN: OutputPin,
    CE: OutputPin<Error = CSN::Error>,
    D: DelayNs,
{
    /// Create a driver (chip left powered down)
    #[must_use]
    pub fn new(spi: SPI, csn: CSN, ce: CE, delay: D) -> Self {
        Self {
            spi,
            csn,
            ce,
            delay,
            config: bits::EN_CRC,
            payload_size: 0,
            enabled: false,
        }
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, CSN, CE, D) {
        (self.spi, self.csn, self.ce, self.delay)
    }

    /// Power up into standby and wait for the oscillator to settle
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error.
    pub fn power_up(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.config |= bits::PWR_UP;
        self.write_register(reg::CONFIG, self.config)?;
        self.delay.delay_us(POWER_UP_DELAY_US);
        Ok(())
    }

    /// Power down (CE dropped first)
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error.
    pub fn power_down(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.disable()?;
        self.config &= !bits::PWR_UP;
        self.write_register(reg::CONFIG, self.config)
    }

    /// Apply channel, power, data rate, address and payload width
    ///
    /// Auto-ack and retransmit are disabled; only pipe 0 is enabled.
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error, or an out-of-range payload width.
    pub fn configure(&mut self, config: &RadioConfig) -> Nrf24Result<(), SPI, CSN> {
        if !config.payload_size_valid() {
            return Err(Nrf24Error::InvalidConfig);
        }
        if self.config & bits::PWR_UP == 0 {
            self.power_up()?;
        }
        self.disable()?;

        self.write_register(reg::SETUP_AW, bits::AW_5_BYTES)?;
        self.write_register(reg::EN_AA, 0)?;
        self.write_register(reg::SETUP_RETR, 0)?;
        self.write_register(reg::EN_RXADDR, bits::ERX_P0)?;
        self.write_register(reg::RF_CH, config.channel.number())?;
        self.write_register(reg::RF_SETUP, rf_setup_bits(config.output_power, config.data_rate))?;
        self.write_registers(reg::TX_ADDR, &config.address.to_le_bytes())?;
        self.write_registers(reg::RX_ADDR_P0, &config.address.to_le_bytes())?;
        self.write_register(reg::RX_PW_P0, config.payload_size)?;
        self.write_register(reg::DYNPD, 0)?;
        self.write_register(reg::FEATURE, 0)?;

        self.config |= bits::EN_CRC | bits::CRCO;
        self.write_register(reg::CONFIG, self.config)?;

        self.command(cmd::FLUSH_TX)?;
        self.command(cmd::FLUSH_RX)?;
        self.clear_status(bits::RX_DR | bits::TX_DS | bits::MAX_RT)?;

        self.payload_size = config.payload_size;
        Ok(())
    }

    /// Switch to primary receiver
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn set_receive_mode(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.config |= bits::PRIM_RX;
        self.write_register(reg::CONFIG, self.config)
    }

    /// Switch to primary transmitter
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn set_transmit_mode(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.config &= !bits::PRIM_RX;
        self.write_register(reg::CONFIG, self.config)
    }

    /// Raise CE (start listening in receive mode)
    ///
    /// # Errors
    ///
    /// Fails if CE cannot be driven.
    pub fn enable(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.ce.set_high().map_err(Nrf24Error::Pin)?;
        self.enabled = true;
        self.delay.delay_us(SETTLING_DELAY_US);
        Ok(())
    }

    /// Drop CE
    ///
    /// # Errors
    ///
    /// Fails if CE cannot be driven.
    pub fn disable(&mut self) -> Nrf24Result<(), SPI, CSN> {
        self.ce.set_low().map_err(Nrf24Error::Pin)?;
        self.enabled = false;
        Ok(())
    }

    /// Check if in receive mode
    #[must_use]
    pub const fn is_receive_mode(&self) -> bool {
        self.config & bits::PRIM_RX != 0
    }

    /// Check if CE is high
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Transmit one payload and return to the previous mode
    ///
    /// # Errors
    ///
    /// Fails on a bus or pin error, a payload longer than the configured
    /// width, or when TX_DS is not seen within [`TX_POLL_LIMIT`] polls.
    pub fn write(&mut self, data: &[u8]) -> Nrf24Result<(), SPI, CSN> {
        if data.is_empty() || data.len() > usize::from(self.payload_size) {
            return Err(Nrf24Error::InvalidConfig);
        }
        let was_rx = self.is_receive_mode();
        let was_enabled = self.enabled;

        let sent = self.transmit(data);
        let restored = self.restore(was_rx, was_enabled);
        sent.and(restored)
    }

    fn transmit(&mut self, data: &[u8]) -> Nrf24Result<(), SPI, CSN> {
        self.disable()?;
        self.set_transmit_mode()?;
        self.command(cmd::FLUSH_TX)?;

        // Pad to the static width, the receiver expects exactly that many bytes
        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        let _ = frame.push(cmd::W_TX_PAYLOAD);
        let _ = frame.extend_from_slice(data);
        let _ = frame.resize(usize::from(self.payload_size) + 1, 0);
        self.transfer(&mut frame)?;

        self.ce.set_high().map_err(Nrf24Error::Pin)?;
        self.delay.delay_us(CE_PULSE_US);
        self.ce.set_low().map_err(Nrf24Error::Pin)?;

        for _ in 0..TX_POLL_LIMIT {
            let status = self.status()?;
            if status & bits::TX_DS != 0 {
                return self.clear_status(bits::TX_DS);
            }
            if status & bits::MAX_RT != 0 {
                self.clear_status(bits::MAX_RT)?;
                self.command(cmd::FLUSH_TX)?;
                return Err(Nrf24Error::TransmitTimeout);
            }
            self.delay.delay_us(TX_POLL_INTERVAL_US);
        }

        self.command(cmd::FLUSH_TX)?;
        Err(Nrf24Error::TransmitTimeout)
    }

    fn restore(&mut self, was_rx: bool, was_enabled: bool) -> Nrf24Result<(), SPI, CSN> {
        if was_rx {
            self.set_receive_mode()?;
        }
        if was_enabled {
            self.enable()?;
        }
        Ok(())
    }

    /// Check if a payload is waiting in the RX FIFO
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn readable(&mut self) -> Nrf24Result<bool, SPI, CSN> {
        let status = self.status()?;
        Ok(status & bits::RX_P_NO_MASK != bits::RX_P_NO_EMPTY)
    }

    /// Read the next payload into `buf`, returns bytes read
    ///
    /// Returns 0 when the RX FIFO is empty. At most the configured width
    /// is read.
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn read(&mut self, buf: &mut [u8]) -> Nrf24Result<usize, SPI, CSN> {
        if !self.readable()? {
            return Ok(0);
        }
        let count = buf.len().min(usize::from(self.payload_size));

        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        let _ = frame.push(cmd::R_RX_PAYLOAD);
        let _ = frame.resize(count + 1, cmd::NOP);
        self.transfer(&mut frame)?;
        buf[..count].copy_from_slice(&frame[1..=count]);

        self.clear_status(bits::RX_DR)?;
        Ok(count)
    }

    /// Read the STATUS register
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn status(&mut self) -> Nrf24Result<u8, SPI, CSN> {
        let mut frame = [cmd::NOP];
        self.transfer(&mut frame)?;
        Ok(frame[0])
    }

    /// RF frequency in MHz read back from RF_CH
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn rf_frequency_mhz(&mut self) -> Nrf24Result<u16, SPI, CSN> {
        let ch = self.read_register(reg::RF_CH)? & 0x7F;
        Ok(Channel::BASE_MHZ + u16::from(ch))
    }

    /// Output power read back from RF_SETUP
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn output_power(&mut self) -> Nrf24Result<OutputPower, SPI, CSN> {
        let setup = self.read_register(reg::RF_SETUP)?;
        Ok(OutputPower::from_bits((setup & bits::RF_PWR_MASK) >> 1))
    }

    /// Air data rate read back from RF_SETUP
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn data_rate(&mut self) -> Nrf24Result<DataRate, SPI, CSN> {
        let setup = self.read_register(reg::RF_SETUP)?;
        Ok(if setup & bits::RF_DR_LOW != 0 {
            DataRate::Kbps250
        } else if setup & bits::RF_DR_HIGH != 0 {
            DataRate::Mbps2
        } else {
            DataRate::Mbps1
        })
    }

    /// Transmit address read back from TX_ADDR
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn tx_address(&mut self) -> Nrf24Result<Address, SPI, CSN> {
        self.read_address(reg::TX_ADDR)
    }

    /// Pipe 0 receive address read back from RX_ADDR_P0
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn rx_address(&mut self) -> Nrf24Result<Address, SPI, CSN> {
        self.read_address(reg::RX_ADDR_P0)
    }

    /// Pipe 0 payload width read back from RX_PW_P0
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn transfer_size(&mut self) -> Nrf24Result<u8, SPI, CSN> {
        Ok(self.read_register(reg::RX_PW_P0)? & 0x3F)
    }

    fn read_address(&mut self, register: u8) -> Nrf24Result<Address, SPI, CSN> {
        let mut frame = [cmd::NOP; Address::WIDTH + 1];
        frame[0] = cmd::R_REGISTER | register;
        self.transfer(&mut frame)?;
        let mut bytes = [0u8; Address::WIDTH];
        bytes.copy_from_slice(&frame[1..]);
        Ok(Address::from_le_bytes(bytes))
    }

    /// Read a single register
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn read_register(&mut self, register: u8) -> Nrf24Result<u8, SPI, CSN> {
        let mut frame = [cmd::R_REGISTER | register, cmd::NOP];
        self.transfer(&mut frame)?;
        Ok(frame[1])
    }

    /// Write a single register
    ///
    /// # Errors
    ///
    /// Fails on a bus error.
    pub fn write_register(&mut self, register: u8, value: u8) -> Nrf24Result<(), SPI, CSN> {
        let mut frame = [cmd::W_REGISTER | register, value];
        self.transfer(&mut frame)
    }

    fn write_registers(&mut self, register: u8, values: &[u8]) -> Nrf24Result<(), SPI, CSN> {
        let mut frame: Vec<u8, MAX_FRAME> = Vec::new();
        let _ = frame.push(cmd::W_REGISTER | register);
        frame
            .extend_from_slice(values)
            .map_err(|()| Nrf24Error::InvalidConfig)?;
        self.transfer(&mut frame)
    }

    fn clear_status(&mut self, flags: u8) -> Nrf24Result<(), SPI, CSN> {
        self.write_register(reg::STATUS, flags)
    }

    fn command(&mut self, command: u8) -> Nrf24Result<(), SPI, CSN> {
        self.transfer(&mut [command])
    }

    /// One CSN-framed SPI transaction, full duplex in place
    fn transfer(&mut self, frame: &mut [u8]) -> Nrf24Result<(), SPI, CSN> {
        self.csn.set_low().map_err(Nrf24Error::Pin)?;
        let result = self
            .spi
            .transfer_in_place(frame)
            .and_then(|()| self.spi.flush())
            .map_err(Nrf24Error::Spi);
        self.csn.set_high().map_err(Nrf24Error::Pin)?;
        result
    }
}

/// RF_SETUP value for a power level and data rate
#[must_use]
pub const fn rf_setup_bits(power: OutputPower, rate: DataRate) -> u8 {
    let rate_bits = match rate {
        DataRate::Kbps250 => bits::RF_DR_LOW,
        DataRate::Mbps1 => 0,
        DataRate::Mbps2 => bits::RF_DR_HIGH,
    };
    rate_bits | (power.bits() << 1)
}

impl<SPI, CSN, CE, D> Radio for Nrf24<SPI, CSN, CE, D>
where
    SPI: SpiBus,
    CSN: OutputPin,
    CE: OutputPin<Error = CSN::Error>,
    D: DelayNs,
{
    type Error = Nrf24Error<SPI::Error, CSN::Error>;

    fn configure(&mut self, config: &RadioConfig) -> Result<(), Self::Error> {
        Nrf24::configure(self, config)
    }

    fn set_receive_mode(&mut self) -> Result<(), Self::Error> {
        Nrf24::set_receive_mode(self)
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        Nrf24::enable(self)
    }

    fn send(&mut self, payload: &Payload) -> Result<(), Self::Error> {
        self.write(payload.as_ref())
    }

    fn poll_readable(&mut self) -> Result<bool, Self::Error> {
        self.readable()
    }

    fn receive(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.read(buf)
    }
}
