//! nRF24L01+ Driver Tests
//!
//! Tests for the register-level radio driver against a simulated chip
//! sitting behind a fake SPI bus and fake CSN/CE pins.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test nrf24_tests

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType as PinErrorType, OutputPin};
use embedded_hal::spi::{ErrorKind, ErrorType as SpiErrorType, SpiBus};

use nrf24_link::config::{default_radio_config, LinkConfig, TEST_PATTERN};
use nrf24_link::drivers::nrf24::{bits, cmd, reg, rf_setup_bits, Nrf24, Nrf24Error};
use nrf24_link::link::event::{EventLog, LinkEvent, RadioOp};
use nrf24_link::link::hardware::{Radio, RadioError, RadioErrorKind};
use nrf24_link::link::scheduler::IntervalScheduler;
use nrf24_link::types::{Address, DataRate, OutputPower, Payload, RadioConfig};

// ============================================================================
// Simulated Chip
// ============================================================================

#[derive(Default)]
struct Chip {
    regs: [u8; 0x20],
    tx_addr: [u8; 5],
    rx_addr_p0: [u8; 5],
    flags: u8,
    rx_fifo: VecDeque<Vec<u8>>,
    tx_fifo: Option<Vec<u8>>,
    on_air: Vec<Vec<u8>>,
    frames: Vec<Vec<u8>>,
    ce: bool,
    csn_low: bool,
    transmitter_dead: bool,
    spi_broken: bool,
}

impl Chip {
    fn status(&self) -> u8 {
        let pipe = if self.rx_fifo.is_empty() { bits::RX_P_NO_EMPTY } else { 0 };
        self.flags | pipe
    }

    fn inject(&mut self, payload: &[u8]) {
        self.rx_fifo.push_back(payload.to_vec());
        self.flags |= bits::RX_DR;
    }

    fn set_ce(&mut self, high: bool) {
        let rising = high && !self.ce;
        self.ce = high;
        let ptx = self.regs[usize::from(reg::CONFIG)] & bits::PRIM_RX == 0;
        let powered = self.regs[usize::from(reg::CONFIG)] & bits::PWR_UP != 0;
        if rising && ptx && powered && !self.transmitter_dead {
            if let Some(frame) = self.tx_fifo.take() {
                self.on_air.push(frame);
                self.flags |= bits::TX_DS;
            }
        }
    }

    fn exchange(&mut self, frame: &mut [u8]) {
        assert!(self.csn_low, "SPI transfer without CSN asserted");
        self.frames.push(frame.to_vec());
        let command = frame[0];
        frame[0] = self.status();

        match command {
            cmd::R_RX_PAYLOAD => {
                let payload = self.rx_fifo.pop_front().unwrap_or_default();
                for (out, byte) in frame[1..].iter_mut().zip(payload) {
                    *out = byte;
                }
            }
            cmd::W_TX_PAYLOAD => self.tx_fifo = Some(frame[1..].to_vec()),
            cmd::FLUSH_TX => self.tx_fifo = None,
            cmd::FLUSH_RX => self.rx_fifo.clear(),
            cmd::NOP => {}
            c if c < 0x20 => {
                let r = c & 0x1F;
                let n = frame.len() - 1;
                match r {
                    reg::TX_ADDR => frame[1..].copy_from_slice(&self.tx_addr[..n]),
                    reg::RX_ADDR_P0 => frame[1..].copy_from_slice(&self.rx_addr_p0[..n]),
                    reg::STATUS => frame[1] = self.status(),
                    _ => frame[1] = self.regs[usize::from(r)],
                }
            }
            c if c < 0x40 => {
                let r = c & 0x1F;
                let data = frame[1..].to_vec();
                match r {
                    reg::TX_ADDR => self.tx_addr.copy_from_slice(&data),
                    reg::RX_ADDR_P0 => self.rx_addr_p0.copy_from_slice(&data),
                    reg::STATUS => self.flags &= !data[0],
                    _ => self.regs[usize::from(r)] = data[0],
                }
            }
            other => panic!("unexpected command 0x{other:02X}"),
        }
    }

    fn sent_commands(&self) -> Vec<u8> {
        self.frames.iter().map(|f| f[0]).collect()
    }
}

type SharedChip = Rc<RefCell<Chip>>;

struct FakeSpi(SharedChip);

impl SpiErrorType for FakeSpi {
    type Error = ErrorKind;
}

impl SpiBus for FakeSpi {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(cmd::NOP);
        self.transfer_in_place(words)
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        let mut copy = words.to_vec();
        self.transfer_in_place(&mut copy)
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        let mut copy = write.to_vec();
        self.transfer_in_place(&mut copy)?;
        let n = read.len().min(copy.len());
        read[..n].copy_from_slice(&copy[..n]);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut chip = self.0.borrow_mut();
        if chip.spi_broken {
            return Err(ErrorKind::Other);
        }
        chip.exchange(words);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

struct FakeCsn(SharedChip);

impl PinErrorType for FakeCsn {
    type Error = Infallible;
}

impl OutputPin for FakeCsn {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().csn_low = true;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().csn_low = false;
        Ok(())
    }
}

struct FakeCe(SharedChip);

impl PinErrorType for FakeCe {
    type Error = Infallible;
}

impl OutputPin for FakeCe {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().set_ce(true);
        Ok(())
    }
}

/// Delay that only accumulates the requested time
#[derive(Default)]
struct NoDelay {
    total_ns: u64,
}

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

type TestRadio = Nrf24<FakeSpi, FakeCsn, FakeCe, NoDelay>;

fn new_radio() -> (TestRadio, SharedChip) {
    let chip = Rc::new(RefCell::new(Chip {
        regs: {
            let mut regs = [0u8; 0x20];
            regs[usize::from(reg::CONFIG)] = bits::EN_CRC;
            regs
        },
        ..Chip::default()
    }));
    let radio = Nrf24::new(
        FakeSpi(chip.clone()),
        FakeCsn(chip.clone()),
        FakeCe(chip.clone()),
        NoDelay::default(),
    );
    (radio, chip)
}

fn configured_radio() -> (TestRadio, SharedChip) {
    let (mut radio, chip) = new_radio();
    let config = default_radio_config().expect("default config is valid");
    radio.configure(&config).expect("configure on simulated chip");
    (radio, chip)
}

fn reg_value(chip: &SharedChip, register: u8) -> u8 {
    chip.borrow().regs[usize::from(register)]
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn configure_writes_link_registers() {
    let (_radio, chip) = configured_radio();

    assert_eq!(reg_value(&chip, reg::RF_CH), 12);
    assert_eq!(reg_value(&chip, reg::RF_SETUP), 0x00);
    assert_eq!(reg_value(&chip, reg::EN_AA), 0);
    assert_eq!(reg_value(&chip, reg::SETUP_RETR), 0);
    assert_eq!(reg_value(&chip, reg::EN_RXADDR), bits::ERX_P0);
    assert_eq!(reg_value(&chip, reg::SETUP_AW), bits::AW_5_BYTES);
    assert_eq!(reg_value(&chip, reg::RX_PW_P0), 4);

    let config = reg_value(&chip, reg::CONFIG);
    assert_ne!(config & bits::PWR_UP, 0);
    assert_ne!(config & bits::EN_CRC, 0);
}

#[test]
fn configure_writes_addresses_lsb_first() {
    let (_radio, chip) = configured_radio();
    let chip = chip.borrow();
    assert_eq!(chip.tx_addr, [0xE7, 0xD7, 0xC7, 0xB7, 0xA7]);
    assert_eq!(chip.rx_addr_p0, chip.tx_addr);
}

#[test]
fn configure_powers_up_with_settling_delay() {
    let (mut radio, _chip) = new_radio();
    let config = default_radio_config().expect("default config is valid");
    radio.configure(&config).expect("configure on simulated chip");
    let (_, _, _, delay) = radio.release();
    assert!(delay.total_ns >= 1_500_000);
}

#[test]
fn configure_rejects_bad_payload_width() {
    let (mut radio, chip) = new_radio();
    let mut config = default_radio_config().expect("default config is valid");
    config.payload_size = 0;
    assert_eq!(radio.configure(&config), Err(Nrf24Error::InvalidConfig));
    config.payload_size = 33;
    assert_eq!(radio.configure(&config), Err(Nrf24Error::InvalidConfig));
    assert!(chip.borrow().frames.is_empty());
}

#[test]
fn configure_flushes_fifos() {
    let (_radio, chip) = configured_radio();
    let commands = chip.borrow().sent_commands();
    assert!(commands.contains(&cmd::FLUSH_TX));
    assert!(commands.contains(&cmd::FLUSH_RX));
}

#[test]
fn rf_setup_bit_layout() {
    assert_eq!(rf_setup_bits(OutputPower::Minus18Dbm, DataRate::Mbps1), 0x00);
    assert_eq!(rf_setup_bits(OutputPower::ZeroDbm, DataRate::Mbps2), 0x0E);
    assert_eq!(rf_setup_bits(OutputPower::Minus6Dbm, DataRate::Kbps250), 0x24);
}

// ============================================================================
// Readback Tests
// ============================================================================

#[test]
fn readback_matches_default_setup() {
    let (mut radio, _chip) = configured_radio();
    assert_eq!(radio.rf_frequency_mhz(), Ok(2412));
    assert_eq!(radio.output_power(), Ok(OutputPower::Minus18Dbm));
    assert_eq!(radio.data_rate(), Ok(DataRate::Mbps1));
    assert_eq!(radio.tx_address().map(Address::value), Ok(0xA7_B7C7_D7E7));
    assert_eq!(radio.rx_address().map(Address::value), Ok(0xA7_B7C7_D7E7));
    assert_eq!(radio.transfer_size(), Ok(4));
}

#[test]
fn readback_of_custom_setup() {
    let (mut radio, _chip) = new_radio();
    let config = RadioConfig {
        channel: nrf24_link::types::Channel::new(100).expect("valid channel"),
        output_power: OutputPower::ZeroDbm,
        data_rate: DataRate::Kbps250,
        address: Address::DEFAULT,
        payload_size: 8,
    };
    radio.configure(&config).expect("configure on simulated chip");
    assert_eq!(radio.rf_frequency_mhz(), Ok(2500));
    assert_eq!(radio.output_power(), Ok(OutputPower::ZeroDbm));
    assert_eq!(radio.data_rate(), Ok(DataRate::Kbps250));
    assert_eq!(radio.tx_address(), Ok(Address::DEFAULT));
    assert_eq!(radio.transfer_size(), Ok(8));
}

// ============================================================================
// Mode Tests
// ============================================================================

#[test]
fn receive_mode_and_enable() {
    let (mut radio, chip) = configured_radio();
    radio.set_receive_mode().expect("set receive mode");
    radio.enable().expect("enable");

    assert!(radio.is_receive_mode());
    assert!(radio.is_enabled());
    assert_ne!(reg_value(&chip, reg::CONFIG) & bits::PRIM_RX, 0);
    assert!(chip.borrow().ce);
}

#[test]
fn power_down_drops_ce_and_pwr_up() {
    let (mut radio, chip) = configured_radio();
    radio.enable().expect("enable");
    radio.power_down().expect("power down");
    assert!(!chip.borrow().ce);
    assert_eq!(reg_value(&chip, reg::CONFIG) & bits::PWR_UP, 0);
}

#[test]
fn csn_released_after_every_transfer() {
    let (mut radio, chip) = configured_radio();
    let _ = radio.status();
    assert!(!chip.borrow().csn_low);
}

// ============================================================================
// Transmit Tests
// ============================================================================

#[test]
fn send_puts_payload_on_air() {
    let (mut radio, chip) = configured_radio();
    radio.set_receive_mode().expect("set receive mode");
    radio.enable().expect("enable");

    Radio::send(&mut radio, &Payload::new(TEST_PATTERN)).expect("send");

    let chip = chip.borrow();
    assert_eq!(chip.on_air, vec![TEST_PATTERN.to_vec()]);
    assert_eq!(chip.flags & bits::TX_DS, 0, "TX_DS cleared after send");
}

#[test]
fn send_returns_to_receive_mode() {
    let (mut radio, chip) = configured_radio();
    radio.set_receive_mode().expect("set receive mode");
    radio.enable().expect("enable");

    radio.write(&[1, 2, 3, 4]).expect("send");

    assert!(radio.is_receive_mode());
    assert!(radio.is_enabled());
    assert_ne!(reg_value(&chip, reg::CONFIG) & bits::PRIM_RX, 0);
    assert!(chip.borrow().ce);
}

#[test]
fn short_write_is_padded_to_width() {
    let (mut radio, chip) = configured_radio();
    radio.write(&[0xAA]).expect("send");
    assert_eq!(chip.borrow().on_air, vec![vec![0xAA, 0, 0, 0]]);
}

#[test]
fn oversized_write_is_rejected() {
    let (mut radio, chip) = configured_radio();
    assert_eq!(radio.write(&[0; 5]), Err(Nrf24Error::InvalidConfig));
    assert_eq!(radio.write(&[]), Err(Nrf24Error::InvalidConfig));
    assert!(chip.borrow().on_air.is_empty());
}

#[test]
fn dead_transmitter_times_out_and_restores_mode() {
    let (mut radio, chip) = configured_radio();
    radio.set_receive_mode().expect("set receive mode");
    radio.enable().expect("enable");
    chip.borrow_mut().transmitter_dead = true;

    let err = radio.write(&TEST_PATTERN).expect_err("no TX_DS");
    assert_eq!(err, Nrf24Error::TransmitTimeout);
    assert_eq!(err.kind(), RadioErrorKind::TransmitTimeout);

    assert!(radio.is_receive_mode());
    assert!(chip.borrow().ce);
    assert!(chip.borrow().tx_fifo.is_none(), "TX FIFO flushed after timeout");
}

// ============================================================================
// Receive Tests
// ============================================================================

#[test]
fn readable_reflects_rx_fifo() {
    let (mut radio, chip) = configured_radio();
    assert_eq!(radio.readable(), Ok(false));
    chip.borrow_mut().inject(&[5, 6, 7, 8]);
    assert_eq!(radio.readable(), Ok(true));
}

#[test]
fn read_pops_payload_and_clears_rx_dr() {
    let (mut radio, chip) = configured_radio();
    chip.borrow_mut().inject(&[5, 6, 7, 8]);

    let mut buf = [0u8; 4];
    assert_eq!(radio.read(&mut buf), Ok(4));
    assert_eq!(buf, [5, 6, 7, 8]);
    assert_eq!(chip.borrow().flags & bits::RX_DR, 0);
    assert_eq!(radio.readable(), Ok(false));
}

#[test]
fn read_when_empty_returns_zero() {
    let (mut radio, _chip) = configured_radio();
    let mut buf = [0u8; 4];
    assert_eq!(radio.read(&mut buf), Ok(0));
}

#[test]
fn read_into_short_buffer() {
    let (mut radio, chip) = configured_radio();
    chip.borrow_mut().inject(&[1, 2, 3, 4]);
    let mut buf = [0u8; 2];
    assert_eq!(radio.read(&mut buf), Ok(2));
    assert_eq!(buf, [1, 2]);
}

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn spi_failure_maps_to_bus_error() {
    let (mut radio, chip) = configured_radio();
    chip.borrow_mut().spi_broken = true;

    let err = radio.readable().expect_err("broken bus");
    assert_eq!(err, Nrf24Error::Spi(ErrorKind::Other));
    assert_eq!(err.kind(), RadioErrorKind::Bus);
    assert!(!chip.borrow().csn_low, "CSN released after failed transfer");
}

#[test]
fn error_display() {
    let err: Nrf24Error<ErrorKind, Infallible> = Nrf24Error::TransmitTimeout;
    assert_eq!(err.to_string(), "transmit timed out");
}

// ============================================================================
// Scheduler Integration Tests
// ============================================================================

#[test]
fn scheduler_drives_driver_end_to_end() {
    let (radio, chip) = configured_radio();
    let config = LinkConfig {
        send_on_start: false,
        ..LinkConfig::default()
    };
    let mut times = vec![2600u32, 2610].into_iter();
    let mut scheduler = IntervalScheduler::from_config(
        radio,
        move || times.next().expect("clock sequence exhausted"),
        &config,
        EventLog::<8>::new(),
    );
    scheduler.start();

    scheduler.tick();
    assert_eq!(chip.borrow().on_air, vec![TEST_PATTERN.to_vec()]);

    chip.borrow_mut().inject(&[0x10, 0x20, 0x30, 0x40]);
    let outcome = scheduler.tick();
    assert!(outcome.received);

    let events = scheduler.reporter().events();
    assert!(matches!(events[0], LinkEvent::SendAttempted { at_ms: 2600, .. }));
    assert!(matches!(
        events[1],
        LinkEvent::ReceivedPayload { at_ms: 2610, .. }
    ));
}

#[test]
fn scheduler_reports_driver_faults() {
    let (radio, chip) = configured_radio();
    let mut scheduler = IntervalScheduler::from_config(
        radio,
        || 5000u32,
        &LinkConfig::default(),
        EventLog::<8>::new(),
    );
    chip.borrow_mut().transmitter_dead = true;

    scheduler.tick();
    assert_eq!(
        scheduler.reporter().events()[1],
        LinkEvent::RadioError {
            op: RadioOp::Send,
            kind: RadioErrorKind::TransmitTimeout,
        }
    );
}
