//! nRF24 Link Main Application
//!
//! Entry point for the point-to-point telemetry link firmware.
//! Initializes the radio and inputs, prints the setup banner, then
//! drives the link scheduler from a fixed-period ticker forever.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_stm32::adc::AdcChannel;
use embassy_stm32::gpio::{Input, Level, Output, Pull, Speed};
use embassy_stm32::spi::{self, Spi};
use embassy_stm32::time::Hertz;
use embassy_time::Delay;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use {defmt_rtt as _, panic_probe as _};

use nrf24_link::prelude::*;

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("########################################");
    info!("{} {} {}", FIRMWARE_NAME, VERSION_NUMBER, VERSION_DATE);
    info!("Crate version {}", env!("CARGO_PKG_VERSION"));
    info!("########################################");

    // Initialize STM32G474 peripherals with default clock configuration
    let config = embassy_stm32::Config::default();
    let p = embassy_stm32::init(config);

    // SPI1 to the radio: PB3 = SCK, PB5 = MOSI, PB4 = MISO
    let mut spi_config = spi::Config::default();
    spi_config.frequency = Hertz(1_000_000);
    let spi = Spi::new_blocking(p.SPI1, p.PB3, p.PB5, p.PB4, spi_config);
    let csn = Output::new(p.PB10, Level::High, Speed::VeryHigh);
    let ce = Output::new(p.PA8, Level::Low, Speed::VeryHigh);
    let mut radio = Nrf24::new(spi, csn, ce, Delay);

    let link = LinkConfig::default();
    match link.validate() {
        Ok(radio_config) => {
            if let Err(e) = radio.configure(&radio_config) {
                error!("Radio configuration failed: {}", e);
            }
        }
        Err(e) => error!("Invalid link configuration: {}", e),
    }

    print_radio_setup(&mut radio, &link);
    print_unique_id();

    match link.mode {
        LinkMode::Interval => {
            let scheduler = LinkScheduler::from_config(radio, UptimeClock::new(), &link, DefmtReporter);
            run(scheduler).await
        }
        LinkMode::ButtonEdge => {
            let button = SendButton::active_low(Input::new(p.PA0, Pull::Up));
            let adc = SensorAdc::new(p.ADC1, p.PA1.degrade_adc());
            let sensor = AnalogTemperatureSensor::new(adc);
            let scheduler =
                LinkScheduler::button_edge(radio, UptimeClock::new(), button, sensor, DefmtReporter);
            run(scheduler).await
        }
    }
}

/// Start the radio and run the loop forever
async fn run<R, C, B, S, P>(mut scheduler: LinkScheduler<R, C, B, S, P>) -> !
where
    R: Radio,
    C: Clock,
    B: ButtonInput,
    S: TemperatureSensor,
    P: Reporter,
{
    scheduler.start();
    info!("Link running, {} mode", LINK_MODE);

    let mut ticker = Ticker::every(Duration::from_millis(TICK_PERIOD_MS));
    loop {
        scheduler.tick();
        ticker.next().await;
    }
}

/// Show the radio setup as read back from the chip
fn print_radio_setup<SPI, CSN, CE, D>(radio: &mut Nrf24<SPI, CSN, CE, D>, link: &LinkConfig)
where
    SPI: SpiBus,
    CSN: OutputPin,
    CE: OutputPin<Error = CSN::Error>,
    D: DelayNs,
{
    match radio.rf_frequency_mhz() {
        Ok(mhz) => info!("Frequency    : {}MHz", mhz),
        Err(e) => warn!("Frequency    : {}", e),
    }
    match radio.output_power() {
        Ok(power) => info!("Output power : {}", power),
        Err(e) => warn!("Output power : {}", e),
    }
    match radio.data_rate() {
        Ok(rate) => info!("Data Rate    : {}", rate),
        Err(e) => warn!("Data Rate    : {}", e),
    }
    match radio.tx_address() {
        Ok(addr) => info!("Tx Address   : {}", addr),
        Err(e) => warn!("Tx Address   : {}", e),
    }
    match radio.rx_address() {
        Ok(addr) => info!("Rx Address   : {}", addr),
        Err(e) => warn!("Rx Address   : {}", e),
    }
    info!("Radio pins   : CSN {} CE {} IRQ {}", pins::RADIO_CSN, pins::RADIO_CE, pins::RADIO_IRQ);
    info!("Transfer Size: {}Bytes", link.payload_size);
    info!("Interval     : {}ms", link.send_interval_ms);
}

/// Each STM32 has a unique 96-bit number, useful for telling nodes apart
fn print_unique_id() {
    let uid = embassy_stm32::uid::uid();
    let word = |i: usize| u32::from_le_bytes([uid[i], uid[i + 1], uid[i + 2], uid[i + 3]]);
    info!("Unique Id    : 0x{:X} 0x{:X} 0x{:X}", word(0), word(4), word(8));
}
