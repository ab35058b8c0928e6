//! nRF24 Telemetry Link Firmware Library
//!
//! This library provides the core of a minimal point-to-point telemetry
//! link: one node transmits a fixed-size payload over an `nRF24L01+`
//! radio, on a timer or on a button press, while polling for and
//! decoding payloads arriving from its peer.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │     LinkScheduler (Interval | ButtonEdge)  │  Reporter       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      CODEC LAYER                             │
//! │      raw test pattern  │  fixed-point temperature            │
//! ├─────────────────────────────────────────────────────────────┤
//! │                   HAL / DRIVER LAYER                         │
//! │  nRF24L01+ (SPI)  │  Button  │  ADC  │  Uptime clock          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (fixed-period ticker)                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Type-driven design**: Custom types enforce invariants at compile time
//! - **No unsafe in application code**: All unsafe isolated in HAL/FFI layers
//! - **Functional core, imperative shell**: Pure logic separated from I/O
//! - **Nothing fatal**: Radio faults are reported and the loop carries on

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Hardware Abstraction Layer
///
/// STM32 implementations of the link's clock, button and sensor inputs.
#[cfg(feature = "embedded")]
pub mod hal;

/// Peripheral Drivers
///
/// Drivers for external ICs (the `nRF24L01+` radio).
pub mod drivers;

/// Payload Codec
///
/// Conversion between application values and the wire payload.
pub mod codec;

/// Link Control Logic
///
/// The send/receive scheduling loop and its collaborator interfaces.
pub mod link;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
#[cfg(feature = "embedded")]
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::drivers::nrf24::Nrf24;
    pub use crate::hal::adc::SensorAdc;
    pub use crate::hal::gpio::SendButton;
    pub use crate::hal::timer::UptimeClock;
    pub use crate::link::event::{DefmtReporter, LinkEvent, Reporter};
    pub use crate::link::hardware::{
        AnalogTemperatureSensor, ButtonInput, Clock, Radio, TemperatureSensor,
    };
    pub use crate::link::scheduler::{IntervalScheduler, LinkScheduler};

    // Embassy
    pub use embassy_time::{Duration, Instant, Ticker, Timer};

    // Error handling
    pub use core::result::Result;

    // Logging
    pub use defmt::{debug, error, info, trace, warn};
}
