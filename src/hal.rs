//! Hardware Abstraction Layer
//!
//! Provides safe abstractions over STM32G474 peripherals.
//! This module isolates hardware-specific code and implements the
//! link's collaborator traits on top of embassy-stm32.

pub mod adc;
pub mod gpio;
pub mod timer;
