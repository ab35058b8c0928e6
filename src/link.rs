//! Link Control Logic
//!
//! The cooperative send/receive loop and the collaborator interfaces it
//! is driven through. Everything here is hardware independent; the
//! embedded build plugs the STM32 and nRF24L01+ implementations in.

pub mod event;
pub mod hardware;
pub mod scheduler;
pub mod trigger;
