//! Link Events and Reporting
//!
//! Everything the loop has to say goes out as a [`LinkEvent`] through a
//! [`Reporter`]. On target the reporter logs over defmt; on the host an
//! [`EventLog`] or a closure captures the stream.

use heapless::Vec;

use super::hardware::RadioErrorKind;
use crate::codec::{DecodedValue, Saturation};
use crate::types::Payload;

/// Radio operation that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioOp {
    /// Entering receive mode
    SetReceiveMode,
    /// Enabling the radio
    Enable,
    /// Sending a payload
    Send,
    /// Checking for inbound data
    PollReadable,
    /// Reading inbound data
    Receive,
}

#[cfg(feature = "embedded")]
impl defmt::Format for RadioOp {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SetReceiveMode => defmt::write!(f, "set_receive_mode"),
            Self::Enable => defmt::write!(f, "enable"),
            Self::Send => defmt::write!(f, "send"),
            Self::PollReadable => defmt::write!(f, "poll_readable"),
            Self::Receive => defmt::write!(f, "receive"),
        }
    }
}

/// Structured event emitted by the scheduler
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinkEvent {
    /// A payload is about to be handed to the radio
    SendAttempted {
        /// Loop time of the attempt
        at_ms: u32,
        /// Payload being sent
        payload: Payload,
    },
    /// A full-length payload arrived and was decoded
    ReceivedPayload {
        /// Loop time of the read
        at_ms: u32,
        /// Payload as received
        payload: Payload,
        /// Decoded application value
        value: DecodedValue,
    },
    /// Fewer bytes than a payload were read, decode skipped
    ReceiveTruncated {
        /// Expected payload length
        expected: usize,
        /// Bytes actually read
        actual: usize,
    },
    /// A temperature was out of range and was clamped before sending
    EncodingOverflow {
        /// Value sampled from the sensor
        celsius: f32,
        /// Which extreme it was clamped to
        saturation: Saturation,
    },
    /// A radio operation failed, the loop carries on
    RadioError {
        /// Failed operation
        op: RadioOp,
        /// Error category
        kind: RadioErrorKind,
    },
}

impl LinkEvent {
    /// Check if this event reports a failure or a warning
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(
            self,
            Self::ReceiveTruncated { .. } | Self::EncodingOverflow { .. } | Self::RadioError { .. }
        )
    }
}

/// Sink for link events
pub trait Reporter {
    /// Handle one event
    fn report(&mut self, event: LinkEvent);
}

impl<F: FnMut(LinkEvent)> Reporter for F {
    fn report(&mut self, event: LinkEvent) {
        self(event);
    }
}

/// Fixed-capacity event recorder
///
/// Keeps the first `N` events and counts the ones that did not fit.
#[derive(Clone, Debug, Default)]
pub struct EventLog<const N: usize> {
    events: Vec<LinkEvent, N>,
    dropped: usize,
}

impl<const N: usize> EventLog<N> {
    /// Create an empty log
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Vec::new(),
            dropped: 0,
        }
    }

    /// Recorded events in order
    #[must_use]
    pub fn events(&self) -> &[LinkEvent] {
        &self.events
    }

    /// Number of events that did not fit
    #[must_use]
    pub const fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of send attempts recorded
    #[must_use]
    pub fn sends(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, LinkEvent::SendAttempted { .. }))
            .count()
    }

    /// Clear all recorded events
    pub fn clear(&mut self) {
        self.events.clear();
        self.dropped = 0;
    }
}

impl<const N: usize> Reporter for EventLog<N> {
    fn report(&mut self, event: LinkEvent) {
        if self.events.push(event).is_err() {
            self.dropped += 1;
        }
    }
}

/// Reporter that logs every event over defmt
#[cfg(feature = "embedded")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefmtReporter;

#[cfg(feature = "embedded")]
impl Reporter for DefmtReporter {
    fn report(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::SendAttempted { at_ms, payload } => {
                defmt::info!("Sending ... {} at {}ms", payload, at_ms);
            }
            LinkEvent::ReceivedPayload { at_ms, payload, value } => {
                defmt::info!("Heard at {}ms: {} -> {}", at_ms, payload, value);
            }
            LinkEvent::ReceiveTruncated { expected, actual } => {
                defmt::warn!("Short read: {} of {} bytes", actual, expected);
            }
            LinkEvent::EncodingOverflow { celsius, saturation } => {
                defmt::warn!("Temperature {} out of range, saturated {}", celsius, saturation);
            }
            LinkEvent::RadioError { op, kind } => {
                defmt::error!("Radio {} failed: {}", op, kind);
            }
        }
    }
}
