//! Link Scheduler
//!
//! Single-threaded cooperative loop that owns transmit timing and drains
//! inbound payloads. [`LinkScheduler::tick`] runs one bounded iteration;
//! the caller invokes it repeatedly (on target, from a fixed-period
//! ticker).
//!
//! Each tick, independently:
//!
//! 1. send phase: decide by policy whether to transmit, encode, send
//! 2. receive phase: if the radio is readable, read one payload, decode
//!    and report it
//!
//! No error is fatal. Radio failures, short reads and clamped
//! temperatures are reported and the loop carries on with no retry.

use core::convert::Infallible;

use super::event::{LinkEvent, RadioOp, Reporter};
use super::hardware::{ButtonInput, Clock, Radio, RadioError, TemperatureSensor};
use super::trigger::{Edge, EdgeDetector, IntervalTimer};
use crate::codec::{self, DecodedValue};
use crate::config::{LinkConfig, PAYLOAD_LEN};
use crate::types::Payload;

/// Scheduling policy, selected at construction
#[derive(Debug)]
pub enum Policy<B, S> {
    /// Send a fixed pattern whenever the interval has elapsed
    Interval {
        /// Interval timer
        timer: IntervalTimer,
        /// Pattern to send
        pattern: Payload,
    },
    /// Send a temperature reading on each button press
    ButtonEdge {
        /// Send button
        button: B,
        /// Temperature source
        sensor: S,
        /// Press/release detector
        edge: EdgeDetector,
    },
}

impl<B, S> Policy<B, S> {
    /// Decode a received payload the way this policy's peer encodes it
    fn decode(&self, payload: &Payload) -> DecodedValue {
        match self {
            Self::Interval { .. } => DecodedValue::Raw(codec::decode_raw(payload)),
            Self::ButtonEdge { .. } => DecodedValue::Temperature(codec::decode_temperature(payload)),
        }
    }
}

/// What one tick did
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// A send was attempted
    pub sent: bool,
    /// A full payload was received and decoded
    pub received: bool,
}

/// Cooperative send/receive loop
pub struct LinkScheduler<R, C, B, S, P> {
    radio: R,
    clock: C,
    policy: Policy<B, S>,
    reporter: P,
}

/// Scheduler running the interval policy (no button or sensor)
pub type IntervalScheduler<R, C, P> = LinkScheduler<R, C, Infallible, Infallible, P>;

impl<R, C, P> LinkScheduler<R, C, Infallible, Infallible, P>
where
    R: Radio,
    C: Clock,
    P: Reporter,
{
    /// Create an interval-mode scheduler
    #[must_use]
    pub fn interval(radio: R, clock: C, timer: IntervalTimer, pattern: Payload, reporter: P) -> Self {
        Self {
            radio,
            clock,
            policy: Policy::Interval { timer, pattern },
            reporter,
        }
    }

    /// Create an interval-mode scheduler from a link configuration
    ///
    /// Uses the interval, start behavior and pattern of `config`. The
    /// policy is always Interval; `config.mode` is not consulted, the
    /// caller picks between this and [`LinkScheduler::button_edge`].
    #[must_use]
    pub fn from_config(radio: R, clock: C, config: &LinkConfig, reporter: P) -> Self {
        let timer = if config.send_on_start {
            IntervalTimer::primed(config.send_interval_ms)
        } else {
            IntervalTimer::new(config.send_interval_ms)
        };
        Self::interval(radio, clock, timer, codec::encode_raw(&config.test_pattern), reporter)
    }
}

impl<R, C, B, S, P> LinkScheduler<R, C, B, S, P>
where
    R: Radio,
    C: Clock,
    B: ButtonInput,
    S: TemperatureSensor,
    P: Reporter,
{
    /// Create a button-edge-mode scheduler
    #[must_use]
    pub fn button_edge(radio: R, clock: C, button: B, sensor: S, reporter: P) -> Self {
        Self {
            radio,
            clock,
            policy: Policy::ButtonEdge {
                button,
                sensor,
                edge: EdgeDetector::new(),
            },
            reporter,
        }
    }

    /// Put the radio in receive mode and enable it
    ///
    /// Failures are reported; the loop can still be run.
    pub fn start(&mut self) {
        if let Err(e) = self.radio.set_receive_mode() {
            self.radio_error(RadioOp::SetReceiveMode, &e);
        }
        if let Err(e) = self.radio.enable() {
            self.radio_error(RadioOp::Enable, &e);
        }
    }

    /// Run one loop iteration
    pub fn tick(&mut self) -> TickOutcome {
        let now_ms = self.clock.now_ms();
        let sent = self.send_phase(now_ms);
        let received = self.receive_phase(now_ms);
        TickOutcome { sent, received }
    }

    fn send_phase(&mut self, now_ms: u32) -> bool {
        let payload = match &mut self.policy {
            Policy::Interval { timer, pattern } => {
                // Mark before sending: a failed send is not retried
                if !timer.poll(now_ms) {
                    return false;
                }
                *pattern
            }
            Policy::ButtonEdge { button, sensor, edge } => {
                match edge.update(button.is_pressed()) {
                    Some(Edge::Rising) => {}
                    Some(Edge::Falling) | None => return false,
                }
                let celsius = sensor.read_celsius();
                let encoded = codec::encode_temperature(celsius);
                if let Some(saturation) = encoded.saturation {
                    self.reporter.report(LinkEvent::EncodingOverflow { celsius, saturation });
                }
                encoded.payload
            }
        };

        self.reporter.report(LinkEvent::SendAttempted { at_ms: now_ms, payload });
        if let Err(e) = self.radio.send(&payload) {
            self.radio_error(RadioOp::Send, &e);
        }
        true
    }

    fn receive_phase(&mut self, now_ms: u32) -> bool {
        match self.radio.poll_readable() {
            Ok(true) => {}
            Ok(false) => return false,
            Err(e) => {
                self.radio_error(RadioOp::PollReadable, &e);
                return false;
            }
        }

        let mut buf = [0u8; PAYLOAD_LEN];
        let count = match self.radio.receive(&mut buf) {
            Ok(count) => count.min(PAYLOAD_LEN),
            Err(e) => {
                self.radio_error(RadioOp::Receive, &e);
                return false;
            }
        };

        let Some(payload) = Payload::from_slice(&buf[..count]) else {
            self.reporter.report(LinkEvent::ReceiveTruncated {
                expected: PAYLOAD_LEN,
                actual: count,
            });
            return false;
        };

        let value = self.policy.decode(&payload);
        self.reporter.report(LinkEvent::ReceivedPayload {
            at_ms: now_ms,
            payload,
            value,
        });
        true
    }

    fn radio_error(&mut self, op: RadioOp, error: &R::Error) {
        self.reporter.report(LinkEvent::RadioError { op, kind: error.kind() });
    }
}

impl<R, C, B, S, P> LinkScheduler<R, C, B, S, P> {
    /// Get the radio
    #[must_use]
    pub const fn radio(&self) -> &R {
        &self.radio
    }

    /// Get the radio mutably
    pub fn radio_mut(&mut self) -> &mut R {
        &mut self.radio
    }

    /// Get the reporter
    #[must_use]
    pub const fn reporter(&self) -> &P {
        &self.reporter
    }

    /// Get the reporter mutably
    pub fn reporter_mut(&mut self) -> &mut P {
        &mut self.reporter
    }

    /// Get the active policy
    #[must_use]
    pub const fn policy(&self) -> &Policy<B, S> {
        &self.policy
    }

    /// Get the clock mutably
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Take the scheduler apart
    pub fn into_parts(self) -> (R, C, Policy<B, S>, P) {
        (self.radio, self.clock, self.policy, self.reporter)
    }
}
