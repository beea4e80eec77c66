use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use usbstream_utmi::{ClockDomain, Clocked, UtmiReceive};

use crate::delay::{DelayBuffer, StickyFlag};
use crate::stream::UsbOutStream;

/// Signals sampled by the detector on each clock step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorInput {
    /// The unprocessed receive stream.
    #[serde(flatten)]
    pub stream: UsbOutStream,
    /// RxComplete-style status level.
    pub complete: bool,
    /// RxInvalid-style status level.
    pub invalid: bool,
}

impl DetectorInput {
    /// No packet in progress.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A new payload element of the current packet.
    pub fn byte(payload: u8) -> Self {
        Self::from_utmi(&UtmiReceive::byte(payload))
    }

    /// Packet in progress, no new element this step.
    pub fn stall() -> Self {
        Self::from_utmi(&UtmiReceive::stall())
    }

    /// Sample the stream from a UTMI receive interface, with both status levels low.
    pub fn from_utmi(rx: &UtmiReceive) -> Self {
        Self {
            stream: UsbOutStream::bridge_from(rx),
            ..Self::default()
        }
    }

    pub fn with_complete(mut self, complete: bool) -> Self {
        self.complete = complete;
        self
    }

    pub fn with_invalid(mut self, invalid: bool) -> Self {
        self.invalid = invalid;
        self
    }
}

/// Registered detector outputs, as they stand after a clock step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorOutput {
    /// The processed stream, one element behind the input.
    #[serde(flatten)]
    pub stream: UsbOutStream,
    /// The element on `stream` opens its packet. Valid only with `advance`.
    pub first: bool,
    /// The element on `stream` closes its packet. Valid only with `advance`.
    pub last: bool,
    /// One-step pulse after `last` if `complete` was seen during the packet.
    pub complete: bool,
    /// One-step pulse after `last` if `invalid` was seen during the packet.
    pub invalid: bool,
}

impl DetectorOutput {
    /// True when this step emits a payload element.
    pub fn is_emitting(&self) -> bool {
        self.stream.advance
    }
}

/// Boundary detector states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorState {
    /// Waiting for the first element of a packet.
    #[default]
    Idle,
    /// Re-emitting each element one advance behind the input.
    Streaming,
    /// One quiet step after the last element; status strobes go out.
    Drain,
}

impl fmt::Display for DetectorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DetectorState::Idle => "idle",
            DetectorState::Streaming => "streaming",
            DetectorState::Drain => "drain",
        };
        f.write_str(name)
    }
}

/// Configuration for a [`BoundaryDetector`].
#[derive(Debug, Clone, Default)]
pub struct DetectorConfig {
    /// Clock domain the detector and its signals belong to. Default: `usb`.
    pub domain: ClockDomain,
}

/// Infers packet boundaries on a UTMI receive stream.
///
/// UTMI does not mark the last byte of a packet; a byte is known to be last
/// only once `active` drops without another byte following it. The detector
/// therefore holds one element back:
///
/// ```text
/// step       0    1    2    3    4    5      6
/// in         AA   BB   CC   DD   --   --     --
/// out             AA   BB   CC   DD
/// first           1
/// last                           1
/// strobes                             pulse
/// state   I    S    S    S    S    D      I
/// ```
///
/// `complete` and `invalid` levels are ORed across the packet and pulsed once
/// on the drain step, so they always follow the packet's last element.
/// Outputs the current state does not drive keep their previous value.
#[derive(Debug)]
pub struct BoundaryDetector {
    state: DetectorState,
    buffer: DelayBuffer<u8>,
    complete: StickyFlag,
    invalid: StickyFlag,
    out: DetectorOutput,
    domain: ClockDomain,
    steps: u64,
}

impl BoundaryDetector {
    /// Create a detector in the default `usb` domain.
    pub fn new() -> Self {
        Self::with_config(DetectorConfig::default())
    }

    /// Create a detector with explicit configuration.
    pub fn with_config(config: DetectorConfig) -> Self {
        Self {
            state: DetectorState::Idle,
            buffer: DelayBuffer::new(),
            complete: StickyFlag::default(),
            invalid: StickyFlag::default(),
            out: DetectorOutput::default(),
            domain: config.domain,
            steps: 0,
        }
    }

    /// Create a detector clocked from `domain`.
    pub fn in_domain(domain: ClockDomain) -> Self {
        Self::with_config(DetectorConfig { domain })
    }

    /// Evaluate one clock step and return the registered outputs.
    pub fn step(&mut self, input: &DetectorInput) -> DetectorOutput {
        let rx = input.stream;

        let next = match self.state {
            DetectorState::Idle => {
                self.out.stream.active = false;
                self.out.stream.advance = false;
                self.out.first = false;
                self.out.last = false;

                self.complete.clear();
                self.invalid.clear();
                self.out.complete = false;
                self.out.invalid = false;

                if rx.is_advancing() {
                    self.buffer.capture(rx.payload, true);
                    debug!(domain = %self.domain, step = self.steps, "packet start");
                    DetectorState::Streaming
                } else {
                    DetectorState::Idle
                }
            }

            DetectorState::Streaming => {
                self.out.stream.active = true;
                self.out.stream.advance = false;

                // Hold status until the processed stream has drained.
                self.complete.accumulate(input.complete);
                self.invalid.accumulate(input.invalid);

                if rx.is_advancing() {
                    self.emit_buffered();
                    self.buffer.capture(rx.payload, false);
                }

                if !rx.active {
                    self.emit_buffered();
                    self.out.last = true;
                    DetectorState::Drain
                } else {
                    DetectorState::Streaming
                }
            }

            DetectorState::Drain => {
                self.out.stream.advance = false;
                self.out.first = false;
                self.out.last = false;

                self.out.complete = self.complete.take();
                self.out.invalid = self.invalid.take();
                self.buffer.reset();

                debug!(
                    domain = %self.domain,
                    step = self.steps,
                    complete = self.out.complete,
                    invalid = self.out.invalid,
                    "packet end"
                );
                DetectorState::Idle
            }
        };

        trace!(
            domain = %self.domain,
            step = self.steps,
            from = %self.state,
            to = %next,
            "detector step"
        );

        self.state = next;
        self.steps += 1;
        self.out
    }

    fn emit_buffered(&mut self) {
        self.out.stream.payload = self.buffer.payload();
        self.out.stream.advance = true;
        self.out.first = self.buffer.is_first();
    }

    /// Current state.
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// True when no packet is buffered or draining.
    pub fn is_idle(&self) -> bool {
        self.state == DetectorState::Idle
    }

    /// Outputs registered by the most recent step.
    pub fn output(&self) -> &DetectorOutput {
        &self.out
    }

    /// Number of steps evaluated since creation or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn domain(&self) -> &ClockDomain {
        &self.domain
    }

    /// Return to the power-on state, discarding any buffered packet.
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.buffer.reset();
        self.complete.clear();
        self.invalid.clear();
        self.out = DetectorOutput::default();
        self.steps = 0;
    }
}

impl Default for BoundaryDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Clocked for BoundaryDetector {
    type Input = DetectorInput;
    type Output = DetectorOutput;

    fn step(&mut self, input: &DetectorInput) -> DetectorOutput {
        BoundaryDetector::step(self, input)
    }

    fn domain(&self) -> &ClockDomain {
        &self.domain
    }
}
