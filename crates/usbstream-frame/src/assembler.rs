use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::detector::DetectorOutput;
use crate::error::{FrameError, Result};

/// Default maximum packet size: PID, a 1024-byte high-speed data payload, CRC16.
pub const DEFAULT_MAX_PACKET_SIZE: usize = 1 + 1024 + 2;

/// Status strobes reported for a packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketStatus {
    /// The transceiver reported the packet as received completely.
    pub complete: bool,
    /// The transceiver reported an error while receiving the packet.
    pub invalid: bool,
}

impl PacketStatus {
    pub const NONE: Self = Self {
        complete: false,
        invalid: false,
    };

    pub const COMPLETE: Self = Self {
        complete: true,
        invalid: false,
    };

    pub const INVALID: Self = Self {
        complete: false,
        invalid: true,
    };
}

/// A reconstructed packet with the status strobes that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Payload elements, first through last.
    pub payload: Bytes,
    /// Status reported on the drain step after the last element.
    pub status: PacketStatus,
}

impl Packet {
    /// Create a packet with no status strobes.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
            status: PacketStatus::NONE,
        }
    }

    pub fn with_status(mut self, status: PacketStatus) -> Self {
        self.status = status;
        self
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Configuration for a [`PacketAssembler`].
#[derive(Debug, Clone)]
pub struct AssemblerConfig {
    /// Maximum packet size in elements. Default: [`DEFAULT_MAX_PACKET_SIZE`].
    pub max_packet_size: usize,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            max_packet_size: DEFAULT_MAX_PACKET_SIZE,
        }
    }
}

/// Collects the detector's annotated stream into whole packets.
///
/// A packet is handed out on the step after its `last` element, once the
/// detector has pulsed (or not) its status strobes.
#[derive(Debug)]
pub struct PacketAssembler {
    current: Option<BytesMut>,
    finished: Option<Bytes>,
    /// Set after an overflow until the oversized packet's `last` element or
    /// the next `first` element.
    discarding: bool,
    config: AssemblerConfig,
}

impl PacketAssembler {
    /// Create an assembler with default configuration.
    pub fn new() -> Self {
        Self::with_config(AssemblerConfig::default())
    }

    /// Create an assembler with explicit configuration.
    pub fn with_config(config: AssemblerConfig) -> Self {
        Self {
            current: None,
            finished: None,
            discarding: false,
            config,
        }
    }

    /// Feed one step of detector output.
    ///
    /// Returns the packet whose drain step this is, if any. `PacketTooLarge`
    /// is reported once per oversized packet; its remaining elements are
    /// dropped silently and assembly resumes at the next `first` element.
    /// `MissingFirst` is reported for every element that belongs to no packet.
    pub fn push(&mut self, out: &DetectorOutput) -> Result<Option<Packet>> {
        let done = self.finished.take().map(|payload| Packet {
            payload,
            status: PacketStatus {
                complete: out.complete,
                invalid: out.invalid,
            },
        });

        if let Some(packet) = &done {
            debug!(
                size = packet.len(),
                complete = packet.status.complete,
                invalid = packet.status.invalid,
                "packet assembled"
            );
        }

        if out.is_emitting() {
            self.accept(out)?;
        }

        Ok(done)
    }

    fn accept(&mut self, out: &DetectorOutput) -> Result<()> {
        if out.first {
            if let Some(partial) = self.current.take() {
                warn!(size = partial.len(), "discarding unterminated packet");
            }
            self.discarding = false;
            self.current = Some(BytesMut::new());
        }

        let Some(current) = self.current.as_mut() else {
            if self.discarding {
                self.discarding = !out.last;
                return Ok(());
            }
            return Err(FrameError::MissingFirst);
        };

        if current.len() >= self.config.max_packet_size {
            let size = current.len() + 1;
            self.current = None;
            self.discarding = !out.last;
            debug!(size, "dropping remainder of oversized packet");
            return Err(FrameError::PacketTooLarge {
                size,
                max: self.config.max_packet_size,
            });
        }

        current.put_u8(out.stream.payload);

        if out.last {
            self.finished = self.current.take().map(BytesMut::freeze);
        }
        Ok(())
    }

    /// True while elements of an unfinished packet are held.
    pub fn in_packet(&self) -> bool {
        self.current.is_some()
    }

    /// True when a finished packet is waiting for its drain step.
    pub fn has_pending(&self) -> bool {
        self.finished.is_some()
    }

    /// True while the rest of an oversized packet is being dropped.
    pub fn is_discarding(&self) -> bool {
        self.discarding
    }
}

impl Default for PacketAssembler {
    fn default() -> Self {
        Self::new()
    }
}
