use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::assembler::{Packet, PacketStatus};
use crate::codec::{encode_header, encode_sample, HEADER_SIZE};
use crate::detector::DetectorInput;
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;

/// Fewest inactive steps that must follow a packet before the next one starts.
///
/// The detector needs one step to see `active` drop and one drain step; an
/// element arriving on the drain step is not captured.
pub const MIN_INTER_PACKET_GAP: usize = 2;

/// Shape of the receive waveform synthesized for each packet.
#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Inactive steps after each packet. Default: [`MIN_INTER_PACKET_GAP`].
    pub inter_packet_gap: usize,
    /// Active steps without a new element between consecutive elements.
    /// Default: 0.
    pub stall_steps: usize,
}

impl TraceConfig {
    /// Check that packets synthesized with this configuration stay separable.
    pub fn validate(&self) -> Result<()> {
        if self.inter_packet_gap < MIN_INTER_PACKET_GAP {
            return Err(FrameError::GapTooShort {
                gap: self.inter_packet_gap,
                min: MIN_INTER_PACKET_GAP,
            });
        }
        Ok(())
    }
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            inter_packet_gap: MIN_INTER_PACKET_GAP,
            stall_steps: 0,
        }
    }
}

/// Expand one packet into the per-step samples a transceiver would produce.
///
/// One advancing step per element, `stall_steps` quiet steps between
/// elements, status levels raised on the step of the last element, then
/// `inter_packet_gap` idle steps.
///
/// The detector ignores status on the step that captures a packet's first
/// element, so a single-element packet carries its status on an extra stall
/// step instead.
fn packet_samples(
    packet: &Packet,
    config: &TraceConfig,
    out: &mut Vec<DetectorInput>,
) -> Result<()> {
    if packet.is_empty() {
        return Err(FrameError::EmptyPacket);
    }

    let last = packet.len() - 1;
    for (i, &byte) in packet.payload.iter().enumerate() {
        if i > 0 {
            out.extend(std::iter::repeat_n(DetectorInput::stall(), config.stall_steps));
        }
        out.push(DetectorInput::byte(byte));
    }

    if packet.status != PacketStatus::NONE {
        if last == 0 {
            out.push(DetectorInput::stall());
        }
        if let Some(sample) = out.last_mut() {
            sample.complete = packet.status.complete;
            sample.invalid = packet.status.invalid;
        }
    }

    out.extend(std::iter::repeat_n(DetectorInput::idle(), config.inter_packet_gap));
    Ok(())
}

/// Synthesize the receive waveform for a sequence of packets.
pub fn synthesize(packets: &[Packet], config: &TraceConfig) -> Result<Vec<DetectorInput>> {
    config.validate()?;

    let mut samples = Vec::new();
    for packet in packets {
        packet_samples(packet, config, &mut samples)?;
    }
    Ok(samples)
}

/// Writes a binary trace to any `Write` stream.
///
/// The header is written ahead of the first sample.
pub struct TraceWriter<T> {
    inner: T,
    buf: BytesMut,
    config: TraceConfig,
    /// Header bytes already accepted by the stream.
    header_offset: usize,
    samples: u64,
}

impl<T: Write> TraceWriter<T> {
    /// Create a trace writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, TraceConfig::default())
    }

    /// Create a trace writer with explicit configuration.
    pub fn with_config(inner: T, config: TraceConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            header_offset: 0,
            samples: 0,
        }
    }

    /// Write one clock step.
    pub fn write_sample(&mut self, sample: &DetectorInput) -> Result<()> {
        self.write_samples(std::slice::from_ref(sample))
    }

    /// Write the waveform for one packet, followed by the inter-packet gap.
    pub fn write_packet(&mut self, packet: &Packet) -> Result<()> {
        self.config.validate()?;

        let mut samples = Vec::with_capacity(packet.len() + self.config.inter_packet_gap);
        packet_samples(packet, &self.config, &mut samples)?;
        self.write_samples(&samples)
    }

    /// Write `steps` idle steps.
    pub fn write_idle(&mut self, steps: usize) -> Result<()> {
        self.write_samples(&vec![DetectorInput::idle(); steps])
    }

    /// Write the header, if not yet written, and flush.
    pub fn finish(&mut self) -> Result<()> {
        self.write_samples(&[])?;
        self.flush()
    }

    /// A header cut short by a failed write is resumed, not repeated, on the
    /// next call.
    fn write_samples(&mut self, samples: &[DetectorInput]) -> Result<()> {
        self.buf.clear();
        let header_pending = self.header_offset < HEADER_SIZE;
        let mut offset = 0usize;
        if header_pending {
            encode_header(&mut self.buf);
            offset = self.header_offset;
        }
        for sample in samples {
            encode_sample(sample, &mut self.buf);
        }

        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => {
                    offset += n;
                    if header_pending {
                        self.header_offset = offset.min(HEADER_SIZE);
                    }
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.samples += samples.len() as u64;
        Ok(())
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Number of samples written so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
