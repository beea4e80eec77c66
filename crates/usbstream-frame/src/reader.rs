use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

use bytes::BytesMut;
use tracing::debug;

use crate::assembler::{AssemblerConfig, Packet, PacketAssembler};
use crate::codec::{decode_header, decode_sample, TraceHeader};
use crate::detector::{BoundaryDetector, DetectorConfig, DetectorInput};
use crate::error::{FrameError, Result};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Idle steps fed after the trace ends: deactivation, drain, back to idle.
const FLUSH_STEPS: usize = 3;

/// Reads per-step samples from any `Read` stream carrying a binary trace.
///
/// Handles partial reads internally; callers always get whole samples.
/// The first error ends the trace: later reads return `Ok(None)`.
pub struct TraceReader<T> {
    inner: T,
    buf: BytesMut,
    header: Option<TraceHeader>,
    samples: u64,
    failed: bool,
}

impl<T: Read> TraceReader<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            header: None,
            samples: 0,
            failed: false,
        }
    }

    /// Read the next sample (blocking).
    ///
    /// Returns `Ok(None)` once the trace ends on a record boundary, and
    /// `Err(FrameError::TruncatedTrace)` if it ends anywhere else (including
    /// before the header is complete).
    pub fn read_sample(&mut self) -> Result<Option<DetectorInput>> {
        if self.failed {
            return Ok(None);
        }
        let result = self.decode_next();
        if let Err(err) = &result {
            debug!(error = %err, samples = self.samples, "trace reader stopped");
            self.failed = true;
        }
        result
    }

    fn decode_next(&mut self) -> Result<Option<DetectorInput>> {
        loop {
            if self.header.is_none() {
                if let Some(header) = decode_header(&mut self.buf)? {
                    debug!(version = header.version, "trace header");
                    self.header = Some(header);
                    continue;
                }
            } else if let Some(sample) = decode_sample(&mut self.buf)? {
                self.samples += 1;
                return Ok(Some(sample));
            }

            if self.fill()? == 0 {
                if self.header.is_some() && self.buf.is_empty() {
                    return Ok(None);
                }
                return Err(FrameError::TruncatedTrace);
            }
        }
    }

    fn fill(&mut self) -> Result<usize> {
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.inner.read(&mut chunk) {
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// The header, once it has been read.
    pub fn header(&self) -> Option<&TraceHeader> {
        self.header.as_ref()
    }

    /// Number of samples read so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// True once a read has failed; the reader yields nothing further.
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for TraceReader<T> {
    type Item = Result<DetectorInput>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_sample().transpose()
    }
}

impl<T: Read> FusedIterator for TraceReader<T> {}

/// Reconstructs packets from a binary trace.
///
/// Runs every sample through a [`BoundaryDetector`] and a [`PacketAssembler`].
/// When the trace ends the detector is flushed with idle steps, so a packet
/// still active on the last sample is delivered too.
///
/// Errors in the trace itself end the stream. Assembly errors such as
/// `PacketTooLarge` do not: reading continues with the next packet.
pub struct PacketReader<T> {
    trace: TraceReader<T>,
    detector: BoundaryDetector,
    assembler: PacketAssembler,
    flushed: usize,
}

impl<T: Read> PacketReader<T> {
    /// Create a packet reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, DetectorConfig::default(), AssemblerConfig::default())
    }

    /// Create a packet reader with explicit configuration.
    pub fn with_config(inner: T, detector: DetectorConfig, assembler: AssemblerConfig) -> Self {
        Self {
            trace: TraceReader::new(inner),
            detector: BoundaryDetector::with_config(detector),
            assembler: PacketAssembler::with_config(assembler),
            flushed: 0,
        }
    }

    /// Read the next reconstructed packet (blocking).
    ///
    /// Returns `Ok(None)` once the trace is exhausted and the detector has
    /// drained.
    pub fn read_packet(&mut self) -> Result<Option<Packet>> {
        loop {
            if self.trace.is_failed() {
                return Ok(None);
            }
            let input = match self.trace.read_sample()? {
                Some(sample) => sample,
                None if self.flushed < FLUSH_STEPS => {
                    self.flushed += 1;
                    DetectorInput::idle()
                }
                None => return Ok(None),
            };

            let out = self.detector.step(&input);
            if let Some(packet) = self.assembler.push(&out)? {
                return Ok(Some(packet));
            }
        }
    }

    /// Number of trace samples consumed so far.
    pub fn samples(&self) -> u64 {
        self.trace.samples()
    }

    /// The detector driven by this reader.
    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.trace.into_inner()
    }
}

impl<T: Read> Iterator for PacketReader<T> {
    type Item = Result<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_packet().transpose()
    }
}

impl<T: Read> FusedIterator for PacketReader<T> {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BufMut;

    use super::*;
    use crate::assembler::PacketStatus;
    use crate::codec::{encode_header, encode_sample};

    fn trace(samples: &[DetectorInput]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        encode_header(&mut wire);
        for sample in samples {
            encode_sample(sample, &mut wire);
        }
        wire.to_vec()
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }

    #[test]
    fn read_samples_in_order() {
        let samples = [
            DetectorInput::byte(0x01),
            DetectorInput::stall(),
            DetectorInput::idle().with_complete(true),
        ];
        let mut reader = TraceReader::new(Cursor::new(trace(&samples)));

        assert_eq!(reader.read_sample().unwrap(), Some(samples[0]));
        assert!(reader.header().is_some());
        assert_eq!(reader.read_sample().unwrap(), Some(samples[1]));
        assert_eq!(reader.read_sample().unwrap(), Some(samples[2]));
        assert_eq!(reader.read_sample().unwrap(), None);
        assert_eq!(reader.samples(), 3);
    }

    #[test]
    fn header_only_trace_is_empty() {
        let mut reader = TraceReader::new(Cursor::new(trace(&[])));
        assert_eq!(reader.read_sample().unwrap(), None);
    }

    #[test]
    fn empty_input_is_truncated() {
        let mut reader = TraceReader::new(Cursor::new(Vec::<u8>::new()));
        assert!(matches!(
            reader.read_sample(),
            Err(FrameError::TruncatedTrace)
        ));
    }

    #[test]
    fn record_cut_in_half_is_truncated() {
        let mut wire = trace(&[DetectorInput::byte(0x01)]);
        wire.push(0x03);

        let mut reader = TraceReader::new(Cursor::new(wire));
        assert!(reader.read_sample().unwrap().is_some());
        assert!(matches!(
            reader.read_sample(),
            Err(FrameError::TruncatedTrace)
        ));
    }

    #[test]
    fn bad_magic_is_reported() {
        let mut reader = TraceReader::new(Cursor::new(vec![0x00, 0x01, 0x01, 0x08]));
        assert!(matches!(reader.read_sample(), Err(FrameError::InvalidMagic)));
    }

    #[test]
    fn partial_read_handling() {
        let samples = [DetectorInput::byte(0x7E), DetectorInput::idle()];
        let reader = ByteByByteReader {
            bytes: trace(&samples),
            pos: 0,
        };
        let collected: Vec<_> = TraceReader::new(reader)
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(collected, samples.to_vec());
    }

    #[test]
    fn interrupted_read_retries() {
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(trace(&[DetectorInput::byte(0x11)])),
        };
        let mut reader = TraceReader::new(reader);
        assert_eq!(reader.read_sample().unwrap(), Some(DetectorInput::byte(0x11)));
    }

    #[test]
    fn packets_from_trace() {
        let samples = [
            DetectorInput::byte(0xAA),
            DetectorInput::byte(0xBB),
            DetectorInput::byte(0xCC).with_complete(true),
            DetectorInput::idle(),
            DetectorInput::idle(),
            DetectorInput::byte(0x01),
            DetectorInput::idle(),
            DetectorInput::idle(),
        ];
        let reader = PacketReader::new(Cursor::new(trace(&samples)));
        let packets: Vec<_> = reader.collect::<Result<_>>().unwrap();

        assert_eq!(
            packets,
            vec![
                Packet::new(vec![0xAA, 0xBB, 0xCC]).with_status(PacketStatus::COMPLETE),
                Packet::new(vec![0x01]),
            ]
        );
    }

    #[test]
    fn packet_active_at_end_of_trace_is_flushed() {
        let samples = [DetectorInput::byte(0x10), DetectorInput::byte(0x20)];
        let mut reader = PacketReader::new(Cursor::new(trace(&samples)));

        let packet = reader.read_packet().unwrap().unwrap();
        assert_eq!(packet.payload.as_ref(), &[0x10, 0x20]);
        assert!(reader.read_packet().unwrap().is_none());
        assert!(reader.detector().is_idle());
        assert_eq!(reader.samples(), 2);
    }

    #[test]
    fn oversized_packet_in_trace() {
        let samples: Vec<_> = (0..8u8).map(DetectorInput::byte).collect();
        let mut reader = PacketReader::with_config(
            Cursor::new(trace(&samples)),
            DetectorConfig::default(),
            AssemblerConfig { max_packet_size: 4 },
        );
        assert!(matches!(
            reader.read_packet(),
            Err(FrameError::PacketTooLarge { size: 5, max: 4 })
        ));
    }

    #[test]
    fn trace_iteration_stops_after_error() {
        let mut wire = BytesMut::from(trace(&[DetectorInput::byte(0x01)]).as_slice());
        wire.put_u8(0x80);
        wire.put_u8(0x00);
        encode_sample(&DetectorInput::idle(), &mut wire);

        let items: Vec<_> = TraceReader::new(Cursor::new(wire.to_vec())).take(50).collect();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap(), &DetectorInput::byte(0x01));
        assert!(matches!(items[1], Err(FrameError::ReservedFlags(0x80))));
    }

    #[test]
    fn skipping_errors_terminates() {
        let mut wire = BytesMut::from(trace(&[]).as_slice());
        wire.put_u8(0x80);
        wire.put_u8(0x00);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));
        let items: Vec<_> = reader.by_ref().take(50).collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].is_err());

        let packets: Vec<Packet> = reader.filter_map(|item| item.ok()).collect();
        assert!(packets.is_empty());
    }

    #[test]
    fn oversized_packet_reports_once_and_reading_continues() {
        let mut samples: Vec<_> = (0..8u8).map(DetectorInput::byte).collect();
        samples.extend([DetectorInput::idle(), DetectorInput::idle()]);
        samples.push(DetectorInput::byte(0x42));

        let reader = PacketReader::with_config(
            Cursor::new(trace(&samples)),
            DetectorConfig::default(),
            AssemblerConfig { max_packet_size: 4 },
        );
        let items: Vec<_> = reader.collect();

        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[0],
            Err(FrameError::PacketTooLarge { size: 5, max: 4 })
        ));
        assert_eq!(items[1].as_ref().unwrap(), &Packet::new(vec![0x42]));
    }

    #[test]
    fn into_inner_returns_consumed_stream() {
        let wire = trace(&[DetectorInput::byte(0x01)]);
        let len = wire.len() as u64;
        let mut reader = PacketReader::new(Cursor::new(wire));
        assert!(reader.read_packet().unwrap().is_some());
        assert_eq!(reader.into_inner().position(), len);
    }

    #[test]
    fn reserved_flags_in_trace() {
        let mut wire = BytesMut::from(trace(&[]).as_slice());
        wire.put_u8(0x80);
        wire.put_u8(0x00);

        let mut reader = PacketReader::new(Cursor::new(wire.to_vec()));
        assert!(matches!(
            reader.read_packet(),
            Err(FrameError::ReservedFlags(0x80))
        ));
    }
}
