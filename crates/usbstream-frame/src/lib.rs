//! Packet boundary reconstruction for UTMI receive streams.
//!
//! A UTMI transceiver reports a received packet only as an `active` level and
//! a per-byte `advance` pulse; nothing marks the first or last byte. This
//! crate rebuilds those boundaries:
//! - [`BoundaryDetector`] delays the stream by one byte so the last byte can be
//!   recognized once no successor arrives, and realigns the `complete` and
//!   `invalid` status strobes to follow that last byte
//! - [`PacketAssembler`] collects the annotated stream into [`Packet`]s
//! - [`TraceReader`] / [`TraceWriter`] move per-step samples through a compact
//!   binary capture format
//!
//! No payload validation happens here: the job is purely structural.

pub mod assembler;
pub mod codec;
pub mod delay;
pub mod detector;
pub mod error;
pub mod reader;
pub mod stream;
pub mod writer;

pub use assembler::{
    AssemblerConfig, Packet, PacketAssembler, PacketStatus, DEFAULT_MAX_PACKET_SIZE,
};
pub use codec::{
    decode_header, decode_sample, encode_header, encode_sample, TraceHeader, HEADER_SIZE, MAGIC,
    SAMPLE_SIZE,
};
pub use delay::{DelayBuffer, StickyFlag};
pub use detector::{
    BoundaryDetector, DetectorConfig, DetectorInput, DetectorOutput, DetectorState,
};
pub use error::{FrameError, Result};
pub use reader::{PacketReader, TraceReader};
pub use stream::{TransmitMonitor, UsbInStream, UsbOutStream};
pub use writer::{synthesize, TraceConfig, TraceWriter, MIN_INTER_PACKET_GAP};
