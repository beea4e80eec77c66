use bytes::{Buf, BufMut, BytesMut};

use crate::detector::DetectorInput;
use crate::error::{FrameError, Result};
use crate::stream::UsbOutStream;

/// Trace header: magic (2) + version (1) + payload width (1) = 4 bytes.
pub const HEADER_SIZE: usize = 4;

/// Sample record: flags (1) + payload (1) = 2 bytes.
pub const SAMPLE_SIZE: usize = 2;

/// Magic bytes: "US" (0x55 0x53).
pub const MAGIC: [u8; 2] = [0x55, 0x53];

/// Current trace format revision.
pub const VERSION: u8 = 1;

/// Payload width carried by this format, in bits.
pub const PAYLOAD_WIDTH: u8 = 8;

const FLAG_ACTIVE: u8 = 1 << 0;
const FLAG_ADVANCE: u8 = 1 << 1;
const FLAG_COMPLETE: u8 = 1 << 2;
const FLAG_INVALID: u8 = 1 << 3;
const FLAG_RESERVED: u8 = 0xF0;

/// Decoded trace header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceHeader {
    pub version: u8,
    pub payload_width: u8,
}

/// Encode the trace header.
///
/// Wire format:
/// ```text
/// ┌──────────────┬─────────┬─────────┐
/// │ Magic (2B)   │ Version │ Width   │
/// │ 0x55 0x53    │ (1B)    │ (1B)    │
/// │ "US"         │ 1       │ 8       │
/// └──────────────┴─────────┴─────────┘
/// ```
pub fn encode_header(dst: &mut BytesMut) {
    dst.reserve(HEADER_SIZE);
    dst.put_slice(&MAGIC);
    dst.put_u8(VERSION);
    dst.put_u8(PAYLOAD_WIDTH);
}

/// Decode the trace header from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain the whole header yet.
/// On success, consumes the header bytes from the buffer.
pub fn decode_header(src: &mut BytesMut) -> Result<Option<TraceHeader>> {
    if src.len() < HEADER_SIZE {
        return Ok(None);
    }

    if src[0..2] != MAGIC {
        return Err(FrameError::InvalidMagic);
    }

    let version = src[2];
    if version != VERSION {
        return Err(FrameError::UnsupportedVersion(version));
    }

    let payload_width = src[3];
    if payload_width != PAYLOAD_WIDTH {
        return Err(FrameError::UnsupportedWidth(payload_width));
    }

    src.advance(HEADER_SIZE);
    Ok(Some(TraceHeader {
        version,
        payload_width,
    }))
}

/// Encode one clock step.
///
/// Wire format:
/// ```text
/// ┌───────────────────────────────────────┬──────────┐
/// │ Flags (1B)                            │ Payload  │
/// │ b0 active  b1 advance                 │ (1B)     │
/// │ b2 complete  b3 invalid  b4-7 zero    │          │
/// └───────────────────────────────────────┴──────────┘
/// ```
pub fn encode_sample(sample: &DetectorInput, dst: &mut BytesMut) {
    let mut flags = 0u8;
    if sample.stream.active {
        flags |= FLAG_ACTIVE;
    }
    if sample.stream.advance {
        flags |= FLAG_ADVANCE;
    }
    if sample.complete {
        flags |= FLAG_COMPLETE;
    }
    if sample.invalid {
        flags |= FLAG_INVALID;
    }

    dst.reserve(SAMPLE_SIZE);
    dst.put_u8(flags);
    dst.put_u8(sample.stream.payload);
}

/// Decode one clock step from a buffer.
///
/// Returns `Ok(None)` if the buffer doesn't contain a whole record yet.
/// On success, consumes the record from the buffer.
pub fn decode_sample(src: &mut BytesMut) -> Result<Option<DetectorInput>> {
    if src.len() < SAMPLE_SIZE {
        return Ok(None);
    }

    let flags = src[0];
    if flags & FLAG_RESERVED != 0 {
        return Err(FrameError::ReservedFlags(flags));
    }

    let flags = src.get_u8();
    let payload = src.get_u8();

    Ok(Some(DetectorInput {
        stream: UsbOutStream {
            active: flags & FLAG_ACTIVE != 0,
            advance: flags & FLAG_ADVANCE != 0,
            payload,
        },
        complete: flags & FLAG_COMPLETE != 0,
        invalid: flags & FLAG_INVALID != 0,
    }))
}
