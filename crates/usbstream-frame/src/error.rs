/// Errors that can occur while reconstructing packets or handling traces.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The trace header contains an invalid magic number.
    #[error("invalid trace magic (expected 0x5553 \"US\")")]
    InvalidMagic,

    /// The trace was written by an unknown format revision.
    #[error("unsupported trace version {0}")]
    UnsupportedVersion(u8),

    /// The trace carries payload elements of a width other than 8 bits.
    #[error("unsupported payload width {0} (only 8-bit payloads are supported)")]
    UnsupportedWidth(u8),

    /// A sample record sets flag bits that have no meaning.
    #[error("reserved flag bits set in sample record (flags 0x{0:02X})")]
    ReservedFlags(u8),

    /// The trace ended in the middle of a header or sample record.
    #[error("trace ended mid-record")]
    TruncatedTrace,

    /// A reconstructed packet exceeds the configured maximum size.
    #[error("packet too large ({size} bytes, max {max})")]
    PacketTooLarge { size: usize, max: usize },

    /// A payload element arrived with no open packet and no `first` marker.
    #[error("payload element without a preceding first element")]
    MissingFirst,

    /// A packet with no payload elements cannot be placed on the wire.
    #[error("packet has no payload elements")]
    EmptyPacket,

    /// Packets were spaced too closely for the detector to drain between them.
    #[error("inter-packet gap of {gap} steps is too short (min {min})")]
    GapTooShort { gap: usize, min: usize },

    /// `valid` dropped between a transmitted packet's first and last element.
    #[error("transmit stream dropped valid mid-packet at step {step}")]
    TransmitGap { step: u64 },

    /// An I/O error occurred while reading or writing a trace.
    #[error("trace I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FrameError>;
