use std::fmt;
use std::io;

use usbstream_frame::FrameError;

// Exit codes follow the sysexits-style layout used across our CLIs.
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::NotFound => FAILURE,
        _ => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::InvalidMagic
        | FrameError::UnsupportedVersion(_)
        | FrameError::UnsupportedWidth(_)
        | FrameError::ReservedFlags(_)
        | FrameError::TruncatedTrace
        | FrameError::PacketTooLarge { .. }
        | FrameError::MissingFirst => CliError::new(DATA_INVALID, format!("{context}: {err}")),
        FrameError::EmptyPacket | FrameError::GapTooShort { .. } => {
            CliError::new(USAGE, format!("{context}: {err}"))
        }
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_trace_is_data_invalid() {
        let err = frame_error("detect failed", FrameError::TruncatedTrace);
        assert_eq!(err.code, DATA_INVALID);
        assert!(err.message.starts_with("detect failed: "));
    }

    #[test]
    fn bad_waveform_shape_is_usage() {
        let err = frame_error("synth failed", FrameError::GapTooShort { gap: 1, min: 2 });
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn io_errors_map_by_kind() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        assert_eq!(frame_error("x", FrameError::Io(denied)).code, PERMISSION_DENIED);

        let missing = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(io_error("x", missing).code, FAILURE);
    }

    #[test]
    fn transmit_gap_is_internal() {
        let err = frame_error("x", FrameError::TransmitGap { step: 3 });
        assert_eq!(err.code, INTERNAL);
    }
}
