//! Packet boundary reconstruction for UTMI/ULPI receive streams.
//!
//! A USB transceiver's receive side reports only "a packet is active" and "a
//! new byte is here". usbstream turns that into a stream annotated with
//! first/last markers, with the transceiver's complete/invalid status strobes
//! realigned to follow each packet's last byte.
//!
//! # Crate Structure
//!
//! - [`utmi`]: UTMI signal bundles, clock-domain binding, the step model
//! - [`frame`]: Boundary detector, packet assembly, binary trace format

/// Re-export UTMI types.
pub mod utmi {
    pub use usbstream_utmi::*;
}

/// Re-export frame types.
pub mod frame {
    pub use usbstream_frame::*;
}
