//! Stream shapes and their mapping onto UTMI signal bundles.
//!
//! Direction of control:
//! - [`UsbOutStream`] (USB OUT, host to device): the transceiver drives
//!   `active`, `advance` and `payload`. There is no `ready`; receipt cannot be
//!   throttled.
//! - [`UsbInStream`] (USB IN, device to host): the sender drives `valid`,
//!   `payload`, `first` and `last`; the transceiver drives `ready`.

use serde::{Deserialize, Serialize};
use usbstream_utmi::{UtmiReceive, UtmiTransmit};

use crate::error::{FrameError, Result};

/// Stream of received bytes, as seen on a UTMI receive interface.
///
/// Field mapping from UTMI:
///
/// ```text
///  UTMI      | Stream
///  ----------|---------
///  rx_active | active
///  rx_valid  | advance
///  rx_data   | payload
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbOutStream {
    /// High for the duration of a packet.
    pub active: bool,
    /// Pulses high on each step that presents a new payload element.
    pub advance: bool,
    /// The payload element; meaningful only while `advance` is high.
    pub payload: u8,
}

impl UsbOutStream {
    /// Sample this stream from a UTMI receive interface.
    pub fn bridge_from(rx: &UtmiReceive) -> Self {
        Self {
            active: rx.rx_active,
            advance: rx.rx_valid,
            payload: rx.rx_data,
        }
    }

    /// True when this step presents a new element of an active packet.
    pub fn is_advancing(&self) -> bool {
        self.active && self.advance
    }
}

impl From<UtmiReceive> for UsbOutStream {
    fn from(rx: UtmiReceive) -> Self {
        Self::bridge_from(&rx)
    }
}

/// Stream of bytes to transmit over a UTMI transmit interface.
///
/// Unlike a general stream, `valid` must stay high for every step from a
/// packet's `first` element through its `last` element inclusive; UTMI ends a
/// transmission as soon as `tx_valid` drops. [`TransmitMonitor`] checks this.
///
/// ```text
///  Stream  | UTMI
///  --------|---------
///  valid   | tx_valid
///  payload | tx_data
///  ready   | tx_ready
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbInStream {
    pub valid: bool,
    pub payload: u8,
    pub ready: bool,
    pub first: bool,
    pub last: bool,
}

impl UsbInStream {
    /// Connect this stream to a UTMI transmit interface for one step.
    ///
    /// Drives `tx.valid` and `tx.data` from the stream and copies the
    /// transceiver's `tx.ready` back into [`UsbInStream::ready`].
    pub fn bridge_to(&mut self, tx: &mut UtmiTransmit) {
        tx.valid = self.valid;
        tx.data = self.payload;
        self.ready = tx.ready;
    }
}

/// Watches a [`UsbInStream`] step by step for gaps in `valid` mid-packet.
#[derive(Debug, Default)]
pub struct TransmitMonitor {
    in_packet: bool,
    step: u64,
}

impl TransmitMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe one step of the stream.
    ///
    /// A packet opens on a valid `first` element and closes once its `last`
    /// element is accepted (`valid && ready`).
    pub fn observe(&mut self, stream: &UsbInStream) -> Result<()> {
        let step = self.step;
        self.step += 1;

        if stream.valid && stream.first {
            self.in_packet = true;
        }

        if self.in_packet && !stream.valid {
            self.in_packet = false;
            return Err(FrameError::TransmitGap { step });
        }

        if stream.valid && stream.last && stream.ready {
            self.in_packet = false;
        }

        Ok(())
    }

    /// True between an observed `first` element and the acceptance of `last`.
    pub fn in_packet(&self) -> bool {
        self.in_packet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx_step(valid: bool, first: bool, last: bool, ready: bool) -> UsbInStream {
        UsbInStream {
            valid,
            payload: 0,
            ready,
            first,
            last,
        }
    }

    #[test]
    fn out_stream_maps_utmi_receive_fields() {
        let rx = UtmiReceive {
            rx_active: true,
            rx_valid: true,
            rx_data: 0xC3,
        };
        let stream = UsbOutStream::bridge_from(&rx);
        assert!(stream.active);
        assert!(stream.advance);
        assert_eq!(stream.payload, 0xC3);
        assert!(stream.is_advancing());
    }

    #[test]
    fn out_stream_stall_is_not_advancing() {
        let stream = UsbOutStream::from(UtmiReceive::stall());
        assert!(stream.active);
        assert!(!stream.is_advancing());
    }

    #[test]
    fn in_stream_drives_transmit_and_reads_ready() {
        let mut stream = UsbInStream {
            valid: true,
            payload: 0x2D,
            ..UsbInStream::default()
        };
        let mut tx = UtmiTransmit {
            ready: true,
            ..UtmiTransmit::default()
        };

        stream.bridge_to(&mut tx);

        assert!(tx.valid);
        assert_eq!(tx.data, 0x2D);
        assert!(stream.ready);
    }

    #[test]
    fn monitor_accepts_contiguous_packet() {
        let mut monitor = TransmitMonitor::new();
        monitor.observe(&tx_step(true, true, false, true)).unwrap();
        assert!(monitor.in_packet());
        monitor.observe(&tx_step(true, false, false, false)).unwrap();
        monitor.observe(&tx_step(true, false, true, true)).unwrap();
        assert!(!monitor.in_packet());
        monitor.observe(&tx_step(false, false, false, false)).unwrap();
    }

    #[test]
    fn monitor_holds_packet_open_until_last_is_accepted() {
        let mut monitor = TransmitMonitor::new();
        monitor.observe(&tx_step(true, true, true, false)).unwrap();
        assert!(monitor.in_packet());
        monitor.observe(&tx_step(true, true, true, true)).unwrap();
        assert!(!monitor.in_packet());
    }

    #[test]
    fn monitor_reports_gap_mid_packet() {
        let mut monitor = TransmitMonitor::new();
        monitor.observe(&tx_step(true, true, false, true)).unwrap();
        monitor.observe(&tx_step(true, false, false, true)).unwrap();
        let err = monitor
            .observe(&tx_step(false, false, false, false))
            .unwrap_err();
        assert!(matches!(err, FrameError::TransmitGap { step: 2 }));
        assert!(!monitor.in_packet());
    }
}
