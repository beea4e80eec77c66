//! UTMI signal bundles, sampled once per clock step.
//!
//! These mirror the receive and transmit halves of a UTMI (or ULPI, once
//! translated) transceiver. Neither bundle carries packet boundaries: the
//! transceiver only reports that a packet is in progress and when a new byte
//! is present.

use serde::{Deserialize, Serialize};

/// Receive half of a UTMI transceiver.
///
/// The transceiver drives every field; a receiver cannot stall it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmiReceive {
    /// High for the whole duration of a received packet.
    pub rx_active: bool,
    /// Pulses high on each step that carries a new byte in `rx_data`.
    pub rx_valid: bool,
    /// The received byte; meaningful only while `rx_valid` is high.
    pub rx_data: u8,
}

impl UtmiReceive {
    /// A step with no packet in progress.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A step carrying a new byte of the current packet.
    pub fn byte(data: u8) -> Self {
        Self {
            rx_active: true,
            rx_valid: true,
            rx_data: data,
        }
    }

    /// A step inside a packet that carries no new byte (e.g. bit stuffing).
    pub fn stall() -> Self {
        Self {
            rx_active: true,
            rx_valid: false,
            rx_data: 0,
        }
    }
}

/// Transmit half of a UTMI transceiver.
///
/// `valid` and `data` are driven by the sender; `ready` is driven by the
/// transceiver and acknowledges the byte currently on `data`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtmiTransmit {
    /// High while the sender has a packet byte to transmit.
    pub valid: bool,
    /// The byte to transmit.
    pub data: u8,
    /// High when the transceiver accepts `data` this step.
    pub ready: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_receive_has_nothing_active() {
        let rx = UtmiReceive::idle();
        assert!(!rx.rx_active);
        assert!(!rx.rx_valid);
    }

    #[test]
    fn stall_is_active_without_a_byte() {
        let rx = UtmiReceive::stall();
        assert!(rx.rx_active);
        assert!(!rx.rx_valid);
    }

    #[test]
    fn byte_carries_data() {
        let rx = UtmiReceive::byte(0x5A);
        assert_eq!((rx.rx_active, rx.rx_valid, rx.rx_data), (true, true, 0x5A));
    }
}
