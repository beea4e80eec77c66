//! UTMI transceiver records and clock-domain binding.
//!
//! Provides the lowest layer of usbstream:
//! - The UTMI receive and transmit signal bundles a transceiver exposes
//! - [`ClockDomain`], naming the clock that drives a synchronous component
//! - The [`Clocked`] trait, one evaluation of a component per clock step
//!
//! Everything else builds on the records and the step model provided here.

pub mod domain;
pub mod error;
pub mod interface;
pub mod traits;

pub use domain::{ClockDomain, DEFAULT_DOMAIN};
pub use error::{Result, UtmiError};
pub use interface::{UtmiReceive, UtmiTransmit};
pub use traits::{run, Clocked};
