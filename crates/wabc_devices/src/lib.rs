//!Drivers for the devices on the wabc carrier board, written against `wabc_core::BusTransport`.

pub mod error;

pub mod devices;

#[cfg(feature = "board")]
pub mod board;
