//!This library provides the Raspberry Pi I2C bus for the wabc devices. It is a wrapper around the rppal library.
//!
//! The `rpi_bus` and `default_rpi_bus` functions return a `BusTransport` that can be used to construct a board in `wabc_devices`

//internal error type for rpi i2c
pub mod error;

pub use rppal::{hal::Delay, i2c::I2c};

use error::RpiError;
use tracing::debug;
use wabc_core::HalBus;

pub type RpiBus = HalBus<I2c, Delay>;

//get i2c bus by id
pub fn rpi_bus(bus: u8) -> Result<RpiBus, RpiError> {
    let i2c = I2c::with_bus(bus)?;
    debug!("opened i2c bus {} at {} Hz", bus, i2c.clock_speed()?);
    Ok(HalBus::new(i2c, Delay::new()))
}

//get default i2c bus
pub fn default_rpi_bus() -> Result<RpiBus, RpiError> {
    Ok(HalBus::new(I2c::new()?, Delay::new()))
}
