///The PCA9685 is an i2c device from NXP with 16 pwm output channels with 12 bit resolution. On the carrier board it drives the servo headers.
#[cfg(feature = "pca9685")]
pub mod pca9685;

///The carrier board's fixed-address sensor modules (illuminance, human infrared, pressure, PM2.5, PM10, sound) and the fan speed controller.
///
/// Each one answers a plain read at its own address, with no register select.
#[cfg(feature = "sensors")]
pub mod sensors;
