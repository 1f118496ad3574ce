//!The carrier board as one value: the servo controller and every sensor behind a single bus.
//!
//! All of the board's devices share one bus, and the PCA9685 frequency sequence must not be
//! interleaved with other traffic, so the whole board is one mutually exclusive resource. Share it
//! between threads behind a single lock, never per device.

use wabc_core::BusTransport;

use crate::{
    devices::{
        pca9685::{ChannelPolicy, Pca9685},
        sensors::{self, SensorKind, SensorReading},
    },
    error::DeviceError,
};

pub struct Board<B> {
    pwm: Pca9685<B>,
}

impl<B: BusTransport> Board<B> {
    pub fn new(bus: B) -> Self {
        Board {
            pwm: Pca9685::new(bus),
        }
    }

    pub fn with_policy(bus: B, policy: ChannelPolicy) -> Self {
        Board {
            pwm: Pca9685::with_policy(bus, policy),
        }
    }

    pub fn pwm(&mut self) -> &mut Pca9685<B> {
        &mut self.pwm
    }

    pub fn release(self) -> B {
        self.pwm.release()
    }

    pub fn servo(&mut self, channel: u8, degree: f64) -> Result<(), DeviceError<B::Error>> {
        self.pwm.servo(channel, degree)
    }

    pub fn servo_pulse(&mut self, channel: u8, pulse_us: f64) -> Result<(), DeviceError<B::Error>> {
        self.pwm.servo_pulse(channel, pulse_us)
    }

    pub fn illuminance(&mut self) -> Result<u16, DeviceError<B::Error>> {
        sensors::illuminance(self.pwm.bus_mut())
    }

    pub fn human_infrared(&mut self) -> Result<bool, DeviceError<B::Error>> {
        sensors::human_infrared(self.pwm.bus_mut())
    }

    pub fn pressure(&mut self) -> Result<u16, DeviceError<B::Error>> {
        sensors::pressure(self.pwm.bus_mut())
    }

    pub fn pm2_5(&mut self) -> Result<u16, DeviceError<B::Error>> {
        sensors::pm2_5(self.pwm.bus_mut())
    }

    pub fn pm10(&mut self) -> Result<u16, DeviceError<B::Error>> {
        sensors::pm10(self.pwm.bus_mut())
    }

    pub fn sound(&mut self) -> Result<u16, DeviceError<B::Error>> {
        sensors::sound(self.pwm.bus_mut())
    }

    pub fn set_fan_speed(&mut self, speed: u8) -> Result<(), DeviceError<B::Error>> {
        sensors::set_fan_speed(self.pwm.bus_mut(), speed)
    }

    pub fn read(&mut self, kind: SensorKind) -> Result<SensorReading, DeviceError<B::Error>> {
        kind.read(self.pwm.bus_mut())
    }
}
