//! Servo output through the PCA9685 at address `0x40`.
//!
//! The device is configured lazily: the first call to [`Pca9685::servo`] or
//! [`Pca9685::servo_pulse`] puts it to sleep, programs a 50 Hz prescale, wakes it with
//! auto-increment enabled and resets every channel. After that each servo call is a single 5 byte
//! block write. Nothing about the channels is cached, every call re-derives its window.

use tracing::debug;
use wabc_core::{BusTransport, Width};

use crate::error::DeviceError;

pub const I2C_ADDRESS: u8 = 0x40;

pub const MODE1_REGISTER: u8 = 0x00;
pub const PRESCALE_REGISTER: u8 = 0xFE;
pub const LED0_ON_L_REGISTER: u8 = 0x06;
pub const ALL_LED_ON_L_REGISTER: u8 = 0xFA;

const MODE1_RESTART: u8 = 0x80;
const MODE1_SLEEP: u8 = 0x10;
//restart | auto-increment | allcall
const MODE1_WAKE: u8 = 0xA1;

pub const CHANNEL_COUNT: u8 = 16;
const REGISTERS_PER_CHANNEL: u8 = 4;

pub const OSCILLATOR_HZ: f64 = 25_000_000.0;
pub const RESOLUTION: f64 = 4096.0;
pub const SERVO_FREQUENCY_HZ: f64 = 50.0;
pub const SERVO_PERIOD_US: f64 = 20_000.0;
pub const SERVO_MIN_PULSE_US: f64 = 600.0;
pub const SERVO_PULSE_SPAN_US: f64 = 1800.0;
pub const SERVO_MAX_DEGREE: f64 = 180.0;
pub const FULL_ON_TICK: u16 = 4095;

//oscillator settle time after leaving sleep
const WAKE_DELAY_US: u32 = 5000;

///What to do with a PWM write to a channel outside 0..=15.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelPolicy {
    ///Drop the write without touching the bus and report success. This is what existing block
    ///programs expect.
    #[default]
    Silent,
    ///Drop the write and return [`DeviceError::InvalidChannel`].
    Strict,
}

///Prescale register value for a refresh rate.
///
/// The division is done stepwise in floating point (`25 MHz / 4096`, then `/ freq_hz`, then
/// `- 1`) and the result is truncated toward zero, not rounded. Only the low byte reaches the 8 bit
/// register. 50 Hz gives 121.
pub fn prescale_for(freq_hz: f64) -> u8 {
    let mut prescale = OSCILLATOR_HZ;
    prescale /= RESOLUTION;
    prescale /= freq_hz;
    prescale -= 1.0;
    prescale as i32 as u8
}

///Servo angle to pulse width: 0..=180 degrees maps linearly onto 600..=2400 us. Not clamped.
pub fn degree_to_pulse_us(degree: f64) -> f64 {
    degree * SERVO_PULSE_SPAN_US / SERVO_MAX_DEGREE + SERVO_MIN_PULSE_US
}

///Pulse width to the tick (out of 4096 per 20 ms period) at which the output falls, truncated
///toward zero. Not clamped, so out of range pulses give out of range or negative ticks.
pub fn pulse_us_to_tick(pulse_us: f64) -> i32 {
    (pulse_us * RESOLUTION / SERVO_PERIOD_US) as i32
}

///The four window registers (ON_L, ON_H, OFF_L, OFF_H) for an on/off pair.
pub fn split_window(on: u16, off: u16) -> [u8; 4] {
    let [on_l, on_h] = on.to_le_bytes();
    let [off_l, off_h] = off.to_le_bytes();
    [on_l, on_h, off_l, off_h]
}

///First window register of a channel.
pub fn channel_register(channel: u8) -> u8 {
    LED0_ON_L_REGISTER + REGISTERS_PER_CHANNEL * channel
}

//a negative or oversized tick goes out as its low 16 bits, the same bytes masking with 0xff gives
fn tick_to_register(tick: i32) -> u16 {
    tick as u16
}

pub struct Pca9685<B> {
    bus: B,
    policy: ChannelPolicy,
    initialized: bool,
}

impl<B: BusTransport> Pca9685<B> {
    ///A driver that silently drops writes to invalid channels.
    pub fn new(bus: B) -> Self {
        Self::with_policy(bus, ChannelPolicy::Silent)
    }

    ///A driver that reports writes to invalid channels as [`DeviceError::InvalidChannel`].
    pub fn strict(bus: B) -> Self {
        Self::with_policy(bus, ChannelPolicy::Strict)
    }

    pub fn with_policy(bus: B, policy: ChannelPolicy) -> Self {
        Pca9685 {
            bus,
            policy,
            initialized: false,
        }
    }

    pub fn policy(&self) -> ChannelPolicy {
        self.policy
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn release(self) -> B {
        self.bus
    }

    ///Configure the device for 50 Hz servo output: mode baseline, prescale, channel 0 fully on and
    ///channels 1..=15 off.
    ///
    /// Runs the sequence only once per driver. If any bus write fails the driver stays
    /// uninitialized and the next call starts over.
    pub fn initialize(&mut self) -> Result<(), DeviceError<B::Error>> {
        if self.initialized {
            return Ok(());
        }
        debug!("initializing PCA9685 at 0x{:02x}", I2C_ADDRESS);

        self.bus.write_register(I2C_ADDRESS, MODE1_REGISTER, 0x00)?;
        self.set_frequency(SERVO_FREQUENCY_HZ)?;
        self.set_pwm(0, 0, FULL_ON_TICK)?;
        for channel in 1..CHANNEL_COUNT {
            self.set_pwm(channel, 0, 0)?;
        }

        self.initialized = true;
        Ok(())
    }

    ///Change the PWM refresh rate.
    ///
    /// The prescaler can only be written while the oscillator sleeps, so this sleeps the device,
    /// writes the prescale, restores the old mode, waits for the oscillator to settle and then
    /// restarts it with auto-increment on. The sequence must not be interleaved with other writes
    /// to the device.
    pub fn set_frequency(&mut self, freq_hz: f64) -> Result<(), DeviceError<B::Error>> {
        let prescale = prescale_for(freq_hz);
        let old_mode = self.bus.read_register(I2C_ADDRESS, MODE1_REGISTER, Width::U8)? as u8;
        let sleep_mode = (old_mode & !MODE1_RESTART) | MODE1_SLEEP;
        debug!(
            "PCA9685 frequency {} Hz, prescale {}, mode1 0x{:02x}",
            freq_hz, prescale, old_mode
        );

        self.bus.write_register(I2C_ADDRESS, MODE1_REGISTER, sleep_mode)?;
        self.bus.write_register(I2C_ADDRESS, PRESCALE_REGISTER, prescale)?;
        self.bus.write_register(I2C_ADDRESS, MODE1_REGISTER, old_mode)?;
        self.bus.delay_us(WAKE_DELAY_US);
        self.bus.write_register(I2C_ADDRESS, MODE1_REGISTER, old_mode | MODE1_WAKE)?;
        Ok(())
    }

    ///Write the on/off window of one channel in a single block transaction.
    ///
    /// An invalid channel never reaches the bus; whether it is reported depends on the
    /// [`ChannelPolicy`].
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), DeviceError<B::Error>> {
        if channel >= CHANNEL_COUNT {
            debug!("dropping pwm write to invalid channel {}", channel);
            return match self.policy {
                ChannelPolicy::Silent => Ok(()),
                ChannelPolicy::Strict => Err(DeviceError::InvalidChannel(channel)),
            };
        }
        let [on_l, on_h, off_l, off_h] = split_window(on, off);
        self.bus.write_block(
            I2C_ADDRESS,
            &[channel_register(channel), on_l, on_h, off_l, off_h],
        )?;
        Ok(())
    }

    ///Write the same window to every channel at once through the ALL_LED registers.
    pub fn set_all_pwm(&mut self, on: u16, off: u16) -> Result<(), DeviceError<B::Error>> {
        let [on_l, on_h, off_l, off_h] = split_window(on, off);
        self.bus.write_block(
            I2C_ADDRESS,
            &[ALL_LED_ON_L_REGISTER, on_l, on_h, off_l, off_h],
        )?;
        Ok(())
    }

    ///Turn a servo to `degree` (0..=180, 600..=2400 us pulses). Input is not validated.
    pub fn servo(&mut self, channel: u8, degree: f64) -> Result<(), DeviceError<B::Error>> {
        self.initialize()?;
        let tick = pulse_us_to_tick(degree_to_pulse_us(degree));
        self.set_pwm(channel, 0, tick_to_register(tick))
    }

    ///Drive a servo with an explicit pulse width in microseconds (nominally 500..=2500). Input is
    ///not validated.
    pub fn servo_pulse(&mut self, channel: u8, pulse_us: f64) -> Result<(), DeviceError<B::Error>> {
        self.initialize()?;
        let tick = pulse_us_to_tick(pulse_us);
        self.set_pwm(channel, 0, tick_to_register(tick))
    }
}
