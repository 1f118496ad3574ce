//! Register-level access to devices on a two-wire bus.
//!
//! Devices in `wabc_devices` only ever talk to a [`BusTransport`]. [`HalBus`] adapts any
//! `embedded-hal` I2C bus plus delay provider, so the same drivers run against a Raspberry Pi
//! bus, a microcontroller HAL, or the simulated bus in `wabc_sims`.

use std::fmt::Debug;

use embedded_hal::{delay::DelayNs, i2c::I2c};
use tracing::trace;

/// Width of a register or value read from a device. 16 bit values are big-endian on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Width {
    U8,
    U16,
}

impl Width {
    pub fn bytes(&self) -> usize {
        match *self {
            Self::U8 => 1,
            Self::U16 => 2,
        }
    }

    fn decode(&self, buffer: &[u8]) -> u16 {
        match *self {
            Self::U8 => buffer[0] as u16,
            Self::U16 => ((buffer[0] as u16) << 8) | (buffer[1] as u16),
        }
    }
}

///Byte-level register access at fixed 7-bit device addresses.
///
/// Writes are fire-and-forget from the caller's point of view and reads block until the
/// transaction completes. Failures are reported as the transport's own error type; devices do not
/// interpret or retry them.
pub trait BusTransport {
    type Error: Debug;

    ///Write a single register.
    fn write_register(&mut self, device: u8, register: u8, value: u8) -> Result<(), Self::Error>;

    ///Write a block in one transaction. The first byte is the starting register, the remainder are
    ///values for sequential registers.
    fn write_block(&mut self, device: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    ///Select a register, then read a value of the given width from it.
    fn read_register(
        &mut self,
        device: u8,
        register: u8,
        width: Width,
    ) -> Result<u16, Self::Error>;

    ///Read a value of the given width without selecting a register first.
    fn read(&mut self, device: u8, width: Width) -> Result<u16, Self::Error>;

    ///Blocking busy-wait.
    fn delay_us(&mut self, micros: u32);
}

///A [`BusTransport`] over an `embedded-hal` I2C bus and delay provider.
pub struct HalBus<I2C, D> {
    i2c: I2C,
    delay: D,
}

impl<I2C, D> HalBus<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    pub fn new(i2c: I2C, delay: D) -> Self {
        HalBus { i2c, delay }
    }

    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }
}

impl<I2C, D> BusTransport for HalBus<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    type Error = I2C::Error;

    fn write_register(&mut self, device: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        trace!("i2c 0x{:02x}: write 0x{:02x} <- 0x{:02x}", device, register, value);
        self.i2c.write(device, &[register, value])
    }

    fn write_block(&mut self, device: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        trace!("i2c 0x{:02x}: write block {:02x?}", device, bytes);
        self.i2c.write(device, bytes)
    }

    // register select and read are separate transactions, no repeated start
    fn read_register(
        &mut self,
        device: u8,
        register: u8,
        width: Width,
    ) -> Result<u16, Self::Error> {
        self.i2c.write(device, &[register])?;
        self.read(device, width)
    }

    fn read(&mut self, device: u8, width: Width) -> Result<u16, Self::Error> {
        let mut buffer = [0u8; 2];
        let buffer = &mut buffer[..width.bytes()];
        self.i2c.read(device, buffer)?;
        let value = width.decode(buffer);
        trace!("i2c 0x{:02x}: read {:?} -> {}", device, width, value);
        Ok(value)
    }

    fn delay_us(&mut self, micros: u32) {
        self.delay.delay_us(micros)
    }
}

#[cfg(test)]
mod tests {
    use std::convert::Infallible;

    use embedded_hal::{
        delay::DelayNs,
        i2c::{ErrorType, I2c, Operation},
    };

    use super::{BusTransport, HalBus, Width};

    #[derive(Debug, PartialEq)]
    enum Op {
        Write(u8, Vec<u8>),
        Read(u8, usize),
    }

    #[derive(Default)]
    struct FakeI2c {
        ops: Vec<Op>,
        read_bytes: Vec<u8>,
    }

    impl ErrorType for FakeI2c {
        type Error = Infallible;
    }

    impl I2c for FakeI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            for op in operations {
                match op {
                    Operation::Write(bytes) => self.ops.push(Op::Write(address, bytes.to_vec())),
                    Operation::Read(buffer) => {
                        self.ops.push(Op::Read(address, buffer.len()));
                        let n = buffer.len().min(self.read_bytes.len());
                        buffer[..n].copy_from_slice(&self.read_bytes[..n]);
                        self.read_bytes.drain(..n);
                    }
                }
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeDelay {
        total_ns: u64,
    }

    impl DelayNs for FakeDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.total_ns += ns as u64;
        }
    }

    #[test]
    fn test_write_register_and_block() {
        let mut bus = HalBus::new(FakeI2c::default(), FakeDelay::default());
        bus.write_register(0x40, 0x00, 0xA1).unwrap();
        bus.write_block(0x40, &[0x06, 1, 2, 3, 4]).unwrap();

        let (i2c, _) = bus.release();
        assert_eq!(
            i2c.ops,
            vec![
                Op::Write(0x40, vec![0x00, 0xA1]),
                Op::Write(0x40, vec![0x06, 1, 2, 3, 4]),
            ]
        );
    }

    #[test]
    fn test_read_register_selects_then_reads() {
        let i2c = FakeI2c {
            read_bytes: vec![0x21],
            ..Default::default()
        };
        let mut bus = HalBus::new(i2c, FakeDelay::default());
        assert_eq!(bus.read_register(0x40, 0x00, Width::U8).unwrap(), 0x21);

        let (i2c, _) = bus.release();
        assert_eq!(i2c.ops, vec![Op::Write(0x40, vec![0x00]), Op::Read(0x40, 1)]);
    }

    #[test]
    fn test_read_u16_is_big_endian() {
        let i2c = FakeI2c {
            read_bytes: vec![0x01, 0x2C],
            ..Default::default()
        };
        let mut bus = HalBus::new(i2c, FakeDelay::default());
        assert_eq!(bus.read(35, Width::U16).unwrap(), 300);
    }

    #[test]
    fn test_delay_us() {
        let mut bus = HalBus::new(FakeI2c::default(), FakeDelay::default());
        bus.delay_us(5000);
        let (_, delay) = bus.release();
        assert_eq!(delay.total_ns, 5_000_000);
    }
}
