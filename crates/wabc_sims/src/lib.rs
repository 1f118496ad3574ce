//!A simulated two-wire bus for running boards without hardware.
//!
//! [`SimBus`] keeps a register file per device address, serves configured values for the
//! register-less sensor reads, and when built with [`SimBus::recording`] logs every transaction
//! so tests can assert on exact bus traffic. A bus from [`SimBus::new`] keeps no log and can run
//! indefinitely.

use std::{
    collections::{HashMap, HashSet},
    fmt::{Debug, Formatter},
};

use tracing::trace;
use wabc_core::{BusTransport, Width};

///One bus transaction as seen by the simulated devices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    WriteRegister { device: u8, register: u8, value: u8 },
    WriteBlock { device: u8, bytes: Vec<u8> },
    ReadRegister { device: u8, register: u8, width: Width },
    Read { device: u8, width: Width },
    Delay { micros: u32 },
}

impl Transaction {
    ///The device address this transaction was sent to. Delays have none.
    pub fn device(&self) -> Option<u8> {
        match *self {
            Self::WriteRegister { device, .. }
            | Self::WriteBlock { device, .. }
            | Self::ReadRegister { device, .. }
            | Self::Read { device, .. } => Some(device),
            Self::Delay { .. } => None,
        }
    }
}

pub enum SimError {
    ///No device acknowledged the address.
    Nack(u8),
}

impl Debug for SimError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Self::Nack(device) => fmt.write_fmt(format_args!(
                "SimError: no device acknowledged address 0x{:02x}",
                device
            )),
        }
    }
}

#[derive(Default)]
pub struct SimBus {
    registers: HashMap<(u8, u8), u8>,
    values: HashMap<u8, u16>,
    absent: HashSet<u8>,
    recording: bool,
    transactions: Vec<Transaction>,
    elapsed_us: u64,
}

impl SimBus {
    ///A bus that only simulates devices. [`SimBus::transactions`] stays empty.
    pub fn new() -> Self {
        Self::default()
    }

    ///A bus that also logs every transaction.
    pub fn recording() -> Self {
        SimBus {
            recording: true,
            ..Self::default()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    ///Builder-style variant of [`SimBus::set_value`].
    pub fn with_value(mut self, device: u8, value: u16) -> Self {
        self.set_value(device, value);
        self
    }

    ///Value returned by register-less reads of `device`. Unconfigured devices read 0.
    pub fn set_value(&mut self, device: u8, value: u16) {
        self.values.insert(device, value);
    }

    pub fn set_register(&mut self, device: u8, register: u8, value: u8) {
        self.registers.insert((device, register), value);
    }

    pub fn register(&self, device: u8, register: u8) -> u8 {
        self.registers
            .get(&(device, register))
            .copied()
            .unwrap_or(0)
    }

    ///Make every transaction to `device` fail, as if nothing were connected there.
    pub fn disconnect(&mut self, device: u8) {
        self.absent.insert(device);
    }

    pub fn connect(&mut self, device: u8) {
        self.absent.remove(&device);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn clear_transactions(&mut self) {
        self.transactions.clear();
    }

    ///Total simulated busy-wait time.
    pub fn elapsed_us(&self) -> u64 {
        self.elapsed_us
    }

    fn record(&mut self, transaction: Transaction) -> Result<(), SimError> {
        trace!("sim bus: {:?}", transaction);
        let device = transaction.device();
        if self.recording {
            self.transactions.push(transaction);
        }
        match device {
            Some(device) if self.absent.contains(&device) => Err(SimError::Nack(device)),
            _ => Ok(()),
        }
    }
}

impl BusTransport for SimBus {
    type Error = SimError;

    fn write_register(&mut self, device: u8, register: u8, value: u8) -> Result<(), SimError> {
        self.record(Transaction::WriteRegister {
            device,
            register,
            value,
        })?;
        self.registers.insert((device, register), value);
        Ok(())
    }

    fn write_block(&mut self, device: u8, bytes: &[u8]) -> Result<(), SimError> {
        self.record(Transaction::WriteBlock {
            device,
            bytes: bytes.to_vec(),
        })?;
        if let Some((&start, values)) = bytes.split_first() {
            for (offset, value) in values.iter().enumerate() {
                let register = start.wrapping_add(offset as u8);
                self.registers.insert((device, register), *value);
            }
        }
        Ok(())
    }

    fn read_register(&mut self, device: u8, register: u8, width: Width) -> Result<u16, SimError> {
        self.record(Transaction::ReadRegister {
            device,
            register,
            width,
        })?;
        let value = match width {
            Width::U8 => self.register(device, register) as u16,
            Width::U16 => {
                ((self.register(device, register) as u16) << 8)
                    | (self.register(device, register.wrapping_add(1)) as u16)
            }
        };
        Ok(value)
    }

    fn read(&mut self, device: u8, width: Width) -> Result<u16, SimError> {
        self.record(Transaction::Read { device, width })?;
        let value = self.values.get(&device).copied().unwrap_or(0);
        Ok(match width {
            Width::U8 => value & 0xFF,
            Width::U16 => value,
        })
    }

    fn delay_us(&mut self, micros: u32) {
        // delays never fail
        let _ = self.record(Transaction::Delay { micros });
        self.elapsed_us += micros as u64;
    }
}

#[cfg(test)]
mod tests {
    use wabc_core::{BusTransport, Width};

    use super::{SimBus, SimError, Transaction};

    #[test]
    fn test_block_write_fills_sequential_registers() {
        let mut bus = SimBus::recording();
        bus.write_block(0x40, &[0x0A, 0x00, 0x00, 0x7A, 0x00])
            .unwrap();

        assert_eq!(bus.register(0x40, 0x0A), 0x00);
        assert_eq!(bus.register(0x40, 0x0C), 0x7A);
        assert_eq!(bus.register(0x40, 0x0D), 0x00);
        assert_eq!(
            bus.transactions(),
            &[Transaction::WriteBlock {
                device: 0x40,
                bytes: vec![0x0A, 0x00, 0x00, 0x7A, 0x00]
            }]
        );
    }

    #[test]
    fn test_read_register_returns_last_write() {
        let mut bus = SimBus::recording();
        bus.write_register(0x40, 0x00, 0x21).unwrap();
        assert_eq!(bus.read_register(0x40, 0x00, Width::U8).unwrap(), 0x21);

        bus.set_register(0x40, 0x10, 0x01);
        bus.set_register(0x40, 0x11, 0x02);
        assert_eq!(bus.read_register(0x40, 0x10, Width::U16).unwrap(), 0x0102);
    }

    #[test]
    fn test_register_less_reads() {
        let mut bus = SimBus::recording().with_value(35, 360);
        assert_eq!(bus.read(35, Width::U16).unwrap(), 360);
        assert_eq!(bus.read(35, Width::U8).unwrap(), 360 & 0xFF);
        assert_eq!(bus.read(18, Width::U16).unwrap(), 0);
    }

    #[test]
    fn test_disconnected_device_nacks_but_is_recorded() {
        let mut bus = SimBus::recording();
        bus.disconnect(0x40);

        let res = bus.write_register(0x40, 0x00, 0x00);
        assert!(matches!(res, Err(SimError::Nack(0x40))));
        assert_eq!(bus.register(0x40, 0x00), 0);
        assert_eq!(bus.transactions().len(), 1);

        assert!(bus.read(35, Width::U16).is_ok());
    }

    #[test]
    fn test_plain_bus_keeps_no_log() {
        let mut bus = SimBus::new().with_value(38, 12);
        assert!(!bus.is_recording());
        for _ in 0..1000 {
            assert_eq!(bus.read(38, Width::U16).unwrap(), 12);
            bus.write_block(0x40, &[0x06, 0, 0, 0x33, 0x01]).unwrap();
        }
        bus.delay_us(5000);

        assert!(bus.transactions().is_empty());
        assert_eq!(bus.register(0x40, 0x08), 0x33);
        assert_eq!(bus.elapsed_us(), 5000);
    }

    #[test]
    fn test_plain_bus_still_nacks() {
        let mut bus = SimBus::new();
        bus.disconnect(0x40);
        assert!(matches!(
            bus.write_register(0x40, 0x00, 0x00),
            Err(SimError::Nack(0x40))
        ));
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn test_delay_accumulates() {
        let mut bus = SimBus::recording();
        bus.delay_us(5000);
        bus.delay_us(250);
        assert_eq!(bus.elapsed_us(), 5250);
        assert_eq!(bus.transactions()[0], Transaction::Delay { micros: 5000 });
    }
}
