use serde::Deserialize;
use tracing::debug;
use wabc_core::{BusTransport, Width};

use crate::error::DeviceError;

pub const ILLUMINANCE_ADDRESS: u8 = 35;
pub const HUMAN_INFRARED_ADDRESS: u8 = 36;
pub const PRESSURE_ADDRESS: u8 = 37;
pub const PM2_5_ADDRESS: u8 = 38;
pub const PM10_ADDRESS: u8 = 39;
pub const FAN_SPEED_ADDRESS: u8 = 40;
pub const SOUND_ADDRESS: u8 = 18;

//raw counts per lux of the light sensor
const ILLUMINANCE_COUNTS_PER_LUX: f64 = 1.2;

///Ambient light in lux.
pub fn illuminance<B: BusTransport>(bus: &mut B) -> Result<u16, DeviceError<B::Error>> {
    let raw = bus.read(ILLUMINANCE_ADDRESS, Width::U16)?;
    Ok((raw as f64 / ILLUMINANCE_COUNTS_PER_LUX).round() as u16)
}

///True while the human infrared sensor detects someone.
pub fn human_infrared<B: BusTransport>(bus: &mut B) -> Result<bool, DeviceError<B::Error>> {
    Ok(bus.read(HUMAN_INFRARED_ADDRESS, Width::U8)? != 0)
}

pub fn pressure<B: BusTransport>(bus: &mut B) -> Result<u16, DeviceError<B::Error>> {
    Ok(bus.read(PRESSURE_ADDRESS, Width::U16)?)
}

///PM2.5 concentration in ug/m3.
pub fn pm2_5<B: BusTransport>(bus: &mut B) -> Result<u16, DeviceError<B::Error>> {
    Ok(bus.read(PM2_5_ADDRESS, Width::U16)?)
}

///PM10 concentration in ug/m3.
pub fn pm10<B: BusTransport>(bus: &mut B) -> Result<u16, DeviceError<B::Error>> {
    Ok(bus.read(PM10_ADDRESS, Width::U16)?)
}

pub fn sound<B: BusTransport>(bus: &mut B) -> Result<u16, DeviceError<B::Error>> {
    Ok(bus.read(SOUND_ADDRESS, Width::U16)?)
}

///Send a speed command byte to the fan controller.
pub fn set_fan_speed<B: BusTransport>(bus: &mut B, speed: u8) -> Result<(), DeviceError<B::Error>> {
    debug!("fan speed -> {}", speed);
    bus.write_block(FAN_SPEED_ADDRESS, &[speed])?;
    Ok(())
}

///The readable sensors of the carrier board.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    Illuminance,
    HumanInfrared,
    Pressure,
    Pm2_5,
    Pm10,
    Sound,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SensorReading {
    Illuminance(u16),
    HumanInfrared(bool),
    Pressure(u16),
    Pm2_5(u16),
    Pm10(u16),
    Sound(u16),
}

impl SensorKind {
    pub const ALL: [SensorKind; 6] = [
        Self::Illuminance,
        Self::HumanInfrared,
        Self::Pressure,
        Self::Pm2_5,
        Self::Pm10,
        Self::Sound,
    ];

    pub fn address(&self) -> u8 {
        match *self {
            Self::Illuminance => ILLUMINANCE_ADDRESS,
            Self::HumanInfrared => HUMAN_INFRARED_ADDRESS,
            Self::Pressure => PRESSURE_ADDRESS,
            Self::Pm2_5 => PM2_5_ADDRESS,
            Self::Pm10 => PM10_ADDRESS,
            Self::Sound => SOUND_ADDRESS,
        }
    }

    pub fn read<B: BusTransport>(
        &self,
        bus: &mut B,
    ) -> Result<SensorReading, DeviceError<B::Error>> {
        let reading = match *self {
            Self::Illuminance => SensorReading::Illuminance(illuminance(bus)?),
            Self::HumanInfrared => SensorReading::HumanInfrared(human_infrared(bus)?),
            Self::Pressure => SensorReading::Pressure(pressure(bus)?),
            Self::Pm2_5 => SensorReading::Pm2_5(pm2_5(bus)?),
            Self::Pm10 => SensorReading::Pm10(pm10(bus)?),
            Self::Sound => SensorReading::Sound(sound(bus)?),
        };
        Ok(reading)
    }
}

#[cfg(test)]
mod tests {
    use wabc_core::Width;
    use wabc_sims::{SimBus, SimError, Transaction};

    use super::*;

    #[test]
    fn test_illuminance_scales_and_rounds() {
        let mut bus = SimBus::recording().with_value(ILLUMINANCE_ADDRESS, 360);
        assert_eq!(illuminance(&mut bus).unwrap(), 300);

        //100 / 1.2 = 83.33
        bus.set_value(ILLUMINANCE_ADDRESS, 100);
        assert_eq!(illuminance(&mut bus).unwrap(), 83);

        //119 / 1.2 = 99.17
        bus.set_value(ILLUMINANCE_ADDRESS, 119);
        assert_eq!(illuminance(&mut bus).unwrap(), 99);

        assert_eq!(
            bus.transactions()[0],
            Transaction::Read {
                device: ILLUMINANCE_ADDRESS,
                width: Width::U16
            }
        );
    }

    #[test]
    fn test_human_infrared() {
        let mut bus = SimBus::recording();
        assert!(!human_infrared(&mut bus).unwrap());
        bus.set_value(HUMAN_INFRARED_ADDRESS, 1);
        assert!(human_infrared(&mut bus).unwrap());
        assert_eq!(
            bus.transactions()[0],
            Transaction::Read {
                device: HUMAN_INFRARED_ADDRESS,
                width: Width::U8
            }
        );
    }

    #[test]
    fn test_each_kind_reads_its_own_address() {
        let mut bus = SimBus::recording()
            .with_value(PRESSURE_ADDRESS, 1013)
            .with_value(PM2_5_ADDRESS, 35)
            .with_value(PM10_ADDRESS, 50)
            .with_value(SOUND_ADDRESS, 612);

        let readings: Vec<SensorReading> = SensorKind::ALL
            .iter()
            .map(|kind| kind.read(&mut bus).unwrap())
            .collect();
        assert_eq!(
            readings,
            vec![
                SensorReading::Illuminance(0),
                SensorReading::HumanInfrared(false),
                SensorReading::Pressure(1013),
                SensorReading::Pm2_5(35),
                SensorReading::Pm10(50),
                SensorReading::Sound(612),
            ]
        );

        let devices: Vec<Option<u8>> = bus.transactions().iter().map(|t| t.device()).collect();
        let expected: Vec<Option<u8>> = SensorKind::ALL.iter().map(|k| Some(k.address())).collect();
        assert_eq!(devices, expected);
    }

    #[test]
    fn test_fan_speed_command() {
        let mut bus = SimBus::recording();
        set_fan_speed(&mut bus, 80).unwrap();
        assert_eq!(
            bus.transactions(),
            &[Transaction::WriteBlock {
                device: FAN_SPEED_ADDRESS,
                bytes: vec![80]
            }]
        );
    }

    #[test]
    fn test_missing_sensor_reports_bus_error() {
        let mut bus = SimBus::recording();
        bus.disconnect(SOUND_ADDRESS);
        assert!(matches!(
            SensorKind::Sound.read(&mut bus),
            Err(DeviceError::Bus(SimError::Nack(SOUND_ADDRESS)))
        ));
    }
}
