use serde::Deserialize;

#[cfg(feature = "sims")]
use wabc_devices::devices::sensors::SensorKind;

#[cfg(feature = "sims")]
use wabc_sims::SimBus;

///A fixed value served by a simulated sensor.
#[cfg(feature = "sims")]
#[derive(Deserialize, Debug)]
pub struct SimValueConfig {
    pub sensor: SensorKind,
    pub value: u16,
}

///Where the board's devices are attached.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "snake_case")]
pub enum BusConfig {
    //every device answers from memory, see wabc_sims
    #[cfg(feature = "sims")]
    Sim {
        #[serde(default)]
        values: Vec<SimValueConfig>,
    },

    //a Raspberry Pi i2c bus, /dev/i2c-<bus>
    #[cfg(feature = "rpi")]
    Rpi { bus: u8 },
}

#[cfg(feature = "sims")]
pub fn build_sim_bus(values: &[SimValueConfig]) -> SimBus {
    let mut bus = SimBus::new();
    for v in values {
        bus.set_value(v.sensor.address(), v.value);
    }
    bus
}
