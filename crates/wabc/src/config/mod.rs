pub mod bus;
pub mod poll;

use std::sync::{Arc, Mutex};

use futures::future::join_all;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wabc_core::{error::WabcError, BusTransport};
use wabc_devices::{
    board::Board,
    devices::{pca9685::ChannelPolicy, sensors::SensorKind},
};

use bus::BusConfig;
use poll::spawn_sensor_poll_task;

#[derive(Deserialize, Debug, Default)]
pub struct Metadata {
    pub name: Option<String>,
    pub description: Option<String>,
}

///One servo position, given either as an angle or as a pulse width.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(untagged)]
pub enum ServoCommand {
    Degree { channel: u8, degree: f64 },
    Pulse { channel: u8, pulse_us: f64 },
}

#[derive(Deserialize, Debug)]
pub struct SensorPollConfig {
    pub period_ms: u64,
    pub kinds: Vec<SensorKind>,
}

#[derive(Deserialize, Debug)]
pub struct WabcConfig {
    #[serde(default)]
    pub metadata: Metadata,
    pub bus: BusConfig,
    //report writes to channels outside 0..=15 instead of dropping them
    #[serde(default)]
    pub strict: bool,
    #[serde(default)]
    pub servos: Vec<ServoCommand>,
    pub fan_speed: Option<u8>,
    pub sensors: Option<SensorPollConfig>,
}

impl WabcConfig {
    pub fn channel_policy(&self) -> ChannelPolicy {
        if self.strict {
            ChannelPolicy::Strict
        } else {
            ChannelPolicy::Silent
        }
    }

    ///One line describing what the board will do, for the startup log.
    pub fn summary(&self) -> String {
        let bus = match self.bus {
            #[cfg(feature = "sims")]
            BusConfig::Sim { ref values } => format!("sim ({} fixed values)", values.len()),
            #[cfg(feature = "rpi")]
            BusConfig::Rpi { bus } => format!("/dev/i2c-{}", bus),
        };
        let polling = match self.sensors {
            Some(ref sensors) if !sensors.kinds.is_empty() => {
                format!("{:?} every {} ms", sensors.kinds, sensors.period_ms)
            }
            _ => "none".to_owned(),
        };
        format!(
            "bus: {}, channel policy: {:?}, servos: {}, fan: {:?}, polling: {}",
            bus,
            self.channel_policy(),
            self.servos.len(),
            self.fan_speed,
            polling
        )
    }

    pub async fn start(self) -> Result<(), WabcError> {
        match self.bus {
            #[cfg(feature = "sims")]
            BusConfig::Sim { ref values } => {
                let bus = bus::build_sim_bus(values);
                self.run(bus).await
            }
            #[cfg(feature = "rpi")]
            BusConfig::Rpi { bus } => {
                let bus = wabc_rpi::rpi_bus(bus)?;
                self.run(bus).await
            }
        }
    }

    ///Apply the configured servo positions and fan speed.
    ///
    /// Every command is attempted; failures are collected and reported together.
    pub fn apply<B: BusTransport>(&self, board: &mut Board<B>) -> Result<(), WabcError> {
        let mut errors: Vec<WabcError> = Vec::new();
        for servo in &self.servos {
            let result = match *servo {
                ServoCommand::Degree { channel, degree } => {
                    debug!("servo {} -> {} deg", channel, degree);
                    board.servo(channel, degree)
                }
                ServoCommand::Pulse { channel, pulse_us } => {
                    debug!("servo {} -> {} us", channel, pulse_us);
                    board.servo_pulse(channel, pulse_us)
                }
            };
            if let Err(err) = result {
                warn!("could not apply {:?}: {:?}", servo, err);
                errors.push(err.into());
            }
        }
        if let Some(speed) = self.fan_speed {
            if let Err(err) = board.set_fan_speed(speed) {
                warn!("could not set fan speed {}: {:?}", speed, err);
                errors.push(err.into());
            }
        }

        if !errors.is_empty() {
            return Err(WabcError::from_errs(errors));
        }
        Ok(())
    }

    async fn run<B>(&self, bus: B) -> Result<(), WabcError>
    where
        B: BusTransport + Send + 'static,
        B::Error: Send,
    {
        let mut board = Board::with_policy(bus, self.channel_policy());
        self.apply(&mut board)?;

        let sensors = match self.sensors {
            Some(ref sensors) if !sensors.kinds.is_empty() => sensors,
            _ => {
                info!("no sensors to poll.");
                return Ok(());
            }
        };

        let board = Arc::new(Mutex::new(board));
        let cancel_token = CancellationToken::new();
        let handles: Vec<_> = sensors
            .kinds
            .iter()
            .map(|kind| {
                spawn_sensor_poll_task(
                    board.clone(),
                    *kind,
                    sensors.period_ms,
                    cancel_token.clone(),
                )
            })
            .collect();

        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("could not listen for ctrl-c, stopping now: {}", err);
        }
        info!("stopping sensor polling.");
        cancel_token.cancel();
        join_all(handles).await;
        Ok(())
    }
}
