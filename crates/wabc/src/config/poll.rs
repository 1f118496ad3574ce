use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use wabc_core::BusTransport;
use wabc_devices::{board::Board, devices::sensors::SensorKind};

pub type SharedBoard<B> = Arc<Mutex<Board<B>>>;

pub fn lock_board<B>(board: &SharedBoard<B>) -> MutexGuard<'_, Board<B>> {
    match board.lock() {
        Ok(board) => board,
        Err(poisoned) => poisoned.into_inner(),
    }
}

pub fn spawn_sensor_poll_task<B>(
    board: SharedBoard<B>,
    kind: SensorKind,
    period_ms: u64,
    cancel_token: CancellationToken,
) -> JoinHandle<()>
where
    B: BusTransport + Send + 'static,
    B::Error: Send,
{
    tokio::spawn(async move {
        loop {
            let reading = lock_board(&board).read(kind);
            match reading {
                Ok(reading) => info!("{:?}", reading),
                Err(err) => error!("error reading {:?} sensor: {:?}", kind, err),
            }

            tokio::select! {
                _ = cancel_token.cancelled() => break,
                _ = sleep(Duration::from_millis(period_ms)) => {},
            }
        }
        debug!("{:?} sensor poll task shutting down.", kind)
    })
}
