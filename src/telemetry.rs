use crate::app::AppEvent;
use crate::client::DeviceError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, MissedTickBehavior};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Orientation {
    pub pitch: f64,
    pub roll: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrientationSample {
    pub pitch: f64,
    pub roll: f64,
    pub timestamp: String,
}

impl OrientationSample {
    pub fn stamp(orientation: Orientation) -> Self {
        Self {
            pitch: orientation.pitch,
            roll: orientation.roll,
            timestamp: Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// Every tick starts its own request without waiting on the previous one, so
/// samples arrive in completion order. Failed ticks produce nothing.
pub fn spawn_poller<F, Fut>(
    period: Duration,
    fetch: F,
    tx: mpsc::UnboundedSender<AppEvent>,
) -> JoinHandle<()>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Orientation, DeviceError>> + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            if tx.is_closed() {
                debug!("telemetry receiver closed, stopping poller");
                break;
            }

            let request = fetch();
            let tx = tx.clone();
            tokio::spawn(async move {
                match request.await {
                    Ok(orientation) => {
                        let _ = tx.send(AppEvent::Telemetry(OrientationSample::stamp(orientation)));
                    }
                    Err(e) => trace!(error = %e, "telemetry tick dropped"),
                }
            });
        }
    })
}
