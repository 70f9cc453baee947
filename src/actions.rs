use crate::app::AppEvent;
use crate::client::DeviceError;
use crate::motors::{MotorChannel, PwmCommand};
use crate::surface::{Control, ControlSurface};
use std::future::Future;
use std::mem;
use strum::IntoEnumIterator;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::trace;

pub const RECALIBRATE_LABEL: &str = "Recalibrate";
pub const CALIBRATING_LABEL: &str = "Calibrating...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecalibrateState {
    Idle,
    Calibrating { original_label: String },
}

/// The recalibrate button: disabled and relabelled while a request is out.
///
/// There is no timeout. If the device never answers, the button stays busy.
#[derive(Debug, Clone)]
pub struct RecalibrateButton {
    label: String,
    enabled: bool,
    state: RecalibrateState,
}

impl Default for RecalibrateButton {
    fn default() -> Self {
        Self::new(RECALIBRATE_LABEL)
    }
}

impl RecalibrateButton {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            enabled: true,
            state: RecalibrateState::Idle,
        }
    }

    /// Idle -> Calibrating. Returns false (and does nothing) while disabled.
    pub fn trigger(&mut self) -> bool {
        if !self.is_enabled() {
            return false;
        }
        let original_label = mem::replace(&mut self.label, CALIBRATING_LABEL.to_string());
        self.enabled = false;
        self.state = RecalibrateState::Calibrating { original_label };
        true
    }

    /// Calibrating -> Idle on any response, success or not.
    pub fn settle(&mut self) {
        if let RecalibrateState::Calibrating { original_label } =
            mem::replace(&mut self.state, RecalibrateState::Idle)
        {
            self.label = original_label;
            self.enabled = true;
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_calibrating(&self) -> bool {
        matches!(self.state, RecalibrateState::Calibrating { .. })
    }
}

/// Run the recalibration request and report back once it settles either way.
pub fn spawn_recalibration<Fut>(request: Fut, tx: mpsc::UnboundedSender<AppEvent>) -> JoinHandle<()>
where
    Fut: Future<Output = Result<(), DeviceError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = request.await {
            trace!(error = %e, "recalibrate request failed");
        }
        let _ = tx.send(AppEvent::RecalibrateSettled);
    })
}

/// Zero every motor and the master slider, whatever else is going on.
pub fn emergency_stop(surface: &mut impl ControlSurface) -> PwmCommand {
    for channel in MotorChannel::iter() {
        surface.write_channel(Control::Motor(channel), 0);
        surface.write_label(Control::Motor(channel), "0%".to_string());
    }
    surface.write_channel(Control::Master, 0);
    surface.write_label(Control::Master, "0%".to_string());
    PwmCommand::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motors::{set_channel, sync_all};
    use crate::surface::DashboardState;
    use reqwest::StatusCode;
    use tokio::time::{self, Duration};

    #[test]
    fn button_walks_idle_calibrating_idle() {
        let mut button = RecalibrateButton::default();
        assert_eq!(button.label(), "Recalibrate");
        assert!(button.is_enabled());

        assert!(button.trigger());
        assert_eq!(button.label(), "Calibrating...");
        assert!(!button.is_enabled());
        assert!(button.is_calibrating());
        assert_eq!(
            button.state,
            RecalibrateState::Calibrating {
                original_label: "Recalibrate".to_string()
            }
        );

        button.settle();
        assert_eq!(button.label(), "Recalibrate");
        assert!(button.is_enabled());
        assert!(!button.is_calibrating());
        assert_eq!(button.state, RecalibrateState::Idle);
    }

    #[test]
    fn disabled_button_ignores_triggers() {
        let mut button = RecalibrateButton::new("Level");
        assert!(button.trigger());
        assert!(!button.trigger());
        button.settle();
        assert_eq!(button.label(), "Level");
        button.settle();
        assert_eq!(button.label(), "Level");
    }

    #[tokio::test(start_paused = true)]
    async fn settles_after_failed_request() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut button = RecalibrateButton::default();
        button.trigger();

        spawn_recalibration(
            async {
                time::sleep(Duration::from_secs(2)).await;
                Err::<(), _>(DeviceError::Status(StatusCode::SERVICE_UNAVAILABLE))
            },
            tx,
        );
        assert_eq!(button.label(), "Calibrating...");

        assert!(matches!(rx.recv().await, Some(AppEvent::RecalibrateSettled)));
        button.settle();
        assert_eq!(button.label(), "Recalibrate");
        assert!(button.is_enabled());
    }

    #[test]
    fn emergency_stop_zeroes_everything() {
        let mut state = DashboardState::new(15);
        sync_all(&mut state, 180);
        set_channel(&mut state, MotorChannel::M2, 255);

        let command = emergency_stop(&mut state);

        assert_eq!(command, PwmCommand::default());
        for control in Control::ALL {
            assert_eq!(state.read_channel(control), 0);
            assert_eq!(state.label(control), "0%");
        }
    }

    #[test]
    fn emergency_stop_works_while_calibrating() {
        let mut state = DashboardState::new(15);
        let mut button = RecalibrateButton::default();
        sync_all(&mut state, 90);
        button.trigger();

        emergency_stop(&mut state);

        assert_eq!(state.read_channel(Control::Master), 0);
        assert!(!button.is_enabled());
    }
}
