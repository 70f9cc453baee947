use crate::actions::{self, RecalibrateButton};
use crate::client::DeviceClient;
use crate::config::Config;
use crate::display;
use crate::gamepad::GamepadAction;
use crate::motors::{self, MAX_DUTY, PwmCommand};
use crate::surface::{Control, ControlSurface, DashboardState};
use crate::telemetry::OrientationSample;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::info;

/// Results delivered back to the UI loop by background tasks.
#[derive(Debug)]
pub enum AppEvent {
    Telemetry(OrientationSample),
    RecalibrateSettled,
}

/// Outbound work produced by handling input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    SetPwm(PwmCommand),
    Recalibrate,
}

pub struct App {
    pub state: DashboardState,
    pub recalibrate: RecalibrateButton,
    pub device_url: String,
    pub running: bool,
    pub commands_sent: u64,
    pub samples_received: u64,
    focus: usize,
    keyboard_enabled: bool,
    keyboard_step: u8,
    coarse_step: u8,
}

impl App {
    pub fn new(config: &Config) -> Self {
        Self {
            state: DashboardState::new(config.display.history_len),
            recalibrate: RecalibrateButton::default(),
            device_url: config.device.base_url.clone(),
            running: true,
            commands_sent: 0,
            samples_received: 0,
            focus: 0,
            keyboard_enabled: config.controls.keyboard_enabled,
            keyboard_step: config.controls.keyboard_step,
            coarse_step: config.controls.coarse_step,
        }
    }

    pub fn focused(&self) -> Control {
        Control::ALL[self.focus]
    }

    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Telemetry(sample) => {
                display::update_orientation(&mut self.state, &sample);
                self.samples_received += 1;
            }
            AppEvent::RecalibrateSettled => {
                self.recalibrate.settle();
                info!("recalibration settled");
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Request> {
        // In raw mode Ctrl+C arrives as a key, not a signal.
        let chorded = key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.running = false;
                None
            }
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
                None
            }
            _ if chorded => None,
            KeyCode::Char(' ') | KeyCode::Char('x') => Some(self.emergency_stop()),
            KeyCode::Char('c') => self.trigger_recalibrate(),
            KeyCode::Tab | KeyCode::Down => {
                self.focus = (self.focus + 1) % Control::ALL.len();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = (self.focus + Control::ALL.len() - 1) % Control::ALL.len();
                None
            }
            _ if !self.keyboard_enabled => None,
            KeyCode::Right => self.nudge(self.keyboard_step as i16),
            KeyCode::Left => self.nudge(-(self.keyboard_step as i16)),
            KeyCode::PageUp => self.nudge(self.coarse_step as i16),
            KeyCode::PageDown => self.nudge(-(self.coarse_step as i16)),
            KeyCode::Home => self.set_focused(0),
            KeyCode::End => self.set_focused(MAX_DUTY),
            _ => None,
        }
    }

    pub fn apply_gamepad(&mut self, action: GamepadAction) -> Option<Request> {
        match action {
            GamepadAction::Throttle(value) => Some(self.set_control(Control::Master, value)),
            GamepadAction::EmergencyStop => Some(self.emergency_stop()),
            GamepadAction::Recalibrate => self.trigger_recalibrate(),
        }
    }

    /// Hand a request to the device client. Nothing here waits for a reply.
    pub fn dispatch(
        &mut self,
        request: Request,
        client: &DeviceClient,
        tx: &mpsc::UnboundedSender<AppEvent>,
    ) {
        match request {
            Request::SetPwm(command) => {
                self.commands_sent += 1;
                client.send_pwm_detached(command);
            }
            Request::Recalibrate => {
                let client = client.clone();
                actions::spawn_recalibration(async move { client.recalibrate().await }, tx.clone());
            }
        }
    }

    fn emergency_stop(&mut self) -> Request {
        info!("emergency stop");
        Request::SetPwm(actions::emergency_stop(&mut self.state))
    }

    fn trigger_recalibrate(&mut self) -> Option<Request> {
        if self.recalibrate.trigger() {
            info!("recalibration requested");
            Some(Request::Recalibrate)
        } else {
            None
        }
    }

    // A range input only fires when its value changes.
    fn nudge(&mut self, delta: i16) -> Option<Request> {
        let control = self.focused();
        let current = self.state.read_channel(control);
        let value = (current as i16 + delta).clamp(0, MAX_DUTY as i16) as u8;
        if value == current {
            return None;
        }
        Some(self.set_control(control, value))
    }

    fn set_focused(&mut self, value: u8) -> Option<Request> {
        let control = self.focused();
        if self.state.read_channel(control) == value {
            return None;
        }
        Some(self.set_control(control, value))
    }

    fn set_control(&mut self, control: Control, value: u8) -> Request {
        let command = match control {
            Control::Motor(channel) => motors::set_channel(&mut self.state, channel, value),
            Control::Master => {
                info!(value, "sync all motors");
                motors::sync_all(&mut self.state, value)
            }
        };
        Request::SetPwm(command)
    }
}
