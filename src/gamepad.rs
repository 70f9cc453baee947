use crate::config::{Config, JoystickConfig, parse_axis_name, parse_button_name};
use crate::motors::MAX_DUTY;
use gilrs::{Axis, Button, Event, EventType, Gilrs};
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamepadAction {
    Throttle(u8),
    EmergencyStop,
    Recalibrate,
}

#[derive(Debug, Default)]
pub struct InputState {
    pub axes: HashMap<Axis, f32>,
}

/// Turns raw gamepad state into dashboard actions.
pub struct GamepadController {
    config: JoystickConfig,
    log_input_values: bool,
    last_throttle: Option<u8>,
}

impl GamepadController {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.controls.joystick.clone(),
            log_input_values: config.debug.log_input_values,
            last_throttle: None,
        }
    }

    /// Emits a throttle action only when the mapped duty actually changes.
    pub fn update(&mut self, input: &InputState) -> Option<GamepadAction> {
        let raw = self.get_throttle_axis_value(input)?;
        let duty = self.map_throttle(raw);

        if self.log_input_values {
            debug!(raw, duty, "throttle axis");
        }

        if self.last_throttle == Some(duty) {
            return None;
        }
        self.last_throttle = Some(duty);
        Some(GamepadAction::Throttle(duty))
    }

    pub fn handle_button(&self, button: Button) -> Option<GamepadAction> {
        if parse_button_name(&self.config.stop_button) == Some(button) {
            Some(GamepadAction::EmergencyStop)
        } else if parse_button_name(&self.config.recalibrate_button) == Some(button) {
            Some(GamepadAction::Recalibrate)
        } else {
            None
        }
    }

    /// Only positive deflection drives the motors, so a centred stick or a
    /// released trigger reads as zero.
    fn map_throttle(&self, raw: f32) -> u8 {
        let value = if self.config.invert_throttle { -raw } else { raw };
        let value = value.clamp(0.0, 1.0);
        if value < self.config.deadzone {
            return 0;
        }
        (value * MAX_DUTY as f32).round() as u8
    }

    fn get_throttle_axis_value(&self, input: &InputState) -> Option<f32> {
        // Try primary axis
        if let Some(axis) = parse_axis_name(&self.config.throttle_axis) {
            if let Some(&value) = input.axes.get(&axis) {
                return Some(value);
            }
        }

        // Try fallback axes
        for fallback_name in &self.config.fallback_axes {
            if let Some(axis) = parse_axis_name(fallback_name) {
                if let Some(&value) = input.axes.get(&axis) {
                    if value.abs() > self.config.deadzone {
                        return Some(value);
                    }
                }
            }
        }

        None
    }
}

/// A gilrs context plus the state accumulated from its events.
pub struct Gamepad {
    gilrs: Gilrs,
    input: InputState,
    controller: GamepadController,
}

impl Gamepad {
    pub fn new(gilrs: Gilrs, config: &Config) -> Self {
        for (_id, pad) in gilrs.gamepads() {
            info!(name = pad.name(), "gamepad found");
        }
        Self {
            gilrs,
            input: InputState::default(),
            controller: GamepadController::new(config),
        }
    }

    /// Drain pending gilrs events and return the resulting actions in order.
    pub fn poll(&mut self) -> Vec<GamepadAction> {
        let mut actions = Vec::new();

        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            match event {
                EventType::ButtonPressed(button, _) => {
                    actions.extend(self.controller.handle_button(button));
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.input.axes.insert(axis, value);
                }
                EventType::Connected => {
                    info!(name = self.gilrs.gamepad(id).name(), "gamepad connected");
                }
                EventType::Disconnected => {
                    info!("gamepad disconnected");
                    self.input = InputState::default();
                }
                _ => {}
            }
        }

        actions.extend(self.controller.update(&self.input));
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> GamepadController {
        GamepadController::new(&Config::default())
    }

    fn input_with(axis: Axis, value: f32) -> InputState {
        let mut input = InputState::default();
        input.axes.insert(axis, value);
        input
    }

    #[test]
    fn maps_positive_deflection_to_duty() {
        let mut pad = controller();
        assert_eq!(
            pad.update(&input_with(Axis::RightZ, 1.0)),
            Some(GamepadAction::Throttle(255))
        );
        assert_eq!(
            pad.update(&input_with(Axis::RightZ, 0.5)),
            Some(GamepadAction::Throttle(128))
        );
        assert_eq!(
            pad.update(&input_with(Axis::RightZ, -1.0)),
            Some(GamepadAction::Throttle(0))
        );
    }

    #[test]
    fn deadzone_and_repeats_are_quiet() {
        let mut pad = controller();
        assert_eq!(
            pad.update(&input_with(Axis::RightZ, 0.02)),
            Some(GamepadAction::Throttle(0))
        );
        assert_eq!(pad.update(&input_with(Axis::RightZ, 0.03)), None);
        assert_eq!(pad.update(&InputState::default()), None);
    }

    #[test]
    fn falls_back_to_secondary_axes() {
        let mut pad = controller();
        assert_eq!(pad.update(&input_with(Axis::LeftStickY, 0.01)), None);
        assert_eq!(
            pad.update(&input_with(Axis::LeftStickY, 1.0)),
            Some(GamepadAction::Throttle(255))
        );
    }

    #[test]
    fn inverted_axis_flips_direction() {
        let mut config = Config::default();
        config.controls.joystick.invert_throttle = true;
        let mut pad = GamepadController::new(&config);
        assert_eq!(
            pad.update(&input_with(Axis::RightZ, -1.0)),
            Some(GamepadAction::Throttle(255))
        );
    }

    #[test]
    fn buttons_map_to_actions() {
        let pad = controller();
        assert_eq!(
            pad.handle_button(Button::South),
            Some(GamepadAction::EmergencyStop)
        );
        assert_eq!(
            pad.handle_button(Button::Start),
            Some(GamepadAction::Recalibrate)
        );
        assert_eq!(pad.handle_button(Button::West), None);
    }
}
