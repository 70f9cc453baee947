use anyhow::{Context, bail};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub device: DeviceConfig,
    pub display: DisplayConfig,
    pub controls: ControlsConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    pub history_len: usize,
    pub frame_rate: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    pub keyboard_enabled: bool,
    pub keyboard_step: u8,
    pub coarse_step: u8,
    pub joystick: JoystickConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoystickConfig {
    pub enabled: bool,
    pub throttle_axis: String,
    pub invert_throttle: bool,
    pub deadzone: f32,
    pub stop_button: String,
    pub recalibrate_button: String,
    pub fallback_axes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugConfig {
    pub log_file: String,
    pub log_level: String,
    pub log_input_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DeviceConfig {
                // ESP32 soft-AP default address
                base_url: "http://192.168.4.1/".to_string(),
                poll_interval_ms: 100,
            },
            display: DisplayConfig {
                history_len: 15,
                frame_rate: 30,
            },
            controls: ControlsConfig {
                keyboard_enabled: true,
                keyboard_step: 5,
                coarse_step: 25,
                joystick: JoystickConfig {
                    enabled: true,
                    throttle_axis: "RightZ".to_string(),
                    invert_throttle: false,
                    deadzone: 0.05,
                    stop_button: "South".to_string(),
                    recalibrate_button: "Start".to_string(),
                    fallback_axes: vec![
                        "LeftStickY".to_string(),
                        "LeftZ".to_string(),
                    ],
                },
            },
            debug: DebugConfig {
                log_file: "dashboard.log".to_string(),
                log_level: "info".to_string(),
                log_input_values: false,
            },
        }
    }
}

impl Config {
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("parsing config {}", path.display()))?;
            Ok(config)
        } else {
            let default_config = Config::default();
            let toml_string = toml::to_string_pretty(&default_config)?;
            fs::write(path, toml_string)
                .with_context(|| format!("writing default config {}", path.display()))?;
            println!("Created default config file at {}", path.display());
            Ok(default_config)
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.device.base_url)
            .with_context(|| format!("invalid device.base_url {:?}", self.device.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("device.base_url must be http or https, got {}", url.scheme());
        }
        if self.device.poll_interval_ms == 0 {
            bail!("device.poll_interval_ms must be greater than zero");
        }
        if !(1..=1000).contains(&self.display.history_len) {
            bail!("display.history_len must be in 1..=1000, got {}", self.display.history_len);
        }
        if !(1..=240).contains(&self.display.frame_rate) {
            bail!("display.frame_rate must be in 1..=240, got {}", self.display.frame_rate);
        }
        let deadzone = self.controls.joystick.deadzone;
        if !(0.0..1.0).contains(&deadzone) {
            bail!("controls.joystick.deadzone must be in [0, 1), got {}", deadzone);
        }
        Ok(())
    }
}

// Helper to parse axis names to gilrs Axis enum
pub fn parse_axis_name(name: &str) -> Option<gilrs::Axis> {
    match name {
        "LeftStickX" => Some(gilrs::Axis::LeftStickX),
        "LeftStickY" => Some(gilrs::Axis::LeftStickY),
        "LeftZ" => Some(gilrs::Axis::LeftZ),
        "RightStickX" => Some(gilrs::Axis::RightStickX),
        "RightStickY" => Some(gilrs::Axis::RightStickY),
        "RightZ" => Some(gilrs::Axis::RightZ),
        "DPadX" => Some(gilrs::Axis::DPadX),
        "DPadY" => Some(gilrs::Axis::DPadY),
        _ => None,
    }
}

pub fn parse_button_name(name: &str) -> Option<gilrs::Button> {
    match name {
        "South" => Some(gilrs::Button::South),
        "East" => Some(gilrs::Button::East),
        "North" => Some(gilrs::Button::North),
        "West" => Some(gilrs::Button::West),
        "LeftTrigger" => Some(gilrs::Button::LeftTrigger),
        "RightTrigger" => Some(gilrs::Button::RightTrigger),
        "Select" => Some(gilrs::Button::Select),
        "Start" => Some(gilrs::Button::Start),
        "Mode" => Some(gilrs::Button::Mode),
        _ => None,
    }
}
