use crate::display::{Attitude, LogRow, TelemetryLog};
use crate::motors::{MotorChannel, percent_label};

/// One of the five sliders on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Motor(MotorChannel),
    Master,
}

impl Control {
    pub const ALL: [Control; 5] = [
        Control::Motor(MotorChannel::M1),
        Control::Motor(MotorChannel::M2),
        Control::Motor(MotorChannel::M3),
        Control::Motor(MotorChannel::M4),
        Control::Master,
    ];

    pub fn index(self) -> usize {
        match self {
            Control::Motor(channel) => channel.index(),
            Control::Master => 4,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Control::Motor(channel) => channel.name(),
            Control::Master => "master",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readout {
    Pitch,
    Roll,
}

/// What the dashboard logic needs from whatever draws it.
pub trait ControlSurface {
    fn read_channel(&self, control: Control) -> u8;
    fn write_channel(&mut self, control: Control, value: u8);
    fn write_label(&mut self, control: Control, text: String);
    fn append_log_row(&mut self, row: LogRow);
    fn write_attitude(&mut self, attitude: Attitude);
    fn write_readout(&mut self, readout: Readout, text: String);
}

/// Everything the terminal UI shows. Only the UI loop mutates it.
#[derive(Debug, Clone)]
pub struct DashboardState {
    values: [u8; 5],
    labels: [String; 5],
    attitude: Attitude,
    pitch_readout: String,
    roll_readout: String,
    log: TelemetryLog,
}

impl DashboardState {
    pub fn new(history_len: usize) -> Self {
        Self {
            values: [0; 5],
            labels: std::array::from_fn(|_| percent_label(0)),
            attitude: Attitude::default(),
            pitch_readout: "--".to_string(),
            roll_readout: "--".to_string(),
            log: TelemetryLog::new(history_len),
        }
    }

    pub fn label(&self, control: Control) -> &str {
        &self.labels[control.index()]
    }

    pub fn attitude(&self) -> Attitude {
        self.attitude
    }

    pub fn readout(&self, readout: Readout) -> &str {
        match readout {
            Readout::Pitch => &self.pitch_readout,
            Readout::Roll => &self.roll_readout,
        }
    }

    pub fn log(&self) -> &TelemetryLog {
        &self.log
    }
}

impl ControlSurface for DashboardState {
    fn read_channel(&self, control: Control) -> u8 {
        self.values[control.index()]
    }

    fn write_channel(&mut self, control: Control, value: u8) {
        self.values[control.index()] = value;
    }

    fn write_label(&mut self, control: Control, text: String) {
        self.labels[control.index()] = text;
    }

    fn append_log_row(&mut self, row: LogRow) {
        self.log.push(row);
    }

    fn write_attitude(&mut self, attitude: Attitude) {
        self.attitude = attitude;
    }

    fn write_readout(&mut self, readout: Readout, text: String) {
        match readout {
            Readout::Pitch => self.pitch_readout = text,
            Readout::Roll => self.roll_readout = text,
        }
    }
}
