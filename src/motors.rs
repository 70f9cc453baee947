use crate::surface::{Control, ControlSurface};
use serde::Serialize;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub const MAX_DUTY: u8 = 255;

#[derive(Debug, EnumIter, Clone, Copy, Eq, PartialEq, Hash)]
pub enum MotorChannel {
    M1,
    M2,
    M3,
    M4,
}

impl MotorChannel {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            MotorChannel::M1 => "m1",
            MotorChannel::M2 => "m2",
            MotorChannel::M3 => "m3",
            MotorChannel::M4 => "m4",
        }
    }
}

// Field order is the query order on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PwmCommand {
    pub m1: u8,
    pub m2: u8,
    pub m3: u8,
    pub m4: u8,
}

impl PwmCommand {
    pub fn snapshot(surface: &impl ControlSurface) -> Self {
        Self {
            m1: surface.read_channel(Control::Motor(MotorChannel::M1)),
            m2: surface.read_channel(Control::Motor(MotorChannel::M2)),
            m3: surface.read_channel(Control::Motor(MotorChannel::M3)),
            m4: surface.read_channel(Control::Motor(MotorChannel::M4)),
        }
    }
}

pub fn percent(value: u8) -> u8 {
    (value as f64 / MAX_DUTY as f64 * 100.0).round() as u8
}

pub fn percent_label(value: u8) -> String {
    format!("{}%", percent(value))
}

// The master slider is left alone.
pub fn set_channel(
    surface: &mut impl ControlSurface,
    channel: MotorChannel,
    value: u8,
) -> PwmCommand {
    let control = Control::Motor(channel);
    surface.write_channel(control, value);
    surface.write_label(control, percent_label(value));
    PwmCommand::snapshot(surface)
}

pub fn sync_all(surface: &mut impl ControlSurface, value: u8) -> PwmCommand {
    let label = percent_label(value);
    for channel in MotorChannel::iter() {
        surface.write_channel(Control::Motor(channel), value);
        surface.write_label(Control::Motor(channel), label.clone());
    }
    surface.write_channel(Control::Master, value);
    surface.write_label(Control::Master, label);
    PwmCommand::snapshot(surface)
}
