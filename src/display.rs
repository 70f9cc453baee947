use crate::surface::{ControlSurface, Readout};
use crate::telemetry::OrientationSample;
use std::collections::VecDeque;

/// Body rotation in radians, Euler order XYZ. Pitch drives `z`, roll drives `x`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Attitude {
    pub x: f64,
    pub z: f64,
}

impl Attitude {
    pub fn from_degrees(pitch: f64, roll: f64) -> Self {
        Self {
            x: roll.to_radians(),
            z: pitch.to_radians(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    pub time: String,
    pub pitch: f64,
    pub roll: f64,
}

/// Bounded FIFO of telemetry rows. Oldest row is evicted first.
#[derive(Debug, Clone)]
pub struct TelemetryLog {
    rows: VecDeque<LogRow>,
    capacity: usize,
}

impl TelemetryLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, row: LogRow) {
        self.rows.push_back(row);
        while self.rows.len() > self.capacity {
            self.rows.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &LogRow> {
        self.rows.iter()
    }
}

pub fn format_readout(degrees: f64) -> String {
    format!("{:.1}", degrees)
}

/// Apply one telemetry sample to the attitude view, readouts and history.
pub fn update_orientation(surface: &mut impl ControlSurface, sample: &OrientationSample) {
    surface.write_attitude(Attitude::from_degrees(sample.pitch, sample.roll));
    surface.write_readout(Readout::Pitch, format_readout(sample.pitch));
    surface.write_readout(Readout::Roll, format_readout(sample.roll));
    surface.append_log_row(LogRow {
        time: sample.timestamp.clone(),
        pitch: sample.pitch,
        roll: sample.roll,
    });
}

// Flat plate standing in for the airframe: 2 x 0.2 x 2.
const HALF_EXTENTS: [f64; 3] = [1.0, 0.1, 1.0];
const CAMERA_Z: f64 = 5.0;
const FOV_DEGREES: f64 = 75.0;

const BODY_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 3),
    (3, 2),
    (2, 0),
    (4, 5),
    (5, 7),
    (7, 6),
    (6, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

fn body_vertices() -> [[f64; 3]; 8] {
    let [hx, hy, hz] = HALF_EXTENTS;
    std::array::from_fn(|i| {
        let sx = if i & 4 == 0 { -hx } else { hx };
        let sy = if i & 2 == 0 { -hy } else { hy };
        let sz = if i & 1 == 0 { -hz } else { hz };
        [sx, sy, sz]
    })
}

/// Rotate a body-frame point by the attitude (Rx * Rz, y rotation is always zero).
pub fn rotate(attitude: Attitude, [x, y, z]: [f64; 3]) -> [f64; 3] {
    let (sz, cz) = attitude.z.sin_cos();
    let (x1, y1, z1) = (x * cz - y * sz, x * sz + y * cz, z);

    let (sx, cx) = attitude.x.sin_cos();
    [x1, y1 * cx - z1 * sx, y1 * sx + z1 * cx]
}

/// Perspective projection onto [-1, 1] x [-1, 1] for a camera on +z looking at the origin.
pub fn project([x, y, z]: [f64; 3], aspect: f64) -> (f64, f64) {
    let focal = 1.0 / (FOV_DEGREES.to_radians() / 2.0).tan();
    let depth = CAMERA_Z - z;
    (focal * x / (aspect * depth), focal * y / depth)
}

/// Projected edges of the body at the given attitude, ready to draw as lines.
pub fn body_wireframe(attitude: Attitude, aspect: f64) -> Vec<((f64, f64), (f64, f64))> {
    let projected: Vec<(f64, f64)> = body_vertices()
        .into_iter()
        .map(|v| project(rotate(attitude, v), aspect))
        .collect();

    BODY_EDGES
        .iter()
        .map(|&(a, b)| (projected[a], projected[b]))
        .collect()
}
