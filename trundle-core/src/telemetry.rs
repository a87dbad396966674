//! Telemetry snapshot
//!
//! One frame per reporting tick, assembled from the latest sensor frame, the
//! attitude estimate, and the active trims, then handed to the sink
//! collaborator. The core never formats or frames bytes; the transport owns
//! the wire representation.

use embassy_time::{Duration, Instant};

use crate::calibration::CalibrationOffsets;
use crate::orientation::OrientationEstimator;
use crate::sensing::SensorFrame;

/// Reporting cadence
pub const TELEMETRY_PERIOD: Duration = Duration::from_millis(100);

/// Battery estimate reported until a charge monitor exists
const BATTERY_PLACEHOLDER: u8 = 100;

/// Everything the robot reports about itself at one instant
#[derive(Debug, Clone, Copy)]
pub struct TelemetryFrame {
    pub battery_percent: u8,
    pub line: [u16; 8],
    pub ambient: [u16; 2],
    pub distance_cm: u16,
    pub yaw: f32,
    pub pitch: f32,
    pub roll: f32,
    pub buttons: [bool; 4],
    pub trims: CalibrationOffsets,
    pub timestamp: Instant,
}

impl TelemetryFrame {
    pub fn assemble(
        sensors: &SensorFrame,
        attitude: &OrientationEstimator,
        trims: CalibrationOffsets,
        now: Instant,
    ) -> Self {
        Self {
            battery_percent: BATTERY_PLACEHOLDER,
            line: sensors.line,
            ambient: sensors.ambient,
            distance_cm: sensors.distance_cm,
            yaw: attitude.yaw(),
            pitch: attitude.pitch(),
            roll: attitude.roll(),
            buttons: sensors.buttons,
            trims,
            timestamp: now,
        }
    }
}
