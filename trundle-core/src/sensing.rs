//! Sensor acquisition
//!
//! Produces one immutable [`SensorFrame`] per sampling tick: the 8 raw line
//! channels, the ambient light pair, the latest distance estimate, and the
//! buttons inverted to active-high. The ultrasonic ranger is refreshed on its
//! own slower sub-cadence so a slow echo never holds up the main tick; a
//! timed-out or zero-length ping reads as maximum range, not as an error.

use embassy_time::{Duration, Instant};

use crate::hal::{AmbientLight, Board, ButtonPad, DistanceSensor, LineArray};

/// Analog midpoint above which a line channel counts as "line present"
pub const LINE_THRESHOLD: u16 = 500;

/// Distance reported when the echo times out or exceeds the sensor's reach
pub const DISTANCE_MAX_CM: u16 = 400;

/// Sub-cadence for ultrasonic refreshes, independent of the sampling tick
pub const DISTANCE_PERIOD: Duration = Duration::from_millis(100);

/// Immutable snapshot of all inputs at one sampling instant
#[derive(Debug, Clone, Copy)]
pub struct SensorFrame {
    /// Raw reflectance intensities, leftmost channel first
    pub line: [u16; 8],
    /// Left and right ambient light readings
    pub ambient: [u16; 2],
    /// Obstacle distance in centimeters, capped at [`DISTANCE_MAX_CM`]
    pub distance_cm: u16,
    /// Button states, active-high
    pub buttons: [bool; 4],
    pub timestamp: Instant,
}

impl SensorFrame {
    /// Frame used before the first sampling tick has run
    pub fn empty(timestamp: Instant) -> Self {
        Self {
            line: [0; 8],
            ambient: [0; 2],
            distance_cm: DISTANCE_MAX_CM,
            buttons: [false; 4],
            timestamp,
        }
    }

    /// Thresholded view of one line channel; out-of-range index reads false
    pub fn line_detected(&self, channel: usize) -> bool {
        self.line.get(channel).is_some_and(|&v| v > LINE_THRESHOLD)
    }
}

/// Acquisition state: owns the distance sub-cadence and its held value
pub struct SensorPoller {
    next_distance: Instant,
    distance_cm: u16,
}

impl SensorPoller {
    pub fn new(start: Instant) -> Self {
        Self {
            next_distance: start,
            distance_cm: DISTANCE_MAX_CM,
        }
    }

    /// Take one sampling tick and produce a fresh frame.
    pub fn sample<B: Board>(&mut self, board: &mut B, now: Instant) -> SensorFrame {
        let line = board.lines().read();
        let ambient = board.ambient().read();

        // Buttons are wired active-low; report them active-high.
        let raw = board.buttons().read_raw();
        let buttons = [!raw[0], !raw[1], !raw[2], !raw[3]];

        if now >= self.next_distance {
            self.distance_cm = match board.distance().measure() {
                Some(d) if d > 0 => d.min(DISTANCE_MAX_CM),
                _ => DISTANCE_MAX_CM,
            };
            self.next_distance = now + DISTANCE_PERIOD;
        }

        SensorFrame {
            line,
            ambient,
            distance_cm: self.distance_cm,
            buttons,
            timestamp: now,
        }
    }
}
