//! Orientation estimation
//!
//! Complementary-style attitude estimate: yaw comes from integrating the
//! z-axis gyro rate over the fixed update period (no bias compensation),
//! pitch and roll come from arctangent tilt formulas on the accelerometer.
//! The yaw accumulator is unbounded; reported yaw is always the accumulator
//! minus a reference offset, and "reset yaw" only moves the offset, so
//! repeated resets are idempotent on the reported value.

use embassy_time::Duration;
use libm::{atan2f, sqrtf};

use crate::hal::ImuSample;

/// Estimator update cadence (100 Hz)
pub const UPDATE_PERIOD: Duration = Duration::from_millis(10);

/// Fixed integration step matching [`UPDATE_PERIOD`]
const DT_S: f32 = 0.010;

/// Robot attitude state; single writer is the estimator itself
pub struct OrientationEstimator {
    yaw_accum: f32,
    yaw_offset: f32,
    pitch: f32,
    roll: f32,
}

impl Default for OrientationEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationEstimator {
    pub fn new() -> Self {
        Self {
            yaw_accum: 0.0,
            yaw_offset: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }

    /// Fold one inertial sample into the estimate.
    pub fn update(&mut self, sample: &ImuSample) {
        self.yaw_accum += sample.gyro_z_dps * DT_S;

        let (ax, ay, az) = (sample.accel_x, sample.accel_y, sample.accel_z);
        self.pitch = atan2f(ax, sqrtf(ay * ay + az * az)).to_degrees();
        self.roll = atan2f(ay, az).to_degrees();
    }

    /// Reported yaw in degrees: accumulator minus the reference offset
    pub fn yaw(&self) -> f32 {
        self.yaw_accum - self.yaw_offset
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn roll(&self) -> f32 {
        self.roll
    }

    /// Zero the reported yaw without touching the accumulator.
    pub fn reset_yaw(&mut self) {
        self.yaw_offset = self.yaw_accum;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(gyro_z_dps: f32, ax: f32, ay: f32, az: f32) -> ImuSample {
        ImuSample {
            gyro_z_dps,
            accel_x: ax,
            accel_y: ay,
            accel_z: az,
        }
    }

    #[test]
    fn yaw_integrates_gyro_rate() {
        let mut est = OrientationEstimator::new();
        // 90 deg/s for one second of 10 ms steps.
        for _ in 0..100 {
            est.update(&sample(90.0, 0.0, 0.0, 1.0));
        }
        assert!((est.yaw() - 90.0).abs() < 1e-3);
    }

    #[test]
    fn yaw_accumulates_past_360_without_wraparound() {
        let mut est = OrientationEstimator::new();
        for _ in 0..500 {
            est.update(&sample(100.0, 0.0, 0.0, 1.0));
        }
        assert!((est.yaw() - 500.0).abs() < 1e-2);
    }

    #[test]
    fn level_pose_reads_zero_tilt() {
        let mut est = OrientationEstimator::new();
        est.update(&sample(0.0, 0.0, 0.0, 1.0));
        assert!(est.pitch().abs() < 1e-4);
        assert!(est.roll().abs() < 1e-4);
    }

    #[test]
    fn forty_five_degree_pitch_from_accel() {
        let mut est = OrientationEstimator::new();
        // Gravity split equally between x and z.
        est.update(&sample(0.0, 0.7071, 0.0, 0.7071));
        assert!((est.pitch() - 45.0).abs() < 0.01);
        assert!(est.roll().abs() < 1e-4);
    }

    #[test]
    fn roll_from_y_versus_z() {
        let mut est = OrientationEstimator::new();
        est.update(&sample(0.0, 0.0, 0.5, 0.8660));
        assert!((est.roll() - 30.0).abs() < 0.01);
    }

    #[test]
    fn reset_yaw_is_idempotent_on_reported_value() {
        let mut est = OrientationEstimator::new();
        for _ in 0..50 {
            est.update(&sample(40.0, 0.0, 0.0, 1.0));
        }
        assert!(est.yaw() > 1.0);

        est.reset_yaw();
        assert!(est.yaw().abs() < 1e-6);
        est.reset_yaw();
        assert!(est.yaw().abs() < 1e-6);

        // The accumulator keeps running underneath.
        est.update(&sample(100.0, 0.0, 0.0, 1.0));
        assert!((est.yaw() - 1.0).abs() < 1e-3);
    }
}
