//! Motion actuation
//!
//! Turns a desired wheel-speed pair into direction + duty signals: trims are
//! added, the result is clamped to the signed device duty range, and the sign
//! picks the H-bridge direction. Out-of-range input is silently saturated by
//! design, never an error. Zero duty brakes, it does not coast.

use crate::calibration::CalibrationOffsets;
use crate::hal::{MotorDriver, WheelDirection, WheelDrive};

/// Maximum PWM duty magnitude the driver accepts
pub const DUTY_MAX: i16 = 255;

/// Desired wheel motion, in signed duty units, before trim and clamping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionCommand {
    pub left: i16,
    pub right: i16,
}

impl MotionCommand {
    pub const STOP: MotionCommand = MotionCommand { left: 0, right: 0 };

    /// Straight-line motion at a percentage of full speed
    pub fn forward(percent: u8) -> Self {
        let duty = percent_to_duty(percent);
        Self {
            left: duty,
            right: duty,
        }
    }

    pub fn backward(percent: u8) -> Self {
        let duty = percent_to_duty(percent);
        Self {
            left: -duty,
            right: -duty,
        }
    }

    /// Turn in place; positive duty spins left wheel forward, right reverse.
    pub fn spin(duty: i16) -> Self {
        Self {
            left: duty,
            right: -duty,
        }
    }

    /// Joystick vector mapping: `left = y + x`, `right = y − x`, each clamped
    /// to ±100 and then scaled onto the device duty range.
    pub fn from_joystick(x: i8, y: i8) -> Self {
        let x = (x as i16).clamp(-100, 100);
        let y = (y as i16).clamp(-100, 100);
        let left = (y + x).clamp(-100, 100);
        let right = (y - x).clamp(-100, 100);
        Self {
            left: scale_percent(left),
            right: scale_percent(right),
        }
    }
}

/// Map 0..=100 % onto 0..=255 duty
pub fn percent_to_duty(percent: u8) -> i16 {
    (percent.min(100) as i32 * DUTY_MAX as i32 / 100) as i16
}

/// Map a signed −100..=100 value onto −255..=255 duty
fn scale_percent(value: i16) -> i16 {
    (value as i32 * DUTY_MAX as i32 / 100) as i16
}

/// Derive the per-wheel signal from a signed, already-clamped duty
fn wheel(duty: i16) -> WheelDrive {
    if duty > 0 {
        WheelDrive {
            direction: WheelDirection::Forward,
            duty: duty as u8,
        }
    } else if duty < 0 {
        WheelDrive {
            direction: WheelDirection::Reverse,
            duty: (-duty) as u8,
        }
    } else {
        WheelDrive::BRAKE
    }
}

/// Owns the trim state and the final device-range signal
pub struct MotionActuator {
    trims: CalibrationOffsets,
    current: (i16, i16),
}

impl MotionActuator {
    pub fn new(trims: CalibrationOffsets) -> Self {
        Self {
            trims,
            current: (0, 0),
        }
    }

    pub fn trims(&self) -> CalibrationOffsets {
        self.trims
    }

    pub fn set_trims(&mut self, trims: CalibrationOffsets) {
        self.trims = trims;
    }

    /// Last applied post-trim duty pair (left, right)
    pub fn current(&self) -> (i16, i16) {
        self.current
    }

    /// Apply trims, saturate to the device range, and write both wheels as a
    /// pair.
    pub fn set_motion<M: MotorDriver>(&mut self, motor: &mut M, cmd: MotionCommand) {
        let left = (cmd.left + self.trims.left).clamp(-DUTY_MAX, DUTY_MAX);
        let right = (cmd.right + self.trims.right).clamp(-DUTY_MAX, DUTY_MAX);
        self.current = (left, right);
        motor.apply(wheel(left), wheel(right));
    }

    pub fn stop<M: MotorDriver>(&mut self, motor: &mut M) {
        self.set_motion(motor, MotionCommand::STOP);
    }
}
