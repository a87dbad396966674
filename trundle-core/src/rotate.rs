//! Rotate-to-angle maneuver
//!
//! Closed-loop turn by a relative angle, run as a steppable state machine so
//! the rest of the loop keeps ticking while it is active: capture the current
//! reported yaw, spin opposite wheels at a fixed duty toward the target, and
//! stop once the yaw crosses the target or a wall-clock deadline expires.
//! Exactly one stop command is issued on either exit. The outside cannot tell
//! a reached target from a timeout; only the timeout cancels the maneuver.

use embassy_time::{Duration, Instant};

use crate::hal::MotorDriver;
use crate::motion::{MotionActuator, MotionCommand};

/// Fixed spin duty while rotating
const SPIN_DUTY: i16 = 100;

/// Wall-clock bound on the whole maneuver
pub const ROTATE_TIMEOUT: Duration = Duration::from_secs(5);

/// How a rotation ended; logged, not signaled outward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Reached,
    TimedOut,
}

enum State {
    Idle,
    Rotating {
        target: f32,
        positive: bool,
        deadline: Instant,
    },
}

/// Idle → Rotating → (Reached | TimedOut) → Idle
pub struct RotateManeuver {
    state: State,
}

impl Default for RotateManeuver {
    fn default() -> Self {
        Self::new()
    }
}

impl RotateManeuver {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn active(&self) -> bool {
        matches!(self.state, State::Rotating { .. })
    }

    /// Abandon an in-flight rotation without touching the motors; the caller
    /// decides what the wheels do next.
    pub fn cancel(&mut self) {
        if self.active() {
            info!("rotate: cancelled");
        }
        self.state = State::Idle;
    }

    /// Begin a turn by `angle_deg` relative to the current reported yaw.
    /// A new invocation while rotating restarts from the current yaw.
    pub fn start<M: MotorDriver>(
        &mut self,
        actuator: &mut MotionActuator,
        motor: &mut M,
        yaw: f32,
        angle_deg: f32,
        now: Instant,
    ) {
        let positive = angle_deg > 0.0;
        let target = yaw + angle_deg;
        info!("rotate: target {} (from {})", target, yaw);

        let duty = if positive { SPIN_DUTY } else { -SPIN_DUTY };
        actuator.set_motion(motor, MotionCommand::spin(duty));
        self.state = State::Rotating {
            target,
            positive,
            deadline: now + ROTATE_TIMEOUT,
        };
    }

    /// Poll once per tick with the latest reported yaw. Issues the single
    /// final stop and returns the outcome on the tick the maneuver ends.
    pub fn step<M: MotorDriver>(
        &mut self,
        actuator: &mut MotionActuator,
        motor: &mut M,
        yaw: f32,
        now: Instant,
    ) -> Option<Outcome> {
        let State::Rotating {
            target,
            positive,
            deadline,
        } = self.state
        else {
            return None;
        };

        let crossed = if positive { yaw >= target } else { yaw <= target };
        let outcome = if crossed {
            Some(Outcome::Reached)
        } else if now >= deadline {
            Some(Outcome::TimedOut)
        } else {
            None
        };

        if let Some(outcome) = outcome {
            actuator.stop(motor);
            self.state = State::Idle;
            match outcome {
                Outcome::Reached => info!("rotate: target reached"),
                Outcome::TimedOut => warn!("rotate: timed out"),
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationOffsets;
    use crate::hal::{WheelDirection, WheelDrive};
    use crate::testing::SimMotor;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn stop_count(motor: &SimMotor) -> usize {
        motor
            .applies
            .iter()
            .filter(|(l, r)| *l == WheelDrive::BRAKE && *r == WheelDrive::BRAKE)
            .count()
    }

    #[test]
    fn positive_angle_spins_left_forward_right_reverse() {
        let mut motor = SimMotor::new();
        let mut actuator = MotionActuator::new(CalibrationOffsets::default());
        let mut rotate = RotateManeuver::new();

        rotate.start(&mut actuator, &mut motor, 0.0, 90.0, at(0));
        let (l, r) = motor.last().unwrap();
        assert_eq!(l.direction, WheelDirection::Forward);
        assert_eq!(r.direction, WheelDirection::Reverse);
        assert_eq!(l.duty, 100);
    }

    #[test]
    fn reaches_target_and_stops_exactly_once() {
        let mut motor = SimMotor::new();
        let mut actuator = MotionActuator::new(CalibrationOffsets::default());
        let mut rotate = RotateManeuver::new();

        rotate.start(&mut actuator, &mut motor, 0.0, 90.0, at(0));

        // Yaw ramps at 100 deg/s; target crossed well inside one second.
        let mut outcome = None;
        for ms in (10..=1000).step_by(10) {
            let yaw = ms as f32 * 0.1;
            if let Some(o) = rotate.step(&mut actuator, &mut motor, yaw, at(ms)) {
                outcome = Some((o, ms));
                break;
            }
        }
        let (o, ms) = outcome.expect("maneuver should finish");
        assert_eq!(o, Outcome::Reached);
        assert!(ms <= 1000);
        assert_eq!(stop_count(&motor), 1);
        assert!(!rotate.active());

        // Further polls are inert.
        assert!(rotate.step(&mut actuator, &mut motor, 95.0, at(2000)).is_none());
        assert_eq!(stop_count(&motor), 1);
    }

    #[test]
    fn negative_angle_uses_direction_aware_comparison() {
        let mut motor = SimMotor::new();
        let mut actuator = MotionActuator::new(CalibrationOffsets::default());
        let mut rotate = RotateManeuver::new();

        rotate.start(&mut actuator, &mut motor, 10.0, -90.0, at(0));
        // Yaw still above the -80 target: keep rotating.
        assert!(rotate.step(&mut actuator, &mut motor, -50.0, at(100)).is_none());
        let o = rotate.step(&mut actuator, &mut motor, -80.5, at(200));
        assert_eq!(o, Some(Outcome::Reached));
    }

    #[test]
    fn times_out_after_five_seconds_and_stops() {
        let mut motor = SimMotor::new();
        let mut actuator = MotionActuator::new(CalibrationOffsets::default());
        let mut rotate = RotateManeuver::new();

        rotate.start(&mut actuator, &mut motor, 0.0, 90.0, at(0));
        // Yaw never moves.
        assert!(rotate.step(&mut actuator, &mut motor, 0.0, at(4999)).is_none());
        let o = rotate.step(&mut actuator, &mut motor, 0.0, at(5000));
        assert_eq!(o, Some(Outcome::TimedOut));
        assert_eq!(stop_count(&motor), 1);
        assert!(!rotate.active());
    }

    #[test]
    fn zero_angle_finishes_on_first_poll() {
        let mut motor = SimMotor::new();
        let mut actuator = MotionActuator::new(CalibrationOffsets::default());
        let mut rotate = RotateManeuver::new();

        rotate.start(&mut actuator, &mut motor, 42.0, 0.0, at(0));
        let o = rotate.step(&mut actuator, &mut motor, 42.0, at(10));
        assert_eq!(o, Some(Outcome::Reached));
        assert_eq!(stop_count(&motor), 1);
    }
}
