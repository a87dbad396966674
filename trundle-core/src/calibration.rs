//! Trim calibration
//!
//! Per-wheel trim offsets counteract mechanical asymmetry. Manual calibration
//! accepts explicit values clamped to the trim bound. Auto-calibration is a
//! steppable routine: drive straight with zero trims, let the drivetrain
//! settle, measure yaw drift over a fixed window, then bias the trim of the
//! wheel opposite the drift. Results persist through the storage collaborator;
//! storage faults degrade to defaults and are never fatal.

use embassy_time::{Duration, Instant};

use crate::hal::{MotorDriver, TrimStore};
use crate::motion::{MotionActuator, MotionCommand};
use crate::orientation::OrientationEstimator;

/// Symmetric trim bound, in duty units
pub const TRIM_LIMIT: i16 = 50;

/// Straight-drive duty used while measuring drift
const TEST_DUTY: i16 = 100;

/// Settle time before the measurement window opens
const SETTLE: Duration = Duration::from_millis(500);

/// Drift measurement window
const MEASURE_WINDOW: Duration = Duration::from_secs(2);

/// Trim units applied per degree of measured drift
const DRIFT_GAIN: f32 = 2.0;

/// Per-wheel trim correction added to commanded duty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationOffsets {
    pub left: i16,
    pub right: i16,
}

impl CalibrationOffsets {
    /// Build offsets with both sides clamped to ±[`TRIM_LIMIT`]
    pub fn clamped(left: i16, right: i16) -> Self {
        Self {
            left: left.clamp(-TRIM_LIMIT, TRIM_LIMIT),
            right: right.clamp(-TRIM_LIMIT, TRIM_LIMIT),
        }
    }

    /// Zero out any side that falls outside the bound (a corrupt record must
    /// not bias the drivetrain).
    pub fn sanitized(self) -> Self {
        let keep = |v: i16| if v.abs() > TRIM_LIMIT { 0 } else { v };
        Self {
            left: keep(self.left),
            right: keep(self.right),
        }
    }
}

/// Map measured yaw drift onto a one-sided trim correction.
///
/// Positive drift means the robot veered toward the right wheel's side, so
/// the right trim is biased upward; negative drift mirrors onto the left.
/// The non-biased wheel is left at zero.
pub fn trims_from_drift(drift_deg: f32) -> CalibrationOffsets {
    if drift_deg > 0.0 {
        CalibrationOffsets {
            left: 0,
            right: ((drift_deg * DRIFT_GAIN) as i16).clamp(0, TRIM_LIMIT),
        }
    } else {
        CalibrationOffsets {
            left: ((-drift_deg * DRIFT_GAIN) as i16).clamp(0, TRIM_LIMIT),
            right: 0,
        }
    }
}

/// Load persisted trims, degrading to zeros on absence or fault
pub fn load_or_default<S: TrimStore>(store: &mut S) -> CalibrationOffsets {
    match store.load() {
        Ok(Some(trims)) => {
            let trims = trims.sanitized();
            info!("trims loaded: L={} R={}", trims.left, trims.right);
            trims
        }
        Ok(None) => {
            info!("no stored trims, using defaults");
            CalibrationOffsets::default()
        }
        Err(_) => {
            warn!("trim load failed, using defaults");
            CalibrationOffsets::default()
        }
    }
}

/// Persist trims, logging on fault but never propagating it
pub fn persist<S: TrimStore>(store: &mut S, trims: &CalibrationOffsets) {
    match store.save(trims) {
        Ok(()) => info!("trims saved: L={} R={}", trims.left, trims.right),
        Err(_) => error!("trim save failed"),
    }
}

enum Phase {
    Idle,
    Settle {
        until: Instant,
    },
    Measure {
        until: Instant,
        start_yaw: f32,
    },
}

/// Steppable drift-based auto-calibration routine
pub struct AutoCalibration {
    phase: Phase,
    prior: CalibrationOffsets,
}

impl Default for AutoCalibration {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoCalibration {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            prior: CalibrationOffsets::default(),
        }
    }

    pub fn active(&self) -> bool {
        !matches!(self.phase, Phase::Idle)
    }

    /// Begin the routine: reset the yaw reference, drop trims to zero, and
    /// start driving straight at the test duty.
    pub fn start<M: MotorDriver>(
        &mut self,
        actuator: &mut MotionActuator,
        motor: &mut M,
        estimator: &mut OrientationEstimator,
        now: Instant,
    ) {
        info!("auto-calibration: measuring straight-drive drift");
        estimator.reset_yaw();
        self.prior = actuator.trims();
        actuator.set_trims(CalibrationOffsets::default());
        actuator.set_motion(
            motor,
            MotionCommand {
                left: TEST_DUTY,
                right: TEST_DUTY,
            },
        );
        self.phase = Phase::Settle { until: now + SETTLE };
    }

    /// Abandon the routine without deriving trims, restoring whatever trims
    /// were in force before it started. The caller owns the motors and issues
    /// its own motion afterwards.
    pub fn cancel(&mut self, actuator: &mut MotionActuator) {
        if self.active() {
            info!("auto-calibration: cancelled");
            actuator.set_trims(self.prior);
            self.phase = Phase::Idle;
        }
    }

    /// Advance one tick. Returns the derived trims once the measurement
    /// window closes; the caller persists them.
    pub fn step<M: MotorDriver>(
        &mut self,
        actuator: &mut MotionActuator,
        motor: &mut M,
        yaw: f32,
        now: Instant,
    ) -> Option<CalibrationOffsets> {
        match self.phase {
            Phase::Idle => None,
            Phase::Settle { until } => {
                if now >= until {
                    self.phase = Phase::Measure {
                        until: now + MEASURE_WINDOW,
                        start_yaw: yaw,
                    };
                }
                None
            }
            Phase::Measure { until, start_yaw } => {
                if now < until {
                    return None;
                }
                actuator.stop(motor);
                let drift = yaw - start_yaw;
                let trims = trims_from_drift(drift);
                info!(
                    "auto-calibration done: drift={} trims L={} R={}",
                    drift, trims.left, trims.right
                );
                actuator.set_trims(trims);
                self.phase = Phase::Idle;
                Some(trims)
            }
        }
    }
}
