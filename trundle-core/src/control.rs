//! Control loop
//!
//! The single owner of all robot state. Each call to [`ControlLoop::tick`]
//! drains queued commands, then runs whichever periodic work has come due:
//! sensor acquisition, the attitude update, exactly one motion authority
//! (auto-calibration, then an active rotation, then the line follower), LED
//! effects, sound playback, and telemetry. Deadlines re-arm relative to the
//! tick that served them, so a late tick never causes catch-up bursts.

use embassy_time::{Duration, Instant};
use heapless::Deque;

use crate::calibration::{self, AutoCalibration, CalibrationOffsets};
use crate::command::Command;
use crate::effects::{EffectKind, LedEngine, EFFECT_PERIOD};
use crate::hal::{Board, Display, Glyph, InertialSensor, TelemetrySink};
use crate::line_follower::LineFollower;
use crate::motion::{MotionActuator, MotionCommand};
use crate::orientation::{OrientationEstimator, UPDATE_PERIOD};
use crate::rotate::RotateManeuver;
use crate::sensing::{SensorFrame, SensorPoller};
use crate::sound::{Melody, ToneSequencer};
use crate::telemetry::{TelemetryFrame, TELEMETRY_PERIOD};

/// Main sensor sampling cadence
pub const SENSOR_PERIOD: Duration = Duration::from_millis(20);

/// Pending commands held between ticks
const COMMAND_QUEUE_DEPTH: usize = 16;

/// Consecutive inertial read failures before the degradation is logged
const IMU_MISS_LIMIT: u32 = 10;

/// Owns the board and every subsystem; stepped from the outside
pub struct ControlLoop<B: Board> {
    board: B,
    queue: Deque<Command, COMMAND_QUEUE_DEPTH>,
    poller: SensorPoller,
    frame: SensorFrame,
    estimator: OrientationEstimator,
    actuator: MotionActuator,
    follower: LineFollower,
    rotate: RotateManeuver,
    autocal: AutoCalibration,
    leds: LedEngine,
    sound: ToneSequencer,
    imu_misses: u32,
    next_sensor: Instant,
    next_orientation: Instant,
    next_effect: Instant,
    next_telemetry: Instant,
}

impl<B: Board> ControlLoop<B> {
    /// Build the loop around a board, loading persisted trims.
    pub fn new(mut board: B, start: Instant) -> Self {
        let trims = calibration::load_or_default(board.store());
        Self {
            board,
            queue: Deque::new(),
            poller: SensorPoller::new(start),
            frame: SensorFrame::empty(start),
            estimator: OrientationEstimator::new(),
            actuator: MotionActuator::new(trims),
            follower: LineFollower::new(),
            rotate: RotateManeuver::new(),
            autocal: AutoCalibration::new(),
            leds: LedEngine::new(start),
            sound: ToneSequencer::new(),
            imu_misses: 0,
            next_sensor: start,
            next_orientation: start,
            next_effect: start,
            next_telemetry: start,
        }
    }

    /// One-time power-on feedback: welcome glyph and boot chime.
    pub fn boot(&mut self, now: Instant) {
        info!("robot up");
        self.board.display().render_glyph(Glyph::Happy);
        self.sound.play(self.board.buzzer(), Melody::Startup, now);
    }

    /// Enqueue a command for the next tick. Returns false (and drops the
    /// command) when the queue is full; the transport decides whether to
    /// report that back.
    pub fn push_command(&mut self, cmd: Command) -> bool {
        if self.queue.push_back(cmd).is_err() {
            warn!("command queue full, dropping");
            return false;
        }
        true
    }

    pub fn board_mut(&mut self) -> &mut B {
        &mut self.board
    }

    /// Latest acquired sensor frame
    pub fn sensors(&self) -> &SensorFrame {
        &self.frame
    }

    pub fn yaw(&self) -> f32 {
        self.estimator.yaw()
    }

    /// Run one scheduler pass at `now`.
    pub fn tick(&mut self, now: Instant) {
        while let Some(cmd) = self.queue.pop_front() {
            self.dispatch(cmd, now);
        }

        let mut fresh_frame = false;
        if now >= self.next_sensor {
            self.frame = self.poller.sample(&mut self.board, now);
            self.next_sensor = now + SENSOR_PERIOD;
            fresh_frame = true;
        }

        if now >= self.next_orientation {
            self.update_orientation();
            self.next_orientation = now + UPDATE_PERIOD;
        }

        // One motion authority per tick, highest priority first.
        let yaw = self.estimator.yaw();
        if self.autocal.active() {
            if let Some(trims) =
                self.autocal
                    .step(&mut self.actuator, self.board.motor(), yaw, now)
            {
                calibration::persist(self.board.store(), &trims);
            }
        } else if self.rotate.active() {
            self.rotate
                .step(&mut self.actuator, self.board.motor(), yaw, now);
        } else if fresh_frame {
            if let Some(cmd) = self.follower.step(&self.frame) {
                self.actuator.set_motion(self.board.motor(), cmd);
            }
        }

        if now >= self.next_effect {
            self.leds.step(self.board.leds(), now);
            self.next_effect = now + EFFECT_PERIOD;
        }

        self.sound.step(self.board.buzzer(), now);

        if now >= self.next_telemetry {
            let frame = TelemetryFrame::assemble(
                &self.frame,
                &self.estimator,
                self.actuator.trims(),
                now,
            );
            self.board.telemetry().emit(&frame);
            self.next_telemetry = now + TELEMETRY_PERIOD;
        }
    }

    fn update_orientation(&mut self) {
        match self.board.imu().sample() {
            Some(sample) => {
                self.estimator.update(&sample);
                self.imu_misses = 0;
            }
            None => {
                // Keep the last estimate; log once per outage.
                self.imu_misses = self.imu_misses.saturating_add(1);
                if self.imu_misses == IMU_MISS_LIMIT {
                    warn!("inertial sensor unresponsive, attitude is stale");
                }
            }
        }
    }

    /// A manual drive command preempts every automatic motion authority.
    fn take_motion_authority(&mut self) {
        self.follower.set_enabled(false, None);
        self.rotate.cancel();
        self.autocal.cancel(&mut self.actuator);
    }

    fn dispatch(&mut self, cmd: Command, now: Instant) {
        match cmd {
            Command::Move { x, y } => {
                self.take_motion_authority();
                self.actuator
                    .set_motion(self.board.motor(), MotionCommand::from_joystick(x, y));
            }
            Command::Forward { speed } => {
                self.take_motion_authority();
                self.actuator.set_motion(
                    self.board.motor(),
                    MotionCommand::forward(speed.unwrap_or(50)),
                );
            }
            Command::Backward { speed } => {
                self.take_motion_authority();
                self.actuator.set_motion(
                    self.board.motor(),
                    MotionCommand::backward(speed.unwrap_or(50)),
                );
            }
            Command::Stop => {
                self.take_motion_authority();
                self.actuator.stop(self.board.motor());
            }
            Command::Speed { percent } => self.follower.set_base_percent(percent),
            Command::Led { index, color } => {
                self.leds.set_pixel(self.board.leds(), index, color)
            }
            Command::LedAll { color } => self.leds.set_all(self.board.leds(), color),
            Command::LedRainbow => {
                self.leds
                    .set_effect(self.board.leds(), EffectKind::Rainbow, now)
            }
            Command::LedBlink => {
                self.leds
                    .set_effect(self.board.leds(), EffectKind::Blink, now)
            }
            Command::LedBreathe => {
                self.leds
                    .set_effect(self.board.leds(), EffectKind::Breathe, now)
            }
            Command::Music { melody } => self.sound.play(self.board.buzzer(), melody, now),
            Command::MusicStop => self.sound.stop(self.board.buzzer()),
            Command::Tone { freq_hz, duration_ms } => {
                self.sound
                    .tone(self.board.buzzer(), freq_hz, duration_ms, now)
            }
            Command::Turn { angle } => {
                self.autocal.cancel(&mut self.actuator);
                let yaw = self.estimator.yaw();
                self.rotate
                    .start(&mut self.actuator, self.board.motor(), yaw, angle, now);
            }
            // Disabling leaves the last motion in force; the operator sends
            // an explicit Stop to halt.
            Command::LineFollower { enable, speed } => {
                self.follower.set_enabled(enable, speed)
            }
            Command::Calibrate { left, right } => {
                self.actuator
                    .set_trims(CalibrationOffsets::clamped(left, right));
            }
            Command::SaveCalibration => {
                let trims = self.actuator.trims();
                calibration::persist(self.board.store(), &trims);
            }
            Command::AutoCalibrate => {
                self.autocal.start(
                    &mut self.actuator,
                    self.board.motor(),
                    &mut self.estimator,
                    now,
                );
            }
            Command::DisplayText { line, text } => self.board.display().render(line, &text),
            Command::DisplayClear => self.board.display().clear(),
            Command::DisplayImage { glyph } => self.board.display().render_glyph(glyph),
            Command::ResetYaw => self.estimator.reset_yaw(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{Rgb, WheelDirection};
    use crate::testing::SimBoard;

    fn at(ms: u64) -> Instant {
        Instant::from_millis(ms)
    }

    fn fresh_loop() -> ControlLoop<SimBoard> {
        ControlLoop::new(SimBoard::new(), at(0))
    }

    #[test]
    fn queue_overflow_drops_and_reports() {
        let mut loop_ = fresh_loop();
        for _ in 0..16 {
            assert!(loop_.push_command(Command::Stop));
        }
        assert!(!loop_.push_command(Command::Stop));
    }

    #[test]
    fn forward_default_speed_is_half() {
        let mut loop_ = fresh_loop();
        loop_.push_command(Command::Forward { speed: None });
        loop_.tick(at(0));
        let (l, r) = loop_.board_mut().motor.last().unwrap();
        assert_eq!(l.duty, 127);
        assert_eq!(l.direction, WheelDirection::Forward);
        assert_eq!(r.duty, 127);
    }

    #[test]
    fn stop_brakes_and_disables_the_follower() {
        let mut loop_ = fresh_loop();
        loop_.board_mut().lines.values = [0, 0, 0, 900, 900, 0, 0, 0];
        loop_.push_command(Command::LineFollower {
            enable: true,
            speed: Some(50),
        });
        loop_.tick(at(0));
        assert_eq!(loop_.board_mut().motor.last().unwrap().0.duty, 100);

        loop_.push_command(Command::Stop);
        loop_.tick(at(20));
        let applies_after_stop = loop_.board_mut().motor.applies.len();
        // Further frames no longer actuate.
        loop_.tick(at(40));
        loop_.tick(at(60));
        assert_eq!(loop_.board_mut().motor.applies.len(), applies_after_stop);
    }

    #[test]
    fn disabling_the_follower_leaves_the_last_motion_in_force() {
        let mut loop_ = fresh_loop();
        loop_.board_mut().lines.values = [0, 0, 0, 900, 900, 0, 0, 0];
        loop_.push_command(Command::LineFollower {
            enable: true,
            speed: Some(50),
        });
        loop_.tick(at(0));
        let applies = loop_.board_mut().motor.applies.len();
        let (l, _) = loop_.board_mut().motor.last().unwrap();
        assert_eq!(l.direction, WheelDirection::Forward);
        assert_eq!(l.duty, 100);

        loop_.push_command(Command::LineFollower {
            enable: false,
            speed: None,
        });
        loop_.tick(at(20));
        loop_.tick(at(40));
        // No brake, no new actuation: the wheels keep the follower's last
        // command until an explicit Stop.
        assert_eq!(loop_.board_mut().motor.applies.len(), applies);
        let (l, _) = loop_.board_mut().motor.last().unwrap();
        assert_eq!(l.direction, WheelDirection::Forward);
    }

    #[test]
    fn stop_cancels_auto_calibration_without_persisting() {
        let mut board = SimBoard::new();
        let stored = CalibrationOffsets { left: 10, right: 0 };
        board.store.saved = Some(stored);
        let mut loop_ = ControlLoop::new(board, at(0));

        loop_.push_command(Command::AutoCalibrate);
        loop_.tick(at(0));

        // Abort mid-settle; the routine must not run to completion.
        loop_.push_command(Command::Stop);
        loop_.tick(at(400));

        for ms in (500..=3000).step_by(100) {
            loop_.tick(at(ms));
        }
        // Nothing was persisted over the stored record, and the trims that
        // were in force before the routine are back.
        assert_eq!(loop_.board_mut().store.saved, Some(stored));
        let frame = *loop_.board_mut().telemetry.frames.last().unwrap();
        assert_eq!(frame.trims, stored);
    }

    #[test]
    fn manual_trims_apply_immediately_but_persist_only_on_save() {
        let mut loop_ = fresh_loop();
        loop_.push_command(Command::Calibrate { left: 10, right: -90 });
        loop_.push_command(Command::Forward { speed: Some(0) });
        loop_.tick(at(0));
        // Right clamped to the trim bound, then drives the wheel in reverse.
        let (l, r) = loop_.board_mut().motor.last().unwrap();
        assert_eq!(l.duty, 10);
        assert_eq!(r.direction, WheelDirection::Reverse);
        assert_eq!(r.duty, 50);
        assert!(loop_.board_mut().store.saved.is_none());

        loop_.push_command(Command::SaveCalibration);
        loop_.tick(at(20));
        assert_eq!(
            loop_.board_mut().store.saved.unwrap(),
            CalibrationOffsets { left: 10, right: -50 }
        );
    }

    #[test]
    fn led_command_takes_effect_on_the_dispatch_tick() {
        let mut loop_ = fresh_loop();
        loop_.push_command(Command::LedAll {
            color: Rgb::new(1, 2, 3),
        });
        loop_.tick(at(0));
        assert_eq!(
            loop_.board_mut().leds.writes.last().unwrap(),
            &[Rgb::new(1, 2, 3); 2]
        );
    }

    #[test]
    fn stale_imu_keeps_last_attitude() {
        let mut loop_ = fresh_loop();
        loop_.board_mut().imu.sample = Some(crate::hal::ImuSample {
            gyro_z_dps: 100.0,
            accel_x: 0.0,
            accel_y: 0.0,
            accel_z: 1.0,
        });
        loop_.tick(at(0));
        let yaw = loop_.yaw();
        assert!(yaw > 0.0);

        loop_.board_mut().imu.sample = None;
        for ms in (10..=300).step_by(10) {
            loop_.tick(at(ms));
        }
        assert_eq!(loop_.yaw(), yaw);
    }
}
