//! Platform-independent control core for a small differential-drive robot.
//!
//! Everything time- and hardware-dependent is injected: devices come in
//! through the capability traits in [`hal`], and the current instant comes in
//! as an argument to [`control::ControlLoop::tick`]. The firmware crate wires
//! the traits to the real board and calls `tick` from its executor; the tests
//! here run the identical loop against simulated devices and a synthetic
//! clock.

#![cfg_attr(not(test), no_std)]

// This must go first so the macros are visible crate-wide.
mod fmt;

pub mod calibration;
pub mod command;
pub mod control;
pub mod effects;
pub mod hal;
pub mod line_follower;
pub mod motion;
pub mod orientation;
pub mod rotate;
pub mod sensing;
pub mod sound;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use calibration::CalibrationOffsets;
pub use command::Command;
pub use control::ControlLoop;
pub use hal::{Board, Glyph, ImuSample, Rgb, WheelDirection, WheelDrive};
pub use motion::MotionCommand;
pub use sound::Melody;
pub use telemetry::TelemetryFrame;
