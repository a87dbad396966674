//! Robot command set
//!
//! The closed set of operations a transport can ask the robot to perform.
//! Transports (BLE, serial, whatever carries the bytes) parse their wire
//! format into this enum; the control loop dispatches on it exhaustively, so
//! adding a command is a compile-enforced change. Unknown input never reaches
//! the core: the transport drops what it cannot parse.

use heapless::String;

use crate::hal::{Glyph, Rgb};
use crate::sound::Melody;

/// Longest display text a command can carry
pub const DISPLAY_TEXT_MAX: usize = 32;

/// One operation requested of the robot
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Differential drive from a joystick vector, components in -100..=100
    Move { x: i8, y: i8 },
    /// Straight ahead at a speed percentage (default 50 when absent)
    Forward { speed: Option<u8> },
    Backward { speed: Option<u8> },
    /// Stop the wheels and drop out of any motion mode
    Stop,
    /// Change the line-follower base speed without toggling it
    Speed { percent: u8 },
    Led { index: usize, color: Rgb },
    LedAll { color: Rgb },
    LedRainbow,
    LedBlink,
    LedBreathe,
    Music { melody: Melody },
    MusicStop,
    Tone { freq_hz: u16, duration_ms: u64 },
    /// Rotate in place by a relative angle in degrees, sign picks direction
    Turn { angle: f32 },
    LineFollower { enable: bool, speed: Option<u8> },
    /// Set trims directly; takes effect immediately, persisted only by
    /// [`Command::SaveCalibration`]
    Calibrate { left: i16, right: i16 },
    SaveCalibration,
    AutoCalibrate,
    DisplayText {
        line: u8,
        text: String<DISPLAY_TEXT_MAX>,
    },
    DisplayClear,
    DisplayImage { glyph: Glyph },
    ResetYaw,
}
