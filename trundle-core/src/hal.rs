//! Capability interfaces between the control core and the board
//!
//! Every piece of hardware the core touches sits behind one of these traits,
//! so the whole control loop runs against simulated devices in tests and
//! against the real board in the firmware crate. The [`Board`] trait bundles
//! the device set for the scheduler.

use crate::calibration::CalibrationOffsets;
use crate::telemetry::TelemetryFrame;

/// Number of RGB pixels on the light strip
pub const PIXEL_COUNT: usize = 2;

/// Per-wheel drive direction
///
/// `Brake` de-asserts both H-bridge inputs; a zero-duty command always maps
/// to `Brake`, never to coast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WheelDirection {
    Forward,
    Reverse,
    Brake,
}

/// Final, device-range signal for one wheel: direction plus PWM duty (0-255)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelDrive {
    pub direction: WheelDirection,
    pub duty: u8,
}

impl WheelDrive {
    pub const BRAKE: WheelDrive = WheelDrive {
        direction: WheelDirection::Brake,
        duty: 0,
    };
}

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Scale all channels by `brightness`/255 (used by the breathe effect)
    pub fn scaled(self, brightness: u8) -> Rgb {
        let scale = |c: u8| ((c as u16 * brightness as u16) / 255) as u8;
        Rgb::new(scale(self.r), scale(self.g), scale(self.b))
    }
}

/// One inertial sample: z-axis rate plus the accelerometer vector
///
/// Gyro rate is in degrees per second, accelerometer axes in any consistent
/// unit (only ratios enter the tilt formulas).
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ImuSample {
    pub gyro_z_dps: f32,
    pub accel_x: f32,
    pub accel_y: f32,
    pub accel_z: f32,
}

/// Named glyphs the display collaborator knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Glyph {
    Happy,
    Sad,
    Heart,
    Robot,
}

/// Trim persistence failed (read or write); never fatal to the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StorageError;

/// Dual-wheel motor driver
pub trait MotorDriver {
    /// Apply both wheel signals as one atomic pair; never half-applied.
    fn apply(&mut self, left: WheelDrive, right: WheelDrive);
}

/// 8-channel reflectance array, raw analog intensities
pub trait LineArray {
    fn read(&mut self) -> [u16; 8];
}

/// Left/right ambient light pair
pub trait AmbientLight {
    fn read(&mut self) -> [u16; 2];
}

/// Four push buttons, raw active-low levels (acquisition inverts)
pub trait ButtonPad {
    fn read_raw(&mut self) -> [bool; 4];
}

/// Ultrasonic ranger; `None` means echo timeout or a zero-length pulse
pub trait DistanceSensor {
    fn measure(&mut self) -> Option<u16>;
}

/// Gyro + accelerometer; `None` when the sensor is absent or a read failed
pub trait InertialSensor {
    fn sample(&mut self) -> Option<ImuSample>;
}

/// RGB pixel strip, written whole
pub trait LightStrip {
    fn write(&mut self, pixels: &[Rgb; PIXEL_COUNT]);
}

/// Piezo buzzer
pub trait Buzzer {
    fn set_tone(&mut self, freq_hz: u16);
    fn silence(&mut self);
}

/// Text/glyph display collaborator; the core never touches pixels
pub trait Display {
    fn render(&mut self, line: u8, text: &str);
    fn clear(&mut self);
    fn render_glyph(&mut self, glyph: Glyph);
}

/// Persistent trim storage collaborator
pub trait TrimStore {
    /// `Ok(None)` when no valid record exists.
    fn load(&mut self) -> Result<Option<CalibrationOffsets>, StorageError>;
    fn save(&mut self, trims: &CalibrationOffsets) -> Result<(), StorageError>;
}

/// Outbound telemetry sink (the wire transport collaborator)
pub trait TelemetrySink {
    fn emit(&mut self, frame: &TelemetryFrame);
}

/// The full device set the control loop runs against
pub trait Board {
    type Motor: MotorDriver;
    type Lines: LineArray;
    type Ambient: AmbientLight;
    type Buttons: ButtonPad;
    type Distance: DistanceSensor;
    type Imu: InertialSensor;
    type Leds: LightStrip;
    type Buzzer: Buzzer;
    type Display: Display;
    type Store: TrimStore;
    type Telemetry: TelemetrySink;

    fn motor(&mut self) -> &mut Self::Motor;
    fn lines(&mut self) -> &mut Self::Lines;
    fn ambient(&mut self) -> &mut Self::Ambient;
    fn buttons(&mut self) -> &mut Self::Buttons;
    fn distance(&mut self) -> &mut Self::Distance;
    fn imu(&mut self) -> &mut Self::Imu;
    fn leds(&mut self) -> &mut Self::Leds;
    fn buzzer(&mut self) -> &mut Self::Buzzer;
    fn display(&mut self) -> &mut Self::Display;
    fn store(&mut self) -> &mut Self::Store;
    fn telemetry(&mut self) -> &mut Self::Telemetry;
}
