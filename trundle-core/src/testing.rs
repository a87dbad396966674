//! Simulated devices for the unit tests
//!
//! Every capability trait gets a recording double with public fields, plus a
//! [`SimBoard`] bundling the full set so the control loop runs unmodified
//! against them.

use crate::calibration::CalibrationOffsets;
use crate::hal::{
    AmbientLight, Board, Buzzer, ButtonPad, Display, DistanceSensor, Glyph, ImuSample,
    InertialSensor, LightStrip, LineArray, MotorDriver, Rgb, StorageError, TelemetrySink,
    TrimStore, WheelDrive, PIXEL_COUNT,
};
use crate::telemetry::TelemetryFrame;

#[derive(Default)]
pub struct SimMotor {
    pub applies: Vec<(WheelDrive, WheelDrive)>,
}

impl SimMotor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<(WheelDrive, WheelDrive)> {
        self.applies.last().copied()
    }
}

impl MotorDriver for SimMotor {
    fn apply(&mut self, left: WheelDrive, right: WheelDrive) {
        self.applies.push((left, right));
    }
}

#[derive(Default)]
pub struct SimLines {
    pub values: [u16; 8],
}

impl LineArray for SimLines {
    fn read(&mut self) -> [u16; 8] {
        self.values
    }
}

#[derive(Default)]
pub struct SimAmbient {
    pub values: [u16; 2],
}

impl AmbientLight for SimAmbient {
    fn read(&mut self) -> [u16; 2] {
        self.values
    }
}

pub struct SimButtons {
    /// Raw active-low levels; `true` means released.
    pub levels: [bool; 4],
}

impl Default for SimButtons {
    fn default() -> Self {
        Self { levels: [true; 4] }
    }
}

impl ButtonPad for SimButtons {
    fn read_raw(&mut self) -> [bool; 4] {
        self.levels
    }
}

pub struct SimDistance {
    pub reading: Option<u16>,
    pub measurements: usize,
}

impl Default for SimDistance {
    fn default() -> Self {
        Self {
            reading: Some(100),
            measurements: 0,
        }
    }
}

impl DistanceSensor for SimDistance {
    fn measure(&mut self) -> Option<u16> {
        self.measurements += 1;
        self.reading
    }
}

#[derive(Default)]
pub struct SimImu {
    pub sample: Option<ImuSample>,
}

impl InertialSensor for SimImu {
    fn sample(&mut self) -> Option<ImuSample> {
        self.sample
    }
}

#[derive(Default)]
pub struct SimStrip {
    pub writes: Vec<[Rgb; PIXEL_COUNT]>,
}

impl SimStrip {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LightStrip for SimStrip {
    fn write(&mut self, pixels: &[Rgb; PIXEL_COUNT]) {
        self.writes.push(*pixels);
    }
}

#[derive(Default)]
pub struct SimBuzzer {
    pub tones: Vec<u16>,
    pub silences: usize,
}

impl SimBuzzer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Buzzer for SimBuzzer {
    fn set_tone(&mut self, freq_hz: u16) {
        self.tones.push(freq_hz);
    }

    fn silence(&mut self) {
        self.silences += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Text(u8, String),
    Clear,
    Image(Glyph),
}

#[derive(Default)]
pub struct SimDisplay {
    pub events: Vec<DisplayEvent>,
}

impl Display for SimDisplay {
    fn render(&mut self, line: u8, text: &str) {
        self.events.push(DisplayEvent::Text(line, text.to_owned()));
    }

    fn clear(&mut self) {
        self.events.push(DisplayEvent::Clear);
    }

    fn render_glyph(&mut self, glyph: Glyph) {
        self.events.push(DisplayEvent::Image(glyph));
    }
}

#[derive(Default)]
pub struct SimStore {
    /// Forced load outcome; when `None` the store behaves normally.
    pub load_result: Option<Result<Option<CalibrationOffsets>, StorageError>>,
    pub saved: Option<CalibrationOffsets>,
}

impl SimStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TrimStore for SimStore {
    fn load(&mut self) -> Result<Option<CalibrationOffsets>, StorageError> {
        match &self.load_result {
            Some(forced) => forced.clone(),
            None => Ok(self.saved),
        }
    }

    fn save(&mut self, trims: &CalibrationOffsets) -> Result<(), StorageError> {
        self.saved = Some(*trims);
        Ok(())
    }
}

#[derive(Default)]
pub struct SimTelemetry {
    pub frames: Vec<TelemetryFrame>,
}

impl TelemetrySink for SimTelemetry {
    fn emit(&mut self, frame: &TelemetryFrame) {
        self.frames.push(*frame);
    }
}

/// The whole robot's device set, simulated
#[derive(Default)]
pub struct SimBoard {
    pub motor: SimMotor,
    pub lines: SimLines,
    pub ambient: SimAmbient,
    pub buttons: SimButtons,
    pub distance: SimDistance,
    pub imu: SimImu,
    pub leds: SimStrip,
    pub buzzer: SimBuzzer,
    pub display: SimDisplay,
    pub store: SimStore,
    pub telemetry: SimTelemetry,
}

impl SimBoard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Board for SimBoard {
    type Motor = SimMotor;
    type Lines = SimLines;
    type Ambient = SimAmbient;
    type Buttons = SimButtons;
    type Distance = SimDistance;
    type Imu = SimImu;
    type Leds = SimStrip;
    type Buzzer = SimBuzzer;
    type Display = SimDisplay;
    type Store = SimStore;
    type Telemetry = SimTelemetry;

    fn motor(&mut self) -> &mut SimMotor {
        &mut self.motor
    }

    fn lines(&mut self) -> &mut SimLines {
        &mut self.lines
    }

    fn ambient(&mut self) -> &mut SimAmbient {
        &mut self.ambient
    }

    fn buttons(&mut self) -> &mut SimButtons {
        &mut self.buttons
    }

    fn distance(&mut self) -> &mut SimDistance {
        &mut self.distance
    }

    fn imu(&mut self) -> &mut SimImu {
        &mut self.imu
    }

    fn leds(&mut self) -> &mut SimStrip {
        &mut self.leds
    }

    fn buzzer(&mut self) -> &mut SimBuzzer {
        &mut self.buzzer
    }

    fn display(&mut self) -> &mut SimDisplay {
        &mut self.display
    }

    fn store(&mut self) -> &mut SimStore {
        &mut self.store
    }

    fn telemetry(&mut self) -> &mut SimTelemetry {
        &mut self.telemetry
    }
}
