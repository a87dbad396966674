//! The physical robot behind the core's board abstraction
//!
//! Direct-drive devices (motor, analog front end, buttons, buzzer, flash)
//! are owned here and accessed synchronously. Devices with async drivers
//! (ultrasonic ranger, inertial sensor, LED strip, display) live in their own
//! tasks; their adapters here talk to those tasks through statics.

mod analog;
mod buzzer;
mod flash_store;
mod inputs;
mod motor;
mod telemetry;

use trundle_core::hal::Board;

use crate::system::resources::{
    AdcResources, AmbientLightResources, ButtonResources, BuzzerResources, FlashResources,
    LineArrayResources, MotorResources,
};
use crate::task::display::DisplayHandle;
use crate::task::distance_measure::CachedDistance;
use crate::task::imu_read::CachedImu;
use crate::task::led_strip::StripHandle;

pub use analog::AnalogBank;
pub use buzzer::PwmBuzzer;
pub use flash_store::FlashTrims;
pub use inputs::Buttons;
pub use motor::Wheels;
pub use telemetry::DebugTelemetry;

pub struct RobotBoard {
    wheels: Wheels,
    analog: AnalogBank,
    buttons: Buttons,
    buzzer: PwmBuzzer,
    store: FlashTrims,
    telemetry: DebugTelemetry,
    distance: CachedDistance,
    imu: CachedImu,
    leds: StripHandle,
    display: DisplayHandle,
}

impl RobotBoard {
    pub fn new(
        motor: MotorResources,
        buzzer: BuzzerResources,
        adc: AdcResources,
        line_array: LineArrayResources,
        ambient: AmbientLightResources,
        buttons: ButtonResources,
        flash: FlashResources,
    ) -> Self {
        Self {
            wheels: Wheels::new(motor),
            analog: AnalogBank::new(adc, line_array, ambient),
            buttons: Buttons::new(buttons),
            buzzer: PwmBuzzer::new(buzzer),
            store: FlashTrims::new(flash),
            telemetry: DebugTelemetry,
            distance: CachedDistance,
            imu: CachedImu,
            leds: StripHandle,
            display: DisplayHandle,
        }
    }
}

impl Board for RobotBoard {
    type Motor = Wheels;
    type Lines = AnalogBank;
    type Ambient = AnalogBank;
    type Buttons = Buttons;
    type Distance = CachedDistance;
    type Imu = CachedImu;
    type Leds = StripHandle;
    type Buzzer = PwmBuzzer;
    type Display = DisplayHandle;
    type Store = FlashTrims;
    type Telemetry = DebugTelemetry;

    fn motor(&mut self) -> &mut Wheels {
        &mut self.wheels
    }

    fn lines(&mut self) -> &mut AnalogBank {
        &mut self.analog
    }

    fn ambient(&mut self) -> &mut AnalogBank {
        &mut self.analog
    }

    fn buttons(&mut self) -> &mut Buttons {
        &mut self.buttons
    }

    fn distance(&mut self) -> &mut CachedDistance {
        &mut self.distance
    }

    fn imu(&mut self) -> &mut CachedImu {
        &mut self.imu
    }

    fn leds(&mut self) -> &mut StripHandle {
        &mut self.leds
    }

    fn buzzer(&mut self) -> &mut PwmBuzzer {
        &mut self.buzzer
    }

    fn display(&mut self) -> &mut DisplayHandle {
        &mut self.display
    }

    fn store(&mut self) -> &mut FlashTrims {
        &mut self.store
    }

    fn telemetry(&mut self) -> &mut DebugTelemetry {
        &mut self.telemetry
    }
}
