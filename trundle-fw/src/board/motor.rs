//! TB6612FNG dual motor driver adapter
//!
//! Both wheel signals are applied back to back in one call, so the H-bridge
//! never runs half a command. The driver is taken out of standby once at
//! startup and stays enabled; a braked robot holds its wheels.

use embassy_rp::gpio::{Level, Output};
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use tb6612fng::{DriveCommand, Motor, Tb6612fng};
use trundle_core::{WheelDirection, WheelDrive};

use crate::system::resources::MotorResources;

/// PWM carrier; cheap brushed motors behave better at lower frequencies
const PWM_FREQ_HZ: u32 = 10_000;

type WheelMotor = Motor<Output<'static>, Output<'static>, Pwm<'static>>;

/// The physical drivetrain behind the core's motor capability
pub struct Wheels {
    driver: Tb6612fng<WheelMotor, WheelMotor, Output<'static>>,
}

impl Wheels {
    pub fn new(r: MotorResources) -> Self {
        let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
        let divider = ((clock_freq_hz / PWM_FREQ_HZ) / 65_535 + 1) as u8;
        let period = (clock_freq_hz / (PWM_FREQ_HZ * divider as u32)) as u16 - 1;

        let mut pwm_config = PwmConfig::default();
        pwm_config.divider = divider.into();
        pwm_config.top = period;

        let stby = Output::new(r.standby_pin, Level::Low);

        let left_fwd = Output::new(r.left_forward_pin, Level::Low);
        let left_bckw = Output::new(r.left_backward_pin, Level::Low);
        let left_pwm = Pwm::new_output_a(r.left_slice, r.left_pwm_pin, pwm_config.clone());
        let left_motor = Motor::new(left_fwd, left_bckw, left_pwm).unwrap();

        let right_fwd = Output::new(r.right_forward_pin, Level::Low);
        let right_bckw = Output::new(r.right_backward_pin, Level::Low);
        let right_pwm = Pwm::new_output_b(r.right_slice, r.right_pwm_pin, pwm_config.clone());
        let right_motor = Motor::new(right_fwd, right_bckw, right_pwm).unwrap();

        let mut driver = Tb6612fng::new(left_motor, right_motor, stby).unwrap();
        driver.disable_standby().unwrap();

        Self { driver }
    }
}

/// Map a device-range wheel signal onto the driver's percent interface
fn command(drive: WheelDrive) -> DriveCommand {
    let percent = (drive.duty as u16 * 100 / 255) as u8;
    match drive.direction {
        WheelDirection::Forward => DriveCommand::Forward(percent),
        WheelDirection::Reverse => DriveCommand::Backward(percent),
        WheelDirection::Brake => DriveCommand::Brake,
    }
}

impl trundle_core::hal::MotorDriver for Wheels {
    fn apply(&mut self, left: WheelDrive, right: WheelDrive) {
        // GPIO and PWM writes are infallible on this chip.
        self.driver.motor_a.drive(command(left)).unwrap();
        self.driver.motor_b.drive(command(right)).unwrap();
    }
}
