//! Robot firmware entry point
//!
//! Initializes the board and spawns the device tasks plus the control loop.

#![no_std]
#![no_main]

use embassy_executor::Spawner;
use embassy_rp::block::ImageDef;
use embassy_rp::config::Config;
use {defmt_rtt as _, panic_probe as _};

use crate::board::RobotBoard;
use crate::system::resources::{
    self, AssignedResources, AdcResources, AmbientLightResources, ButtonResources,
    BuzzerResources, DistanceSensorResources, FlashResources, LedStripResources,
    LineArrayResources, MotorResources,
};
use crate::task::{
    control_loop::control_loop, display::display_render, distance_measure::distance_measure,
    imu_read::imu_read, led_strip::led_strip,
};

/// Firmware image type for bootloader
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = ImageDef::secure_exe();

/// Board abstraction over the peripherals
mod board;
/// System core modules
mod system;
/// Task implementations
mod task;

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_rp::init(Config::default());

    // The I2C bus is shared between the inertial sensor and the display;
    // bring it up before the tasks that use it.
    let i2c_bus = resources::init_i2c(p.I2C0, p.PIN_17, p.PIN_16);

    let r = split_resources!(p);

    spawner.spawn(distance_measure(r.distance)).unwrap();
    spawner.spawn(imu_read(i2c_bus)).unwrap();
    spawner.spawn(led_strip(r.led_strip)).unwrap();
    spawner.spawn(display_render(i2c_bus)).unwrap();

    let robot = RobotBoard::new(
        r.motor,
        r.buzzer,
        r.adc,
        r.line_array,
        r.ambient,
        r.buttons,
        r.flash,
    );
    spawner.spawn(control_loop(robot)).unwrap();
}
