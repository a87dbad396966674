//! Inertial sensor acquisition
//!
//! Reads the MPU6050 over the shared I2C bus at 100 Hz and caches the latest
//! converted sample for the control loop. A failed read clears the cache so
//! the estimator sees the outage instead of a frozen sample. If the sensor
//! is absent at boot the task keeps probing; the rest of the robot runs
//! without attitude in the meantime.

use core::cell::Cell;

use defmt::warn;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_time::{Duration, Timer};
use embedded_hal_async::i2c::I2c;
use trundle_core::hal::InertialSensor;
use trundle_core::ImuSample;

use crate::system::resources::I2cBus;

/// 100 Hz, matching the estimator's integration step
const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

const MPU_ADDR: u8 = 0x68;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B;

/// LSB per g at the ±2g range
const ACCEL_SCALE: f32 = 16_384.0;

/// LSB per deg/s at the ±250 dps range
const GYRO_SCALE: f32 = 131.0;

static LATEST: Mutex<CriticalSectionRawMutex, Cell<Option<ImuSample>>> =
    Mutex::new(Cell::new(None));

/// Control-loop-side view of the cached sample
pub struct CachedImu;

impl InertialSensor for CachedImu {
    fn sample(&mut self) -> Option<ImuSample> {
        LATEST.lock(|cell| cell.get())
    }
}

#[embassy_executor::task]
pub async fn imu_read(bus: &'static I2cBus) {
    let mut dev = I2cDevice::new(bus);

    loop {
        match init_sensor(&mut dev).await {
            Ok(()) => break,
            Err(()) => {
                warn!("inertial sensor not responding, retrying");
                Timer::after_secs(1).await;
            }
        }
    }

    loop {
        match read_sample(&mut dev).await {
            Ok(sample) => LATEST.lock(|cell| cell.set(Some(sample))),
            Err(()) => LATEST.lock(|cell| cell.set(None)),
        }
        Timer::after(SAMPLE_INTERVAL).await;
    }
}

/// Wake the device and select the ±250 dps / ±2g ranges.
async fn init_sensor<I: I2c>(dev: &mut I) -> Result<(), ()> {
    dev.write(MPU_ADDR, &[REG_PWR_MGMT_1, 0x00])
        .await
        .map_err(|_| ())?;
    dev.write(MPU_ADDR, &[REG_GYRO_CONFIG, 0x00])
        .await
        .map_err(|_| ())?;
    dev.write(MPU_ADDR, &[REG_ACCEL_CONFIG, 0x00])
        .await
        .map_err(|_| ())
}

/// One burst read of accel, temperature and gyro registers.
async fn read_sample<I: I2c>(dev: &mut I) -> Result<ImuSample, ()> {
    let mut buf = [0u8; 14];
    dev.write_read(MPU_ADDR, &[REG_ACCEL_XOUT_H], &mut buf)
        .await
        .map_err(|_| ())?;

    let word = |hi: usize| i16::from_be_bytes([buf[hi], buf[hi + 1]]);
    Ok(ImuSample {
        accel_x: word(0) as f32 / ACCEL_SCALE,
        accel_y: word(2) as f32 / ACCEL_SCALE,
        accel_z: word(4) as f32 / ACCEL_SCALE,
        // Bytes 6..8 are the die temperature, unused.
        gyro_z_dps: word(12) as f32 / GYRO_SCALE,
    })
}
