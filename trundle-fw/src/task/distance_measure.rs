//! Ultrasonic distance measurement
//!
//! Pings the HC-SR04 on its own 100 ms cadence so a slow or missing echo
//! never stalls the control loop. Raw readings go through a small moving
//! median to knock out single-ping outliers; the filtered value is parked in
//! an atomic for the control loop's sensor tick to pick up. A timed-out echo
//! parks the no-reading sentinel instead.

use core::sync::atomic::{AtomicU16, Ordering};

use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{block_for, with_timeout, Duration, Instant, Timer};
use moving_median::MovingMedian;
use trundle_core::hal::DistanceSensor;

use crate::system::resources::DistanceSensorResources;

/// Time between pings
const MEASUREMENT_INTERVAL: Duration = Duration::from_millis(100);

/// Longest echo worth waiting for (a bit over 4m of range)
const ECHO_TIMEOUT: Duration = Duration::from_millis(30);

/// Median window; 3 samples trades noise rejection against latency
const MEDIAN_WINDOW_SIZE: usize = 3;

/// Sentinel for "no valid echo"
const NO_READING: u16 = u16::MAX;

static LATEST_CM: AtomicU16 = AtomicU16::new(NO_READING);

/// Control-loop-side view of the cached measurement
pub struct CachedDistance;

impl DistanceSensor for CachedDistance {
    fn measure(&mut self) -> Option<u16> {
        match LATEST_CM.load(Ordering::Relaxed) {
            NO_READING => None,
            cm => Some(cm),
        }
    }
}

#[embassy_executor::task]
pub async fn distance_measure(r: DistanceSensorResources) {
    let mut trigger = Output::new(r.trigger_pin, Level::Low);
    let mut echo = Input::new(r.echo_pin, Pull::None);
    let mut median_filter = MovingMedian::<f64, MEDIAN_WINDOW_SIZE>::new();

    loop {
        // 10 µs trigger pulse starts a ping.
        trigger.set_high();
        block_for(Duration::from_micros(10));
        trigger.set_low();

        match pulse_width_cm(&mut echo).await {
            Some(cm) => {
                median_filter.add_value(cm as f64);
                LATEST_CM.store(median_filter.median() as u16, Ordering::Relaxed);
            }
            None => LATEST_CM.store(NO_READING, Ordering::Relaxed),
        }

        Timer::after(MEASUREMENT_INTERVAL).await;
    }
}

/// Wait out one echo pulse and convert its width to centimeters.
async fn pulse_width_cm(echo: &mut Input<'static>) -> Option<u16> {
    if with_timeout(ECHO_TIMEOUT, echo.wait_for_high()).await.is_err() {
        return None;
    }
    let start = Instant::now();
    if with_timeout(ECHO_TIMEOUT, echo.wait_for_low()).await.is_err() {
        return None;
    }
    let width_us = start.elapsed().as_micros();
    if width_us == 0 {
        return None;
    }
    // Round trip at the speed of sound: 58 µs per centimeter.
    Some((width_us / 58) as u16)
}
