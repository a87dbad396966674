//! Async tasks running alongside the control loop.

pub mod control_loop;
pub mod display;
pub mod distance_measure;
pub mod imu_read;
pub mod led_strip;
