//! Telemetry sink
//!
//! Reports over the debug link for now. A radio transport slots in behind
//! the same trait without touching the core.

use defmt::info;
use trundle_core::hal::TelemetrySink;
use trundle_core::TelemetryFrame;

pub struct DebugTelemetry;

impl TelemetrySink for DebugTelemetry {
    fn emit(&mut self, frame: &TelemetryFrame) {
        info!(
            "telemetry: batt={}% dist={}cm yaw={} pitch={} roll={} line={} buttons={}",
            frame.battery_percent,
            frame.distance_cm,
            frame.yaw,
            frame.pitch,
            frame.roll,
            frame.line,
            frame.buttons,
        );
    }
}
