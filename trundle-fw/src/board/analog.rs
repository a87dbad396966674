//! Analog front end: line array multiplexer and ambient light pair
//!
//! The 8-channel reflectance array sits behind a CD4051 analog multiplexer on
//! ADC0, selected by three GPIOs; the two ambient photoresistors have their
//! own ADC channels. All reads are blocking, a full 10-channel sweep is well
//! under the sensor tick.

use embassy_rp::adc::{Adc, Blocking, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::gpio::{Level, Output, Pull};
use embassy_time::{block_for, Duration};
use trundle_core::hal::{AmbientLight, LineArray};

use crate::system::resources::{AdcResources, AmbientLightResources, LineArrayResources};

/// Settle time after switching the multiplexer channel
const MUX_SETTLE: Duration = Duration::from_micros(10);

pub struct AnalogBank {
    adc: Adc<'static, Blocking>,
    select: [Output<'static>; 3],
    mux_out: AdcChannel<'static>,
    ambient_left: AdcChannel<'static>,
    ambient_right: AdcChannel<'static>,
}

impl AnalogBank {
    pub fn new(adc: AdcResources, line: LineArrayResources, ambient: AmbientLightResources) -> Self {
        Self {
            adc: Adc::new_blocking(adc.adc, AdcConfig::default()),
            select: [
                Output::new(line.select0, Level::Low),
                Output::new(line.select1, Level::Low),
                Output::new(line.select2, Level::Low),
            ],
            mux_out: AdcChannel::new_pin(line.mux_out, Pull::None),
            ambient_left: AdcChannel::new_pin(ambient.left_pin, Pull::None),
            ambient_right: AdcChannel::new_pin(ambient.right_pin, Pull::None),
        }
    }

    fn select_channel(&mut self, channel: usize) {
        for (bit, pin) in self.select.iter_mut().enumerate() {
            if channel & (1 << bit) != 0 {
                pin.set_high();
            } else {
                pin.set_low();
            }
        }
        block_for(MUX_SETTLE);
    }

    fn read_mux(&mut self, channel: usize) -> u16 {
        self.select_channel(channel);
        // A failed conversion reads as "no line".
        self.adc.blocking_read(&mut self.mux_out).unwrap_or(0)
    }
}

impl LineArray for AnalogBank {
    fn read(&mut self) -> [u16; 8] {
        let mut out = [0u16; 8];
        for (channel, value) in out.iter_mut().enumerate() {
            *value = self.read_mux(channel);
        }
        out
    }
}

impl AmbientLight for AnalogBank {
    fn read(&mut self) -> [u16; 2] {
        [
            self.adc.blocking_read(&mut self.ambient_left).unwrap_or(0),
            self.adc.blocking_read(&mut self.ambient_right).unwrap_or(0),
        ]
    }
}
