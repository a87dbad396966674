//! Piezo buzzer on a PWM slice
//!
//! A tone is a square wave: top derived from the requested frequency,
//! compare at half for a 50% duty. Silence disables the slice output.

use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use trundle_core::hal::Buzzer;

use crate::system::resources::BuzzerResources;

pub struct PwmBuzzer {
    pwm: Pwm<'static>,
}

impl PwmBuzzer {
    pub fn new(r: BuzzerResources) -> Self {
        let mut config = PwmConfig::default();
        config.enable = false;
        let pwm = Pwm::new_output_b(r.slice, r.pin, config);
        Self { pwm }
    }
}

impl Buzzer for PwmBuzzer {
    fn set_tone(&mut self, freq_hz: u16) {
        if freq_hz == 0 {
            self.silence();
            return;
        }
        let clock_freq_hz = embassy_rp::clocks::clk_sys_freq();
        let divider = ((clock_freq_hz / freq_hz as u32) / 65_535 + 1) as u8;
        let top = (clock_freq_hz / (freq_hz as u32 * divider as u32)) as u16 - 1;

        let mut config = PwmConfig::default();
        config.divider = divider.into();
        config.top = top;
        config.compare_b = top / 2;
        config.enable = true;
        self.pwm.set_config(&config);
    }

    fn silence(&mut self) {
        let mut config = PwmConfig::default();
        config.enable = false;
        self.pwm.set_config(&config);
    }
}
