//! LED effect engine
//!
//! Non-blocking timed state machine over the pixel strip, advanced on the
//! effect tick. Blink keeps its own 500 ms timer independent of the tick
//! cadence; breathe ramps brightness as a triangle wave; rainbow walks a hue
//! phase across the color wheel. Switching effects resets the internal phase
//! immediately. Solid is written once on the switch and needs no ticks.

use embassy_time::{Duration, Instant};

use crate::hal::{LightStrip, Rgb, PIXEL_COUNT};

/// Engine advancement cadence
pub const EFFECT_PERIOD: Duration = Duration::from_millis(20);

/// Blink on/off half-period, on its own internal timer
const BLINK_PERIOD: Duration = Duration::from_millis(500);

/// Brightness change per tick for the breathe triangle wave
const BREATHE_STEP: i16 = 5;

/// Hue offset between adjacent pixels in rainbow mode
const HUE_SPREAD: u8 = 30;

/// Active effect selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EffectKind {
    Off,
    Solid,
    Rainbow,
    Blink,
    Breathe,
}

/// Map a 0..=255 wheel position onto an RGB color
fn color_wheel(pos: u8) -> Rgb {
    let pos = 255u8.wrapping_sub(pos);
    if pos < 85 {
        Rgb::new(255 - pos * 3, 0, pos * 3)
    } else if pos < 170 {
        let pos = pos - 85;
        Rgb::new(0, pos * 3, 255 - pos * 3)
    } else {
        let pos = pos - 170;
        Rgb::new(pos * 3, 255 - pos * 3, 0)
    }
}

/// The feedback animation state machine
pub struct LedEngine {
    kind: EffectKind,
    /// Base colors, set by the solid commands; breathe scales these
    pixels: [Rgb; PIXEL_COUNT],
    hue: u8,
    blink_on: bool,
    blink_next: Instant,
    brightness: i16,
    rising: bool,
}

impl LedEngine {
    pub fn new(start: Instant) -> Self {
        Self {
            kind: EffectKind::Off,
            pixels: [Rgb::OFF; PIXEL_COUNT],
            hue: 0,
            blink_on: false,
            blink_next: start,
            brightness: 0,
            rising: true,
        }
    }

    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    /// Switch the active effect, resetting all phase state.
    pub fn set_effect<L: LightStrip>(&mut self, strip: &mut L, kind: EffectKind, now: Instant) {
        self.kind = kind;
        self.hue = 0;
        self.blink_on = false;
        self.blink_next = now;
        self.brightness = 0;
        self.rising = true;

        match kind {
            EffectKind::Off => strip.write(&[Rgb::OFF; PIXEL_COUNT]),
            // Solid re-asserts the stored base colors once.
            EffectKind::Solid => strip.write(&self.pixels),
            _ => {}
        }
    }

    /// Direct color set for one pixel; switches to the solid effect.
    pub fn set_pixel<L: LightStrip>(&mut self, strip: &mut L, index: usize, color: Rgb) {
        if index < PIXEL_COUNT {
            self.pixels[index] = color;
        }
        self.kind = EffectKind::Solid;
        strip.write(&self.pixels);
    }

    /// Direct color set for the whole strip; switches to the solid effect.
    pub fn set_all<L: LightStrip>(&mut self, strip: &mut L, color: Rgb) {
        self.pixels = [color; PIXEL_COUNT];
        self.kind = EffectKind::Solid;
        strip.write(&self.pixels);
    }

    /// Advance one effect tick.
    pub fn step<L: LightStrip>(&mut self, strip: &mut L, now: Instant) {
        match self.kind {
            EffectKind::Off | EffectKind::Solid => {}
            EffectKind::Rainbow => {
                let mut out = [Rgb::OFF; PIXEL_COUNT];
                for (i, px) in out.iter_mut().enumerate() {
                    *px = color_wheel(self.hue.wrapping_add(i as u8 * HUE_SPREAD));
                }
                self.hue = self.hue.wrapping_add(1);
                strip.write(&out);
            }
            EffectKind::Blink => {
                if now >= self.blink_next {
                    self.blink_on = !self.blink_on;
                    let color = if self.blink_on { Rgb::WHITE } else { Rgb::OFF };
                    strip.write(&[color; PIXEL_COUNT]);
                    self.blink_next = now + BLINK_PERIOD;
                }
            }
            EffectKind::Breathe => {
                let step = if self.rising { BREATHE_STEP } else { -BREATHE_STEP };
                self.brightness += step;
                if self.brightness >= 255 || self.brightness <= 0 {
                    self.rising = !self.rising;
                }
                let level = self.brightness.clamp(0, 255) as u8;
                let mut out = self.pixels;
                for px in out.iter_mut() {
                    *px = px.scaled(level);
                }
                strip.write(&out);
            }
        }
    }
}
