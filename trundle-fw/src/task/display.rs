//! SSD1306 status display
//!
//! Rendering goes over the shared I2C bus and is therefore async; the core's
//! synchronous display calls become actions on a small channel and this task
//! repaints after each one. The screen holds four text rows; a glyph clears
//! the rows and paints its face. When no display answers at boot the task
//! keeps draining actions so the rest of the robot is unaffected.

use defmt::warn;
use embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embedded_graphics::mono_font::ascii::FONT_6X10;
use embedded_graphics::mono_font::MonoTextStyleBuilder;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use heapless::String;
use ssd1306::{prelude::*, I2CDisplayInterface, Ssd1306Async};
use trundle_core::command::DISPLAY_TEXT_MAX;
use trundle_core::hal::Display;
use trundle_core::Glyph;

use crate::system::resources::I2cBus;

/// On-screen text rows
const ROWS: usize = 4;

/// Pixel height of one row
const ROW_HEIGHT: i32 = 16;

enum DisplayAction {
    Text {
        line: u8,
        text: String<DISPLAY_TEXT_MAX>,
    },
    Clear,
    Glyph(Glyph),
}

static ACTIONS: Channel<CriticalSectionRawMutex, DisplayAction, 4> = Channel::new();

/// Control-loop-side handle; pushes actions without blocking
pub struct DisplayHandle;

impl DisplayHandle {
    fn push(&self, action: DisplayAction) {
        if ACTIONS.try_send(action).is_err() {
            warn!("display queue full, dropping update");
        }
    }
}

impl Display for DisplayHandle {
    fn render(&mut self, line: u8, text: &str) {
        let Ok(text) = String::try_from(text) else {
            warn!("display text too long, dropping");
            return;
        };
        self.push(DisplayAction::Text { line, text });
    }

    fn clear(&mut self) {
        self.push(DisplayAction::Clear);
    }

    fn render_glyph(&mut self, glyph: Glyph) {
        self.push(DisplayAction::Glyph(glyph));
    }
}

fn glyph_text(glyph: Glyph) -> &'static str {
    match glyph {
        Glyph::Happy => "(^_^)",
        Glyph::Sad => "(T_T)",
        Glyph::Heart => "<3 <3",
        Glyph::Robot => "[o_o]",
    }
}

#[embassy_executor::task]
pub async fn display_render(bus: &'static I2cBus) {
    let i2c = I2cDevice::new(bus);
    let interface = I2CDisplayInterface::new(i2c);
    let mut display = Ssd1306Async::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
        .into_buffered_graphics_mode();

    if display.init().await.is_err() {
        warn!("no display found, discarding render actions");
        loop {
            ACTIONS.receive().await;
        }
    }

    let mut rows: [String<DISPLAY_TEXT_MAX>; ROWS] = Default::default();
    let style = MonoTextStyleBuilder::new()
        .font(&FONT_6X10)
        .text_color(BinaryColor::On)
        .build();

    loop {
        match ACTIONS.receive().await {
            DisplayAction::Text { line, text } => {
                rows[(line as usize).min(ROWS - 1)] = text;
            }
            DisplayAction::Clear => rows = Default::default(),
            DisplayAction::Glyph(glyph) => {
                rows = Default::default();
                rows[1] = String::try_from(glyph_text(glyph)).unwrap_or_default();
            }
        }

        display.clear_buffer();
        for (i, row) in rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            // Drawing into the buffer cannot fail.
            Text::with_baseline(
                row,
                Point::new(0, i as i32 * ROW_HEIGHT),
                style,
                Baseline::Top,
            )
            .draw(&mut display)
            .ok();
        }
        if display.flush().await.is_err() {
            warn!("display flush failed");
        }
    }
}
