//! WS2812 strip output
//!
//! The PIO write is async, so the core's synchronous strip writes land in a
//! signal and this task shifts the latest frame out. Intermediate frames that
//! arrive while a write is in flight are coalesced; only the newest survives,
//! which is the right behavior for animation frames.

use embassy_rp::peripherals::PIO0;
use embassy_rp::pio::Pio;
use embassy_rp::pio_programs::ws2812::{PioWs2812, PioWs2812Program};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use smart_leds::RGB8;
use trundle_core::hal::{LightStrip, PIXEL_COUNT};
use trundle_core::Rgb;

use crate::system::resources::{Irqs, LedStripResources};

static FRAME: Signal<CriticalSectionRawMutex, [Rgb; PIXEL_COUNT]> = Signal::new();

/// Control-loop-side handle; writing just publishes the frame
pub struct StripHandle;

impl LightStrip for StripHandle {
    fn write(&mut self, pixels: &[Rgb; PIXEL_COUNT]) {
        FRAME.signal(*pixels);
    }
}

#[embassy_executor::task]
pub async fn led_strip(r: LedStripResources) {
    let Pio {
        mut common, sm0, ..
    } = Pio::new(r.pio, Irqs);
    let program = PioWs2812Program::new(&mut common);
    let mut strip: PioWs2812<'_, PIO0, 0, PIXEL_COUNT> =
        PioWs2812::new(&mut common, sm0, r.dma, r.pin, &program);

    loop {
        let frame = FRAME.wait().await;
        let mut data = [RGB8::default(); PIXEL_COUNT];
        for (out, px) in data.iter_mut().zip(frame.iter()) {
            *out = RGB8::new(px.r, px.g, px.b);
        }
        strip.write(&data).await;
    }
}
