//! Push buttons, wired active-low with internal pull-ups.

use embassy_rp::gpio::{Input, Pull};
use trundle_core::hal::ButtonPad;

use crate::system::resources::ButtonResources;

pub struct Buttons {
    pins: [Input<'static>; 4],
}

impl Buttons {
    pub fn new(r: ButtonResources) -> Self {
        Self {
            pins: [
                Input::new(r.a, Pull::Up),
                Input::new(r.b, Pull::Up),
                Input::new(r.c, Pull::Up),
                Input::new(r.d, Pull::Up),
            ],
        }
    }
}

impl ButtonPad for Buttons {
    fn read_raw(&mut self) -> [bool; 4] {
        [
            self.pins[0].is_high(),
            self.pins[1].is_high(),
            self.pins[2].is_high(),
            self.pins[3].is_high(),
        ]
    }
}
