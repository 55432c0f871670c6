//! GPIO tool-input adapter.
//!
//! Polls the holder switch, the tip-change lever and the two target
//! buttons once per control tick.  All inputs are active-low.  A button
//! counts once per press, on the falling edge seen between two polls.

use crate::app::ports::HidPort;
use crate::drivers::hw_init::gpio_read;
use crate::pins;

pub struct GpioHid {
    step_c: i16,
    up_was_pressed: bool,
    down_was_pressed: bool,
}

impl GpioHid {
    /// `step_c` is the target change per button press.
    pub fn new(step_c: u16) -> Self {
        Self {
            step_c: i16::try_from(step_c).unwrap_or(i16::MAX),
            up_was_pressed: false,
            down_was_pressed: false,
        }
    }

    fn pressed(gpio: i32) -> bool {
        !gpio_read(gpio)
    }
}

impl HidPort for GpioHid {
    fn tool_in_holder(&self) -> bool {
        Self::pressed(pins::HOLDER_GPIO)
    }

    fn tip_change_asserted(&self) -> bool {
        Self::pressed(pins::TIP_CHANGE_GPIO)
    }

    fn take_target_delta(&mut self) -> i16 {
        let up = Self::pressed(pins::TARGET_UP_GPIO);
        let down = Self::pressed(pins::TARGET_DOWN_GPIO);

        let mut delta = 0;
        if up && !self.up_was_pressed {
            delta += self.step_c;
        }
        if down && !self.down_was_pressed {
            delta -= self.step_c;
        }
        self.up_was_pressed = up;
        self.down_was_pressed = down;
        delta
    }
}
