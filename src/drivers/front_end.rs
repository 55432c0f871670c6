//! Heater and thermocouple front-end output driver.
//!
//! Drives the three output lines the controller touches on every
//! half-cycle:
//!
//! | Line   | Active level | Meaning                                  |
//! |--------|--------------|------------------------------------------|
//! | heater | high         | triac fires on the next half-cycle       |
//! | clamp  | low          | amplifier input shorted (open-drain)     |
//! | bias   | high         | pull-up applied for the tip-presence test |
//!
//! Generic over `embedded_hal::digital::OutputPin` so it runs against the
//! raw ESP-IDF pins on target and recording pins in tests.  Write errors
//! are counted rather than propagated: the callers run in interrupt
//! context with nowhere to send them.

use embedded_hal::digital::OutputPin;

use crate::app::ports::FrontEndPort;

pub struct FrontEnd<H, C, B> {
    heater: H,
    clamp: C,
    bias: B,
    write_errors: u32,
}

impl<H: OutputPin, C: OutputPin, B: OutputPin> FrontEnd<H, C, B> {
    /// Take ownership of the pins and drive them to the safe state:
    /// heater off, input clamped, bias off.
    pub fn new(heater: H, clamp: C, bias: B) -> Self {
        let mut fe = Self {
            heater,
            clamp,
            bias,
            write_errors: 0,
        };
        fe.set_heater_output(false);
        fe.set_tip_clamp(true);
        fe.set_tip_check_bias(false);
        fe
    }

    /// Pin writes that have failed since boot.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn record<E>(&mut self, result: Result<(), E>) {
        if result.is_err() {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

impl<H: OutputPin, C: OutputPin, B: OutputPin> FrontEndPort for FrontEnd<H, C, B> {
    fn set_heater_output(&mut self, on: bool) {
        let r = if on { self.heater.set_high() } else { self.heater.set_low() };
        self.record(r);
    }

    fn set_tip_check_bias(&mut self, on: bool) {
        let r = if on { self.bias.set_high() } else { self.bias.set_low() };
        self.record(r);
    }

    fn set_tip_clamp(&mut self, clamped: bool) {
        let r = if clamped { self.clamp.set_low() } else { self.clamp.set_high() };
        self.record(r);
    }
}
