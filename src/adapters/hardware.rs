//! Hardware adapter: bridges the board to the controller's output ports.
//!
//! Owns the front-end pin driver and fronts the settle timer and the ADC.
//! This is the board half of the [`SharedController`] pair, so every
//! interrupt handler gets it together with the controller.
//!
//! The ADC is read in bursts by the settle-timer task *after* the shared
//! lock is released: [`AdcPort::start_conversion`] only records the
//! request, and the caller collects it with
//! [`take_conversion_request`](HardwareAdapter::take_conversion_request).
//!
//! [`SharedController`]: crate::app::service::SharedController


use crate::app::ports::{AdcPort, FrontEndPort, SettleTimerPort};
use crate::drivers::hw_timer;

pub struct HardwareAdapter<F> {
    front_end: F,
    conversion_requested: bool,
}

impl<F: FrontEndPort> HardwareAdapter<F> {
    pub fn new(front_end: F) -> Self {
        Self {
            front_end,
            conversion_requested: false,
        }
    }

    /// `true` once per `start_conversion()` call.
    pub fn take_conversion_request(&mut self) -> bool {
        core::mem::take(&mut self.conversion_requested)
    }

    pub fn front_end(&self) -> &F {
        &self.front_end
    }
}

// ── FrontEndPort implementation ───────────────────────────────

impl<F: FrontEndPort> FrontEndPort for HardwareAdapter<F> {
    fn set_heater_output(&mut self, on: bool) {
        self.front_end.set_heater_output(on);
    }

    fn set_tip_check_bias(&mut self, on: bool) {
        self.front_end.set_tip_check_bias(on);
    }

    fn set_tip_clamp(&mut self, clamped: bool) {
        self.front_end.set_tip_clamp(clamped);
    }
}

// ── SettleTimerPort implementation ────────────────────────────

impl<F> SettleTimerPort for HardwareAdapter<F> {
    fn start_settle_timer(&mut self, delay_us: u32) {
        hw_timer::start_settle(delay_us);
    }

    fn stop_settle_timer(&mut self) {
        hw_timer::stop_settle();
    }
}

// ── AdcPort implementation ────────────────────────────────────

impl<F> AdcPort for HardwareAdapter<F> {
    fn start_conversion(&mut self) {
        self.conversion_requested = true;
    }
}
