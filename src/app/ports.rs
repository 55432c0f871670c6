//! Port traits: the hexagonal boundary between the control core and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (front-end pins, timers, ADC, HID, display, event sinks)
//! implement these traits.  The [`Controller`](super::service::Controller)
//! takes them as generic parameters at each call site, so the control core
//! never touches a register directly and runs unchanged against the mocks
//! in `tests/integration/`.
//!
//! Every output call is synchronous and infallible at the port.  Drivers
//! absorb pin-level errors; the core must be able to force the heater off
//! from any handler without an error path.

use super::events::{AppEvent, DisplayMessage, StatusSnapshot};

// ───────────────────────────────────────────────────────────────
// Time source
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.  Wraps at `u32::MAX`.
pub trait TickSource {
    fn now_ms(&self) -> u32;
}

/// `true` when `now` is strictly past `deadline`, tolerating wrap-around
/// of the millisecond counter (deadlines less than ~24 days away).
pub fn is_after(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) > 0
}

// ───────────────────────────────────────────────────────────────
// Analog front end outputs (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// The three digital outputs around the heater and thermocouple input.
pub trait FrontEndPort {
    /// Drive the heater switch.  Only [`HeaterInterlock`] may pass `true`.
    ///
    /// [`HeaterInterlock`]: crate::heater::interlock::HeaterInterlock
    fn set_heater_output(&mut self, on: bool);

    /// Bias the thermocouple input so that an open circuit reads full scale.
    fn set_tip_check_bias(&mut self, on: bool);

    /// `true` shorts the amplifier input (clamped), `false` releases it to
    /// high impedance for sampling.
    fn set_tip_clamp(&mut self, clamped: bool);
}

// ───────────────────────────────────────────────────────────────
// Settle timer (one hardware one-shot reused for every phase)
// ───────────────────────────────────────────────────────────────

pub trait SettleTimerPort {
    /// (Re)start the one-shot; expiry calls `Controller::on_settle_timer`.
    fn start_settle_timer(&mut self, delay_us: u32);

    /// Cancel a pending expiry.  Harmless when idle.
    fn stop_settle_timer(&mut self);
}

// ───────────────────────────────────────────────────────────────
// ADC
// ───────────────────────────────────────────────────────────────

pub trait AdcPort {
    /// Begin filling the sample buffer.  Completion is reported
    /// asynchronously through `Controller::on_conversion_complete`.
    fn start_conversion(&mut self);
}

// ───────────────────────────────────────────────────────────────
// HID collaborator (debounced inputs)
// ───────────────────────────────────────────────────────────────

pub trait HidPort {
    /// Tool is resting in its holder.
    fn tool_in_holder(&self) -> bool;

    /// Tip-change lever / sensor is asserted.
    fn tip_change_asserted(&self) -> bool;

    /// Target temperature change requested since the last call (°C).
    /// Returns `0` when nothing is pending.
    fn take_target_delta(&mut self) -> i16;
}

// ───────────────────────────────────────────────────────────────
// Display collaborator
// ───────────────────────────────────────────────────────────────

pub trait DisplayPort {
    fn show_status(&mut self, status: &StatusSnapshot);
    fn show_message(&mut self, message: DisplayMessage);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The control tick emits structured [`AppEvent`]s through this port.
/// Interrupt-path handlers never do.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}
