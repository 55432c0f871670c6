//! Inbound commands to the controller.
//!
//! Requests from the user-facing side (encoder, menu, test harness) that
//! the [`Controller`](super::service::Controller) applies on the control
//! tick.

/// Commands that external adapters can send into the control core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Set the target temperature (°C); clamped to the configured range.
    SetTarget(u16),

    /// Move the target by a signed amount (°C).
    AdjustTarget(i16),

    /// Move the target by whole encoder detents of `temp_step_c`.
    StepTarget(i8),
}
