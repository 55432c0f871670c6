//! Shared mutable context threaded through every mode handler.
//!
//! `FsmContext` is the blackboard the mode handlers read from and write
//! to: the latest tool inputs, timing, configuration, accumulated safety
//! faults, and the one-shot commands the controller applies after each
//! tick.

use crate::app::events::DisplayMessage;
use crate::app::ports::is_after;
use crate::config::ControllerConfig;
use crate::error::SafetyFault;
use crate::sensors::thermocouple::TipPresence;

// ---------------------------------------------------------------------------
// Inputs (written by the controller before each tick)
// ---------------------------------------------------------------------------

/// Tool state as seen by the mode machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolInputs {
    pub tip: TipPresence,
    pub tool_in_holder: bool,
    pub tip_change_asserted: bool,
    /// The latest burst was thrown away (deviation or empty buffer).
    pub reading_rejected: bool,
}

impl Default for ToolInputs {
    fn default() -> Self {
        Self {
            tip: TipPresence::NotDetected,
            // Resting is the safe assumption: no heat until lifted.
            tool_in_holder: true,
            tip_change_asserted: false,
            reading_rejected: false,
        }
    }
}

impl ToolInputs {
    /// Tip-change lever pulled, or no usable tip.
    pub fn tip_unavailable(&self) -> bool {
        self.tip_change_asserted || self.tip != TipPresence::Detected
    }
}

// ---------------------------------------------------------------------------
// Commands (written by handlers; consumed by the controller)
// ---------------------------------------------------------------------------

/// One-shot requests raised by mode handlers.  The controller applies and
/// clears them after every tick or forced transition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeCommands {
    /// Drop the regulator plan and drive the heater output low.
    pub force_heater_off: bool,
    /// Also cancel the settle sequence and clamp the input.
    pub halt_heater: bool,
    /// Release a `Forbidden` interlock latch.
    pub release_interlock_latch: bool,
    /// Push a fresh status frame to the display.
    pub refresh_display: bool,
    /// Transient text to show.
    pub message: Option<DisplayMessage>,
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

pub struct FsmContext {
    // -- Timing --
    /// Millisecond clock at the current tick.
    pub now_ms: u32,

    // -- Inputs --
    pub inputs: ToolInputs,

    // -- Outputs --
    pub commands: ModeCommands,

    // -- Mode timers --
    /// Tip must stay detected until this time before leaving tip change.
    pub tip_insert_deadline_ms: u32,
    /// Standby drops to idle at this time.
    pub standby_deadline_ms: u32,

    // -- Configuration --
    pub config: ControllerConfig,

    // -- Safety --
    /// Accumulated safety fault bitmask (see `SafetyFault::mask()`).
    pub fault_flags: u8,

    /// Last message handed to the display, to avoid repeating it every tick.
    shown_message: Option<DisplayMessage>,
}

impl FsmContext {
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            now_ms: 0,
            inputs: ToolInputs::default(),
            commands: ModeCommands::default(),
            tip_insert_deadline_ms: 0,
            standby_deadline_ms: 0,
            config,
            fault_flags: 0,
            shown_message: None,
        }
    }

    /// Returns `true` if **any** safety fault is active.
    pub fn has_faults(&self) -> bool {
        self.fault_flags != 0
    }

    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.fault_flags & fault.mask() != 0
    }

    /// `true` once the clock has passed `deadline_ms`.
    pub fn expired(&self, deadline_ms: u32) -> bool {
        is_after(self.now_ms, deadline_ms)
    }

    /// Queue `message` unless it is already on screen.
    pub fn show(&mut self, message: DisplayMessage) {
        if self.shown_message != Some(message) {
            self.shown_message = Some(message);
            self.commands.message = Some(message);
        }
    }

    pub fn showing(&self, message: DisplayMessage) -> bool {
        self.shown_message == Some(message)
    }

    /// Redraw the default screen; forgets the message on display.
    pub fn redraw(&mut self) {
        self.shown_message = None;
        self.commands.refresh_display = true;
    }

    /// Hand the pending commands to the caller and reset them.
    pub fn take_commands(&mut self) -> ModeCommands {
        core::mem::take(&mut self.commands)
    }
}
