//! Outbound application events and display payloads.
//!
//! The [`Controller`](super::service::Controller) emits [`AppEvent`]s through
//! the [`EventSink`](super::ports::EventSink) port and pushes
//! [`StatusSnapshot`]s / [`DisplayMessage`]s to the
//! [`DisplayPort`](super::ports::DisplayPort).
//!
//! A control tick collects all of these into a [`TickOutput`] while the
//! controller is locked; the caller delivers it once the lock is released.

use heapless::Vec;

use super::ports::{DisplayPort, EventSink};
use crate::error::TipTemperature;
use crate::fsm::OperatingMode;
use crate::sensors::thermocouple::TipPresence;

/// Structured events emitted by the control tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller has started (carries initial mode).
    Started(OperatingMode),

    /// The mode machine transitioned.
    ModeChanged { from: OperatingMode, to: OperatingMode },

    /// One or more safety faults were raised (bitmask of `SafetyFault`).
    FaultDetected(u8),

    /// All safety faults have been cleared.
    FaultCleared,

    /// Tip presence changed since the previous tick.
    TipPresenceChanged(TipPresence),

    /// Sample buffers discarded for deviation since the previous tick.
    SamplesRejected(u16),

    /// Target temperature changed (°C).
    TargetChanged(u16),
}

/// Transient status text codes for the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMessage {
    Off,
    On,
    Wait,
    TipDetected,
    TipNotDetected,
    TipCheckError,
    AcNotDetected,
    Overheating,
    ReadingError,
}

/// Everything the display needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub mode: OperatingMode,
    pub tip_temperature: TipTemperature,
    pub tip_presence: TipPresence,
    pub target_c: u16,
    /// Half-cycles planned per sample at the last recompute (power bar).
    pub power_half_cycles: u8,
    pub fault_flags: u8,
}

/// Most events a single control tick raises: target, fault, mode, tip
/// presence, rejected bursts.
pub const MAX_TICK_EVENTS: usize = 8;

/// Everything one control tick has to report, gathered under the lock.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutput {
    events: Vec<AppEvent, MAX_TICK_EVENTS>,
    message: Option<DisplayMessage>,
    status: Option<StatusSnapshot>,
}

impl TickOutput {
    pub(crate) fn push_event(&mut self, event: AppEvent) {
        // Capacity covers every event kind a tick can raise once.
        let _ = self.events.push(event);
    }

    pub(crate) fn set_message(&mut self, message: DisplayMessage) {
        self.message = Some(message);
    }

    pub(crate) fn set_status(&mut self, status: StatusSnapshot) {
        self.status = Some(status);
    }

    pub fn events(&self) -> &[AppEvent] {
        &self.events
    }

    pub fn message(&self) -> Option<DisplayMessage> {
        self.message
    }

    /// Frame to draw, if it changed or a redraw was requested.
    pub fn status(&self) -> Option<&StatusSnapshot> {
        self.status.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.message.is_none() && self.status.is_none()
    }

    /// Hand the message, the frame and then the events to their ports.
    pub fn deliver(&self, display: &mut impl DisplayPort, sink: &mut impl EventSink) {
        if let Some(message) = self.message {
            display.show_message(message);
        }
        if let Some(status) = &self.status {
            display.show_status(status);
        }
        for event in &self.events {
            sink.emit(event);
        }
    }
}
