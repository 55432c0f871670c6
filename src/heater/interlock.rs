//! Heater safety interlock.
//!
//! The one gate between "the regulator wants heat" and the heater switch.
//! Every path that could energize the heater goes through
//! [`HeaterInterlock::try_energize`]; nothing else ever drives the output
//! high.
//!
//! ```text
//!            rearm() (good sample)
//!   NotOk ─────────────────────────▶ Ok
//!     ▲  ◀──────────────────────────  │
//!     │     disarm() (sampling, bad   │
//!     │      reading, mains loss)     │
//!     │                               │
//!     └── release_latch() ── Forbidden ◀── latch() (over-temperature)
//! ```
//!
//! The state lives in an `AtomicU8` so the zero-cross path and the control
//! tick can both consult it through a shared reference.

use core::sync::atomic::{AtomicU8, Ordering};

use crate::app::ports::FrontEndPort;

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterlockState {
    /// Last sample was good; heat may be applied.
    Ok = 0,
    /// Sampling in progress, bad reading, or mains lost.
    NotOk = 1,
    /// Latched by a safety fault; only [`HeaterInterlock::release_latch`]
    /// clears it.
    Forbidden = 2,
}

impl InterlockState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Ok,
            1 => Self::NotOk,
            // Anything unexpected is treated as the most restrictive state.
            _ => Self::Forbidden,
        }
    }
}

/// Result of an energize request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergizeOutcome {
    Energized,
    Blocked,
}

pub struct HeaterInterlock {
    state: AtomicU8,
}

impl Default for HeaterInterlock {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterInterlock {
    /// Starts `NotOk`: no heat until the first good sample.
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(InterlockState::NotOk as u8),
        }
    }

    /// Unconditionally overwrite the gate.
    pub fn set_state(&self, state: InterlockState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub fn state(&self) -> InterlockState {
        InterlockState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Drive the heater on if the gate is `Ok`.  Otherwise force the output
    /// off and report `Blocked`.
    pub fn try_energize(&self, out: &mut impl FrontEndPort) -> EnergizeOutcome {
        if self.state() == InterlockState::Ok {
            out.set_heater_output(true);
            EnergizeOutcome::Energized
        } else {
            out.set_heater_output(false);
            EnergizeOutcome::Blocked
        }
    }

    /// `NotOk → Ok` after a successful temperature sample.  Does nothing
    /// when latched `Forbidden`.
    pub fn rearm(&self) -> bool {
        self.transition(InterlockState::NotOk, InterlockState::Ok)
    }

    /// `Ok → NotOk`.  Leaves a `Forbidden` latch in place.
    pub fn disarm(&self) {
        self.transition(InterlockState::Ok, InterlockState::NotOk);
    }

    /// Latch `Forbidden` from any state.
    pub fn latch(&self) {
        self.set_state(InterlockState::Forbidden);
    }

    /// `Forbidden → NotOk`.  The next good sample re-arms as usual.
    pub fn release_latch(&self) -> bool {
        self.transition(InterlockState::Forbidden, InterlockState::NotOk)
    }

    fn transition(&self, from: InterlockState, to: InterlockState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
