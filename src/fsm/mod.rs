//! Function-pointer mode machine.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                      │
//! │  ┌───────────────────┬──────────┬──────────┬──────────────────┐  │
//! │  │ OperatingMode     │ on_enter │ on_exit  │ on_update        │  │
//! │  ├───────────────────┼──────────┼──────────┼──────────────────┤  │
//! │  │ Initializing      │ fn(ctx)  │    -     │ fn(ctx)->Option  │  │
//! │  │ AwaitingTipChange │ fn(ctx)  │    -     │ fn(ctx)->Option  │  │
//! │  │ Idle              │ fn(ctx)  │    -     │ fn(ctx)->Option  │  │
//! │  │ Heating           │ fn(ctx)  │    -     │ fn(ctx)->Option  │  │
//! │  │ Standby           │ fn(ctx)  │    -     │ fn(ctx)->Option  │  │
//! │  │ Fault             │ fn(ctx)  │ fn(ctx)  │ fn(ctx)->Option  │  │
//! │  └───────────────────┴──────────┴──────────┴──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Once per control tick the engine calls `on_update` for the current
//! mode.  `Some(next)` runs `on_exit(current)`, then `on_enter(next)`.
//! Handlers only touch [`FsmContext`]; the controller turns the commands
//! they leave there into port calls.
//!
//! `tick` and `force_transition` run under the shared controller lock and
//! never log.  Transitions are reported as `ModeChanged` events once the
//! lock is released.

pub mod context;
pub mod states;

use context::FsmContext;
use log::info;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Top-level operating modes.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OperatingMode {
    Initializing = 0,
    AwaitingTipChange = 1,
    Idle = 2,
    Heating = 3,
    Standby = 4,
    Fault = 5,
}

impl OperatingMode {
    /// Number of modes; sizes the table array.
    pub const COUNT: usize = 6;

    /// Index back to mode.  Out-of-range indices map to `Fault`.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Initializing,
            1 => Self::AwaitingTipChange,
            2 => Self::Idle,
            3 => Self::Heating,
            4 => Self::Standby,
            5 => Self::Fault,
            _ => {
                debug_assert!(false, "invalid mode index: {idx}");
                Self::Fault
            }
        }
    }

    /// Modes in which a good sample may plan heat.
    pub fn regulates(self) -> bool {
        matches!(self, Self::Heating | Self::Standby)
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit` action, run once per transition.
pub type StateActionFn = fn(&mut FsmContext);

/// Per-tick handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut FsmContext) -> Option<OperatingMode>;

// ---------------------------------------------------------------------------
// State descriptor (one row in the table)
// ---------------------------------------------------------------------------

pub struct StateDescriptor {
    pub id: OperatingMode,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Indexed by `OperatingMode as usize`.
    table: [StateDescriptor; OperatingMode::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; OperatingMode::COUNT], initial: OperatingMode) -> Self {
        debug_assert!(
            table.iter().enumerate().all(|(i, row)| row.id as usize == i),
            "state table out of order"
        );
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run `on_enter` for the initial mode.  Call once before the first
    /// [`tick`](Self::tick).
    pub fn start(&mut self, ctx: &mut FsmContext) {
        info!("mode machine starting in {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Advance by one control tick.
    pub fn tick(&mut self, ctx: &mut FsmContext) {
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    /// Immediate transition bypassing `on_update` (safety pre-emption).
    /// No-op when already in `next`.
    pub fn force_transition(&mut self, next: OperatingMode, ctx: &mut FsmContext) {
        if next as usize != self.current {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> OperatingMode {
        OperatingMode::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: OperatingMode, ctx: &mut FsmContext) {
        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next as usize;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
