//! Safety supervisor.
//!
//! Runs **every control tick before the mode machine** and accumulates a
//! fault bitmask in `FsmContext.fault_flags`.  Any set bit pre-empts the
//! mode machine: the controller forces `Fault`, disarms the interlock and
//! halts the heater output before state handlers run.
//!
//! ## Fault lifecycle
//!
//! 1. A condition trips (no zero-cross within the AC detection interval,
//!    or a valid reading above the absolute maximum).
//! 2. The supervisor sets the corresponding bit.
//! 3. The controller forces `Fault`; `fault_enter` halts the heater.
//! 4. Each tick the supervisor re-evaluates and clears bits whose
//!    condition is gone.  Mains loss clears on the next zero-cross edge.
//! 5. With `fault_flags == 0`, `fault_update` returns to `Initializing`.
//!
//! The over-temperature bit also latches the interlock `Forbidden`; the
//! latch is released only when `Initializing` is entered again.

use crate::config::ControllerConfig;
use crate::error::{SafetyFault, TipTemperature};

pub struct SafetySupervisor {
    abs_max_temp_c: u16,
    /// Latched fault bitmask.
    faults: u8,
}

impl SafetySupervisor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            abs_max_temp_c: config.abs_max_temp_c,
            faults: 0,
        }
    }

    /// Evaluate all safety conditions.  Returns the updated fault bitmask.
    ///
    /// Runs under the shared controller lock, so it never logs; the
    /// controller reports set and cleared bits as events.
    pub fn evaluate(&mut self, mains_lost: bool, tip: TipTemperature) -> u8 {
        // ── Mains sync ────────────────────────────────────────────
        self.eval_fault(SafetyFault::MainsSyncLost, mains_lost);

        // ── Absolute temperature ──────────────────────────────────
        // Only a valid reading can clear this bit; an error keeps the
        // previous verdict.
        if let Ok(t) = tip {
            self.eval_fault(SafetyFault::OverTemperature, t > self.abs_max_temp_c);
        }

        self.faults
    }

    /// Check if a specific fault is active.
    pub fn has_fault(&self, fault: SafetyFault) -> bool {
        self.faults & fault.mask() != 0
    }

    // ── Internal ──────────────────────────────────────────────────

    /// Set or clear a fault bit based on a boolean condition.
    fn eval_fault(&mut self, fault: SafetyFault, condition: bool) {
        if condition {
            self.faults |= fault.mask();
        } else {
            self.faults &= !fault.mask();
        }
    }
}
