//! Open-loop duty-cycle regulator.
//!
//! Power is delivered in whole mains half-cycles.  After each good sample
//! the regulator plans how many of the following half-cycles to energize
//! (`pending_on_half_cycles`); the zero-cross path then consumes that plan
//! one half-cycle at a time.  When the plan runs out the scheduler samples
//! again, so at full power the heater sees `max_on_half_cycles` energized
//! half-cycles for every sampling half-cycle.
//!
//! | error (effective target − tip)   | planned half-cycles              |
//! |----------------------------------|----------------------------------|
//! | `≤ hysteresis`                   | 0                                |
//! | `> hysteresis`, `< per_cycle`    | 1                                |
//! | otherwise                        | `error / per_cycle`, capped      |

use crate::config::ControllerConfig;
use crate::error::TipTemperature;
use crate::fsm::OperatingMode;

/// Per-zero-cross decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDecision {
    Energize,
    /// Leave the heater off and run the sampling sequence.
    DeEnergize,
}

pub struct HeaterRegulator {
    target_c: u16,
    pending_on_half_cycles: u8,
    last_on_half_cycles: u8,
    energize_history: u32,

    min_temp_c: u16,
    max_temp_c: u16,
    standby_temp_c: u16,
    hysteresis_c: u16,
    error_per_half_cycle_c: u16,
    max_on_half_cycles: u8,
}

impl HeaterRegulator {
    pub fn new(config: &ControllerConfig) -> Self {
        let mut reg = Self {
            target_c: 0,
            pending_on_half_cycles: 0,
            last_on_half_cycles: 0,
            energize_history: 0,
            min_temp_c: config.min_temp_c,
            max_temp_c: config.max_temp_c,
            standby_temp_c: config.standby_temp_c,
            hysteresis_c: config.hysteresis_c,
            error_per_half_cycle_c: config.error_per_half_cycle_c.max(1),
            max_on_half_cycles: config.max_on_half_cycles,
        };
        reg.set_target(config.default_target_c);
        reg
    }

    // ── Target ────────────────────────────────────────────────

    /// Set the target, clamped to `[min_temp_c, max_temp_c]`.
    /// Returns the value actually stored.
    pub fn set_target(&mut self, target_c: u16) -> u16 {
        self.target_c = target_c.clamp(self.min_temp_c, self.max_temp_c);
        self.target_c
    }

    /// Shift the target by `delta_c`, clamped like [`set_target`](Self::set_target).
    pub fn adjust_target(&mut self, delta_c: i16) -> u16 {
        let shifted = (i32::from(self.target_c) + i32::from(delta_c)).clamp(0, i32::from(u16::MAX));
        self.set_target(shifted as u16)
    }

    pub fn target(&self) -> u16 {
        self.target_c
    }

    /// Target actually regulated to in `mode`.
    pub fn effective_target(&self, mode: OperatingMode) -> u16 {
        if mode == OperatingMode::Standby {
            self.target_c.min(self.standby_temp_c)
        } else {
            self.target_c
        }
    }

    // ── Control ───────────────────────────────────────────────

    /// Plan the next burst from a fresh reading.  Only called after a good
    /// sample while heating or in standby.
    pub fn recompute(&mut self, current_c: u16, mode: OperatingMode) {
        let target = i32::from(self.effective_target(mode));
        let current = i32::from(current_c);

        self.pending_on_half_cycles = if current + i32::from(self.hysteresis_c) < target {
            let error = target - current;
            let cycles = error / i32::from(self.error_per_half_cycle_c);
            cycles.clamp(1, i32::from(self.max_on_half_cycles)) as u8
        } else {
            0
        };
        self.last_on_half_cycles = self.pending_on_half_cycles;
    }

    /// Called once per true zero-cross.  Energizes only with a plan left
    /// and a valid reading below `max_temp_c`.
    pub fn consume_one_cycle(&mut self, current: TipTemperature) -> CycleDecision {
        let below_max = matches!(current, Ok(t) if t < self.max_temp_c);
        let decision = if self.pending_on_half_cycles >= 1 && below_max {
            self.pending_on_half_cycles -= 1;
            CycleDecision::Energize
        } else {
            CycleDecision::DeEnergize
        };
        self.energize_history =
            (self.energize_history << 1) | u32::from(decision == CycleDecision::Energize);
        decision
    }

    /// Drop any planned heat.  Idempotent.
    pub fn force_off(&mut self) {
        self.pending_on_half_cycles = 0;
        self.last_on_half_cycles = 0;
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn pending_on_half_cycles(&self) -> u8 {
        self.pending_on_half_cycles
    }

    pub fn last_on_half_cycles(&self) -> u8 {
        self.last_on_half_cycles
    }

    pub fn energize_history(&self) -> u32 {
        self.energize_history
    }
}
