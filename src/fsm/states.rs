//! Concrete mode handlers and table builder.
//!
//! Each mode is three plain `fn` pointers; no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!  INITIALIZING ──▶ AWAITING_TIP_CHANGE ──[tip ok, delay, lever up]──▶ IDLE
//!                         ▲                                             │ ▲
//!                         │                                       [lifted] [standby timeout]
//!                         │                                             ▼ │
//!                         └──────[lever / tip lost]──────── HEATING ⇄ STANDBY
//!                                                           [holder]  [lifted]
//!
//!  Any mode ──[safety fault]──▶ FAULT ──[faults cleared]──▶ INITIALIZING
//! ```
//!
//! Leaving heat is always explicit: every mode that must not heat raises
//! `force_heater_off` on entry.  Entering `Heating`/`Standby` requests
//! nothing; heat is planned by the next good sample.

use super::context::FsmContext;
use super::{OperatingMode, StateDescriptor};
use crate::app::events::DisplayMessage;
use crate::error::SafetyFault;
use crate::sensors::thermocouple::TipPresence;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; OperatingMode::COUNT] {
    [
        StateDescriptor {
            id: OperatingMode::Initializing,
            name: "Initializing",
            on_enter: Some(initializing_enter),
            on_exit: None,
            on_update: initializing_update,
        },
        StateDescriptor {
            id: OperatingMode::AwaitingTipChange,
            name: "AwaitingTipChange",
            on_enter: Some(awaiting_tip_change_enter),
            on_exit: Some(awaiting_tip_change_exit),
            on_update: awaiting_tip_change_update,
        },
        StateDescriptor {
            id: OperatingMode::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        StateDescriptor {
            id: OperatingMode::Heating,
            name: "Heating",
            on_enter: Some(heating_enter),
            on_exit: None,
            on_update: heating_update,
        },
        StateDescriptor {
            id: OperatingMode::Standby,
            name: "Standby",
            on_enter: Some(standby_enter),
            on_exit: None,
            on_update: standby_update,
        },
        StateDescriptor {
            id: OperatingMode::Fault,
            name: "Fault",
            on_enter: Some(fault_enter),
            on_exit: Some(fault_exit),
            on_update: fault_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  INITIALIZING
// ═══════════════════════════════════════════════════════════════════════════

fn initializing_enter(ctx: &mut FsmContext) {
    ctx.commands.force_heater_off = true;
    ctx.commands.release_interlock_latch = true;
    ctx.redraw();
}

fn initializing_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        return Some(OperatingMode::Fault);
    }
    Some(OperatingMode::AwaitingTipChange)
}

// ═══════════════════════════════════════════════════════════════════════════
//  AWAITING_TIP_CHANGE: heater off until a tip has been seated for a while
// ═══════════════════════════════════════════════════════════════════════════

fn awaiting_tip_change_enter(ctx: &mut FsmContext) {
    ctx.commands.force_heater_off = true;
}

fn awaiting_tip_change_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        return Some(OperatingMode::Fault);
    }

    // Re-asserted every tick: this mode never heats.
    ctx.commands.force_heater_off = true;

    match ctx.inputs.tip {
        TipPresence::NotDetected | TipPresence::CheckError => {
            ctx.tip_insert_deadline_ms = ctx.now_ms.wrapping_add(ctx.config.tip_change_delay_ms);
            let message = if ctx.inputs.tip == TipPresence::CheckError {
                DisplayMessage::TipCheckError
            } else {
                DisplayMessage::TipNotDetected
            };
            ctx.show(message);
            None
        }
        TipPresence::Detected if ctx.inputs.tip_change_asserted => {
            ctx.show(DisplayMessage::Wait);
            None
        }
        TipPresence::Detected if !ctx.expired(ctx.tip_insert_deadline_ms) => {
            ctx.show(DisplayMessage::TipDetected);
            None
        }
        TipPresence::Detected => Some(OperatingMode::Idle),
    }
}

fn awaiting_tip_change_exit(ctx: &mut FsmContext) {
    ctx.redraw();
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE: tip ready, tool resting, no heat
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.commands.force_heater_off = true;
    ctx.show(DisplayMessage::Off);
}

fn idle_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        return Some(OperatingMode::Fault);
    }
    if ctx.inputs.tip_unavailable() {
        return Some(OperatingMode::AwaitingTipChange);
    }
    if !ctx.inputs.tool_in_holder {
        return Some(OperatingMode::Heating);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  HEATING: regulating to the user target
// ═══════════════════════════════════════════════════════════════════════════

fn heating_enter(ctx: &mut FsmContext) {
    ctx.show(DisplayMessage::On);
}

fn heating_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        return Some(OperatingMode::Fault);
    }
    if ctx.inputs.tip_unavailable() {
        return Some(OperatingMode::AwaitingTipChange);
    }
    if ctx.inputs.tool_in_holder {
        return Some(OperatingMode::Standby);
    }
    flag_rejected_reading(ctx);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  STANDBY: tool in holder, regulating to the standby cap
// ═══════════════════════════════════════════════════════════════════════════

fn standby_enter(ctx: &mut FsmContext) {
    let timeout_ms = ctx.config.standby_time_s.saturating_mul(1000);
    ctx.standby_deadline_ms = ctx.now_ms.wrapping_add(timeout_ms);
}

fn standby_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        return Some(OperatingMode::Fault);
    }
    if ctx.inputs.tip_unavailable() {
        return Some(OperatingMode::AwaitingTipChange);
    }
    if !ctx.inputs.tool_in_holder {
        return Some(OperatingMode::Heating);
    }
    if ctx.expired(ctx.standby_deadline_ms) {
        return Some(OperatingMode::Idle);
    }
    flag_rejected_reading(ctx);
    None
}

/// While regulating, a rejected burst shows `ReadingError` until the next
/// good one redraws the screen.
fn flag_rejected_reading(ctx: &mut FsmContext) {
    if ctx.inputs.reading_rejected {
        ctx.show(DisplayMessage::ReadingError);
    } else if ctx.showing(DisplayMessage::ReadingError) {
        ctx.redraw();
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  FAULT: heater hard-disabled until every fault clears
// ═══════════════════════════════════════════════════════════════════════════

fn fault_enter(ctx: &mut FsmContext) {
    ctx.commands.force_heater_off = true;
    ctx.commands.halt_heater = true;
    let message = if ctx.has_fault(SafetyFault::OverTemperature) {
        DisplayMessage::Overheating
    } else {
        DisplayMessage::AcNotDetected
    };
    ctx.show(message);
}

fn fault_update(ctx: &mut FsmContext) -> Option<OperatingMode> {
    if ctx.has_faults() {
        ctx.commands.force_heater_off = true;
        return None;
    }
    Some(OperatingMode::Initializing)
}

fn fault_exit(ctx: &mut FsmContext) {
    ctx.redraw();
}
