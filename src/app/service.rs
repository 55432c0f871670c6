//! Controller: the hexagonal core.
//!
//! [`Controller`] owns the mode machine, safety supervisor, zero-cross
//! scheduler, regulator, sampler and heater interlock.  Board access flows
//! through port traits passed in at each call, so the whole control loop
//! runs on the host against mock adapters.
//!
//! ```text
//!  zero-cross edge ──▶ on_zero_cross ─┐
//!  settle timer   ──▶ on_settle_timer ├─▶ ┌──────────────────────────┐ ──▶ FrontEndPort
//!  ADC complete   ──▶ on_conversion  ─┘   │        Controller        │ ──▶ SettleTimer/Adc
//!                                         │ Scheduler · Regulator ·  │
//!  control tick   ──▶ step ──────────────▶│ Sampler · Interlock ·    │ ──▶ TickOutput
//!  TickInputs     ──▶                     │ Safety · Mode FSM        │
//!                                         └──────────────────────────┘
//! ```
//!
//! [`SharedController`] puts the controller and its board behind one
//! critical-section mutex so every interrupt and the tick get exclusive
//! access for the length of a single handler.  Nothing reachable from the
//! lock logs or touches the display: the interrupt handlers emit nothing,
//! and [`Controller::step`] hands back a [`TickOutput`] that the caller
//! delivers after the lock is released.  Anything worth reporting from
//! the interrupts (rejected bursts, tip presence changes) is picked up by
//! the next step.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::config::ControllerConfig;
use crate::error::{ReadingError, Result, SafetyFault, TipTemperature};
use crate::fsm::context::{FsmContext, ToolInputs};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, OperatingMode};
use crate::heater::interlock::{HeaterInterlock, InterlockState};
use crate::heater::regulator::HeaterRegulator;
use crate::safety::SafetySupervisor;
use crate::scheduler::{PhaseAction, SettlePhase, ZeroCrossScheduler};
use crate::sensors::thermocouple::{SampleOutcome, ThermocoupleSampler, TipPresence};

use super::commands::AppCommand;
use super::events::{AppEvent, StatusSnapshot, TickOutput};
use super::ports::{AdcPort, DisplayPort, EventSink, FrontEndPort, HidPort, SettleTimerPort};

// ───────────────────────────────────────────────────────────────
// TickInputs
// ───────────────────────────────────────────────────────────────

/// HID state sampled before a control tick, outside the shared lock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInputs {
    pub tool_in_holder: bool,
    pub tip_change_asserted: bool,
    /// Target change requested since the last tick (°C).
    pub target_delta: i16,
}

impl TickInputs {
    pub fn read(hid: &mut impl HidPort) -> Self {
        Self {
            tool_in_holder: hid.tool_in_holder(),
            tip_change_asserted: hid.tip_change_asserted(),
            target_delta: hid.take_target_delta(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

pub struct Controller {
    fsm: Fsm,
    ctx: FsmContext,
    safety: SafetySupervisor,
    scheduler: ZeroCrossScheduler,
    regulator: HeaterRegulator,
    sampler: ThermocoupleSampler,
    interlock: HeaterInterlock,
    /// Bursts rejected by the sampler since the last tick.
    rejected_bursts: u16,
    /// Presence reported at the last tick.
    last_presence: TipPresence,
    /// Last frame pushed to the display.
    last_status: Option<StatusSnapshot>,
}

impl Controller {
    /// Build the controller from a validated configuration.
    ///
    /// Does **not** start the mode machine; call [`start`](Self::start) next.
    pub fn new(config: ControllerConfig) -> Result<Self> {
        config.validate()?;

        let safety = SafetySupervisor::new(&config);
        let scheduler = ZeroCrossScheduler::new(&config);
        let regulator = HeaterRegulator::new(&config);
        let sampler = ThermocoupleSampler::new(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), OperatingMode::Initializing);

        Ok(Self {
            fsm,
            ctx,
            safety,
            scheduler,
            regulator,
            sampler,
            interlock: HeaterInterlock::new(),
            rejected_bursts: 0,
            last_presence: TipPresence::NotDetected,
            last_status: None,
        })
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter `Initializing` and put the board in its safe state.
    pub fn start(
        &mut self,
        hw: &mut (impl FrontEndPort + SettleTimerPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        hw.set_heater_output(false);
        hw.set_tip_check_bias(false);
        hw.set_tip_clamp(true);

        self.fsm.start(&mut self.ctx);
        let mut out = TickOutput::default();
        self.apply_commands(hw, &mut out);
        out.push_event(AppEvent::Started(self.fsm.current_state()));
        out.deliver(display, sink);
    }

    // ── Interrupt entry points ────────────────────────────────

    /// Zero-cross detector edge.
    pub fn on_zero_cross(&mut self, now_ms: u32, hw: &mut (impl FrontEndPort + SettleTimerPort)) {
        self.scheduler.on_zero_cross_edge(now_ms, hw);
    }

    /// Settle-timer expiry.
    pub fn on_settle_timer(
        &mut self,
        hw: &mut (impl FrontEndPort + SettleTimerPort + AdcPort),
    ) -> PhaseAction {
        self.scheduler.on_settle_timer(
            &mut self.regulator,
            &mut self.sampler,
            &self.interlock,
            hw,
        )
    }

    /// ADC burst complete.  Re-clamps the input, then lets the sampler
    /// judge the burst.  A good temperature re-arms the interlock and,
    /// while heating or in standby, plans the next burst of heat.
    pub fn on_conversion_complete(
        &mut self,
        samples: &[u16],
        hw: &mut impl FrontEndPort,
    ) -> SampleOutcome {
        hw.set_tip_clamp(true);

        let outcome = self.sampler.on_conversion_complete(samples, hw);
        match outcome {
            SampleOutcome::Temperature(celsius) => {
                self.interlock.rearm();
                let mode = self.fsm.current_state();
                if mode.regulates() {
                    self.regulator.recompute(celsius, mode);
                }
            }
            SampleOutcome::Rejected(_) => {
                self.interlock.disarm();
                self.rejected_bursts = self.rejected_bursts.saturating_add(1);
            }
            SampleOutcome::TipCheck(_) | SampleOutcome::Discarded | SampleOutcome::NoTip => {}
        }
        outcome
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One control tick: safety → mode machine → outputs.
    ///
    /// Only mutates state.  Events, the message and the status frame are
    /// returned for the caller to deliver once the shared lock is released.
    pub fn step(
        &mut self,
        now_ms: u32,
        inputs: TickInputs,
        hw: &mut (impl FrontEndPort + SettleTimerPort),
    ) -> TickOutput {
        let mut out = TickOutput::default();
        let prev_mode = self.fsm.current_state();
        let prev_faults = self.ctx.fault_flags;
        self.ctx.now_ms = now_ms;

        // 1. HID inputs
        if inputs.target_delta != 0 {
            if let Some(event) = self.apply_command(AppCommand::AdjustTarget(inputs.target_delta)) {
                out.push_event(event);
            }
        }
        let tip_temperature = self.sampler.tip_temperature();
        self.ctx.inputs = ToolInputs {
            tip: self.sampler.tip_presence(),
            tool_in_holder: inputs.tool_in_holder,
            tip_change_asserted: inputs.tip_change_asserted,
            reading_rejected: matches!(
                tip_temperature,
                Err(ReadingError::SampleDeviation | ReadingError::EmptyBuffer)
            ),
        };

        // 2. Safety evaluation pre-empts the mode machine
        let mains_lost = self.scheduler.check_mains_sync(now_ms);
        let faults = self.safety.evaluate(mains_lost, tip_temperature);
        self.ctx.fault_flags = faults;

        if faults != 0 {
            if self.safety.has_fault(SafetyFault::OverTemperature) {
                self.interlock.latch();
            } else {
                self.interlock.disarm();
            }
            self.regulator.force_off();
            hw.set_heater_output(false);

            if faults & !prev_faults != 0 {
                out.push_event(AppEvent::FaultDetected(faults));
            }
            self.fsm.force_transition(OperatingMode::Fault, &mut self.ctx);
        } else if prev_faults != 0 {
            out.push_event(AppEvent::FaultCleared);
        }

        // 3. Mode machine
        self.fsm.tick(&mut self.ctx);

        // 4. Outputs
        self.apply_commands(hw, &mut out);

        // 5. Events
        let mode = self.fsm.current_state();
        if mode != prev_mode {
            out.push_event(AppEvent::ModeChanged {
                from: prev_mode,
                to: mode,
            });
        }
        let presence = self.sampler.tip_presence();
        if presence != self.last_presence {
            self.last_presence = presence;
            out.push_event(AppEvent::TipPresenceChanged(presence));
        }
        if self.rejected_bursts > 0 {
            out.push_event(AppEvent::SamplesRejected(self.rejected_bursts));
            self.rejected_bursts = 0;
        }
        out
    }

    /// [`step`](Self::step) with the HID read first and the output
    /// delivered straight away.  For callers that own the controller.
    pub fn tick(
        &mut self,
        now_ms: u32,
        hid: &mut impl HidPort,
        hw: &mut (impl FrontEndPort + SettleTimerPort),
        display: &mut impl DisplayPort,
        sink: &mut impl EventSink,
    ) {
        let inputs = TickInputs::read(hid);
        self.step(now_ms, inputs, hw).deliver(display, sink);
    }

    // ── Command handling ──────────────────────────────────────

    pub fn handle_command(&mut self, cmd: AppCommand, sink: &mut impl EventSink) {
        if let Some(event) = self.apply_command(cmd) {
            sink.emit(&event);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Frame for the display.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            mode: self.fsm.current_state(),
            tip_temperature: self.sampler.tip_temperature(),
            tip_presence: self.sampler.tip_presence(),
            target_c: self.regulator.target(),
            power_half_cycles: self.regulator.last_on_half_cycles(),
            fault_flags: self.ctx.fault_flags,
        }
    }

    pub fn mode(&self) -> OperatingMode {
        self.fsm.current_state()
    }

    pub fn tip_temperature(&self) -> TipTemperature {
        self.sampler.tip_temperature()
    }

    pub fn tip_presence(&self) -> TipPresence {
        self.sampler.tip_presence()
    }

    pub fn target_temperature(&self) -> u16 {
        self.regulator.target()
    }

    pub fn pending_on_half_cycles(&self) -> u8 {
        self.regulator.pending_on_half_cycles()
    }

    /// One bit per half-cycle, newest in bit 0.
    pub fn energize_history(&self) -> u32 {
        self.regulator.energize_history()
    }

    pub fn interlock_state(&self) -> InterlockState {
        self.interlock.state()
    }

    pub fn settle_phase(&self) -> SettlePhase {
        self.scheduler.phase()
    }

    /// Current active fault bitmask (0 = no faults).
    pub fn fault_flags(&self) -> u8 {
        self.ctx.fault_flags
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.ctx.config
    }

    // ── Internal ──────────────────────────────────────────────

    /// Change the target; `TargetChanged` if it moved.
    fn apply_command(&mut self, cmd: AppCommand) -> Option<AppEvent> {
        let before = self.regulator.target();
        let after = match cmd {
            AppCommand::SetTarget(c) => self.regulator.set_target(c),
            AppCommand::AdjustTarget(delta) => self.regulator.adjust_target(delta),
            AppCommand::StepTarget(detents) => {
                let step = i16::try_from(self.ctx.config.temp_step_c).unwrap_or(i16::MAX);
                self.regulator
                    .adjust_target(i16::from(detents).saturating_mul(step))
            }
        };
        (after != before).then_some(AppEvent::TargetChanged(after))
    }

    /// Translate the mode machine's commands into port calls and display
    /// output.
    fn apply_commands(&mut self, hw: &mut (impl FrontEndPort + SettleTimerPort), out: &mut TickOutput) {
        let cmds = self.ctx.take_commands();

        if cmds.halt_heater {
            self.scheduler.abort(hw);
        }
        if cmds.force_heater_off {
            self.regulator.force_off();
            hw.set_heater_output(false);
        }
        if cmds.release_interlock_latch {
            self.interlock.release_latch();
        }

        if let Some(message) = cmds.message {
            out.set_message(message);
        }
        let status = self.status();
        if cmds.refresh_display || self.last_status != Some(status) {
            out.set_status(status);
            self.last_status = Some(status);
        }
    }
}

// ───────────────────────────────────────────────────────────────
// SharedController
// ───────────────────────────────────────────────────────────────

/// Controller plus board, shared between interrupt handlers and the
/// control tick.
///
/// `const`-constructible so it can live in a `static`; filled once by
/// [`install`](Self::install) during boot.
pub struct SharedController<B> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Option<(Controller, B)>>>,
}

impl<B> Default for SharedController<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> SharedController<B> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Hand over the controller and its board.  Replaces any previous pair.
    pub fn install(&self, controller: Controller, board: B) {
        self.inner.lock(|cell| {
            cell.replace(Some((controller, board)));
        });
    }

    /// Run `f` with exclusive access inside a critical section.
    ///
    /// Returns `None` before [`install`](Self::install) or on re-entry.
    pub fn with<R>(&self, f: impl FnOnce(&mut Controller, &mut B) -> R) -> Option<R> {
        self.inner.lock(|cell| {
            let mut slot = cell.try_borrow_mut().ok()?;
            let (controller, board) = slot.as_mut()?;
            Some(f(controller, board))
        })
    }

    pub fn is_installed(&self) -> bool {
        self.inner
            .lock(|cell| cell.try_borrow().map(|slot| slot.is_some()).unwrap_or(false))
    }
}
