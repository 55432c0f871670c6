//! Zero-cross and phase scheduler.
//!
//! Turns the mains zero-cross edge and one reusable settle timer into the
//! per-half-cycle sequence of the heater loop, and watches for loss of
//! mains sync.
//!
//! ```text
//!  edge ──▶ [zero_cross_delay] ──▶ true zero-cross
//!                                    │ regulator: energize?
//!                     ┌──── yes ─────┤
//!                     ▼              │ no
//!              interlock gate        ▼
//!              (heater on)    heater off, [settle] ──▶ clamp release
//!                                                      (+ tip check bias)
//!                                                         │ [settle]
//!                                                         ▼
//!                                                     ADC start
//! ```
//!
//! Each settle-timer expiry is handled according to [`SettlePhase`]; the
//! phase enum replaces what would otherwise be a toggling flag.


use crate::app::ports::{is_after, AdcPort, FrontEndPort, SettleTimerPort};
use crate::config::ControllerConfig;
use crate::heater::interlock::{EnergizeOutcome, HeaterInterlock};
use crate::heater::regulator::{CycleDecision, HeaterRegulator};
use crate::sensors::thermocouple::{MeasurementMode, ThermocoupleSampler};

/// What the next settle-timer expiry means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlePhase {
    /// Timer not armed.
    Idle,
    /// Edge seen; waiting out the detector offset to the real zero-cross.
    AwaitingTrueZeroCross,
    /// Heater off; waiting for switching noise to die down.
    AwaitingClampRelease,
    /// Input released; waiting for it to settle before converting.
    AwaitingAdcStart,
}

/// Result of one settle-timer expiry, for callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseAction {
    /// Heater energized for this half-cycle.
    Energized,
    /// Energize decision blocked by the interlock.
    Blocked,
    /// Heater off; sampling sequence started.
    SamplingStarted,
    /// Clamp released; `true` when a tip check was armed.
    ClampReleased { tip_check: bool },
    /// Conversion started.
    ConversionStarted,
    /// Spurious expiry with nothing armed.
    Ignored,
}

pub struct ZeroCrossScheduler {
    /// Time of the last detector edge; `None` before the first one.
    last_edge_ms: Option<u32>,
    /// Latched by `check_mains_sync`, cleared only by an edge.
    mains_lost: bool,
    phase: SettlePhase,
    tip_check_counter: u16,

    ac_detection_interval_ms: u32,
    zero_cross_delay_us: u32,
    settle_period_us: u32,
    tip_check_interval: u16,
}

impl ZeroCrossScheduler {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            last_edge_ms: None,
            mains_lost: true,
            phase: SettlePhase::Idle,
            tip_check_counter: 0,
            ac_detection_interval_ms: config.ac_detection_interval_ms,
            zero_cross_delay_us: config.zero_cross_delay_us,
            settle_period_us: config.settle_period_us,
            tip_check_interval: config.tip_check_interval_half_cycles,
        }
    }

    /// Zero-cross detector edge.  Refreshes the mains watchdog and arms the
    /// timer for the true zero-cross.
    ///
    /// An edge arriving mid-sequence abandons the pending sample: the input
    /// is clamped again before the next switching event.
    pub fn on_zero_cross_edge(
        &mut self,
        now_ms: u32,
        hw: &mut (impl FrontEndPort + SettleTimerPort),
    ) {
        self.last_edge_ms = Some(now_ms);
        self.mains_lost = false;

        if matches!(
            self.phase,
            SettlePhase::AwaitingClampRelease | SettlePhase::AwaitingAdcStart
        ) {
            hw.set_tip_clamp(true);
        }

        self.phase = SettlePhase::AwaitingTrueZeroCross;
        hw.start_settle_timer(self.zero_cross_delay_us);
    }

    /// Settle-timer expiry.
    pub fn on_settle_timer(
        &mut self,
        regulator: &mut HeaterRegulator,
        sampler: &mut ThermocoupleSampler,
        interlock: &HeaterInterlock,
        hw: &mut (impl FrontEndPort + SettleTimerPort + AdcPort),
    ) -> PhaseAction {
        match self.phase {
            SettlePhase::Idle => {
                hw.stop_settle_timer();
                PhaseAction::Ignored
            }
            SettlePhase::AwaitingTrueZeroCross => {
                hw.stop_settle_timer();
                self.tip_check_counter = self.tip_check_counter.saturating_add(1);

                match regulator.consume_one_cycle(sampler.tip_temperature()) {
                    CycleDecision::Energize => {
                        self.phase = SettlePhase::Idle;
                        match interlock.try_energize(hw) {
                            EnergizeOutcome::Energized => PhaseAction::Energized,
                            EnergizeOutcome::Blocked => PhaseAction::Blocked,
                        }
                    }
                    CycleDecision::DeEnergize => {
                        hw.set_heater_output(false);
                        self.phase = SettlePhase::AwaitingClampRelease;
                        hw.start_settle_timer(self.settle_period_us);
                        PhaseAction::SamplingStarted
                    }
                }
            }
            SettlePhase::AwaitingClampRelease => {
                interlock.disarm();
                hw.set_heater_output(false);
                hw.set_tip_clamp(false);

                let mut tip_check = false;
                if self.tip_check_counter > self.tip_check_interval
                    && sampler.mode() == MeasurementMode::MeasureTemperature
                {
                    tip_check = sampler.begin_tip_check(hw);
                    self.tip_check_counter = 0;
                }

                self.phase = SettlePhase::AwaitingAdcStart;
                hw.start_settle_timer(self.settle_period_us);
                PhaseAction::ClampReleased { tip_check }
            }
            SettlePhase::AwaitingAdcStart => {
                hw.stop_settle_timer();
                self.phase = SettlePhase::Idle;
                hw.start_conversion();
                PhaseAction::ConversionStarted
            }
        }
    }

    /// Cancel any pending phase and clamp the input.  Used when the heater
    /// output is halted.
    pub fn abort(&mut self, hw: &mut (impl FrontEndPort + SettleTimerPort)) {
        hw.stop_settle_timer();
        hw.set_heater_output(false);
        hw.set_tip_clamp(true);
        self.phase = SettlePhase::Idle;
    }

    /// Mains watchdog, run once per control tick.  `true` when no edge
    /// has arrived for longer than the detection interval, or none at all
    /// since boot.
    ///
    /// The verdict latches until the next edge.  The tick runs far more
    /// often than the interval, so the latch engages long before the
    /// millisecond counter could wrap the comparison back to "in sync".
    /// An edge stamped after `now_ms` (it raced the tick) counts as fresh.
    pub fn check_mains_sync(&mut self, now_ms: u32) -> bool {
        if !self.mains_lost {
            if let Some(edge) = self.last_edge_ms {
                self.mains_lost =
                    is_after(now_ms, edge.wrapping_add(self.ac_detection_interval_ms));
            }
        }
        self.mains_lost
    }

    /// Last verdict of [`check_mains_sync`](Self::check_mains_sync).
    pub fn mains_lost(&self) -> bool {
        self.mains_lost
    }

    pub fn phase(&self) -> SettlePhase {
        self.phase
    }

    pub fn last_edge_ms(&self) -> Option<u32> {
        self.last_edge_ms
    }

    pub fn tip_check_counter(&self) -> u16 {
        self.tip_check_counter
    }
}
