//! Mock board, tool inputs, display and event sink for integration tests.
//!
//! Records every port call so tests can assert on the full command
//! history without touching real GPIO, timers or the ADC.  [`Rig`] wires
//! them to a [`Controller`] and simulates mains half-cycles.

use solderctl::app::events::{AppEvent, DisplayMessage, StatusSnapshot};
use solderctl::app::ports::{
    AdcPort, DisplayPort, EventSink, FrontEndPort, HidPort, SettleTimerPort,
};
use solderctl::app::service::Controller;
use solderctl::config::ControllerConfig;
use solderctl::fsm::OperatingMode;
use solderctl::sensors::thermocouple::ADC_BUFFER_LENGTH;

/// One mains half-cycle at 50 Hz; also the control tick period.
pub const HALF_CYCLE_MS: u32 = 10;

// ── Board call record ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCall {
    Heater(bool),
    Bias(bool),
    Clamp(bool),
    StartTimer(u32),
    StopTimer,
    StartConversion,
}

// ── MockBoard ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockBoard {
    pub calls: Vec<BoardCall>,
    pub heater: bool,
    pub bias: bool,
    pub clamped: bool,
    pub timer_armed: bool,
    pub conversion_requested: bool,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn heater_pulses(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == BoardCall::Heater(true))
            .count()
    }

    pub fn last_heater_write(&self) -> Option<bool> {
        self.calls.iter().rev().find_map(|c| match c {
            BoardCall::Heater(on) => Some(*on),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl FrontEndPort for MockBoard {
    fn set_heater_output(&mut self, on: bool) {
        self.heater = on;
        self.calls.push(BoardCall::Heater(on));
    }

    fn set_tip_check_bias(&mut self, on: bool) {
        self.bias = on;
        self.calls.push(BoardCall::Bias(on));
    }

    fn set_tip_clamp(&mut self, clamped: bool) {
        self.clamped = clamped;
        self.calls.push(BoardCall::Clamp(clamped));
    }
}

impl SettleTimerPort for MockBoard {
    fn start_settle_timer(&mut self, delay_us: u32) {
        self.timer_armed = true;
        self.calls.push(BoardCall::StartTimer(delay_us));
    }

    fn stop_settle_timer(&mut self) {
        self.timer_armed = false;
        self.calls.push(BoardCall::StopTimer);
    }
}

impl AdcPort for MockBoard {
    fn start_conversion(&mut self) {
        self.conversion_requested = true;
        self.calls.push(BoardCall::StartConversion);
    }
}

// ── MockHid ───────────────────────────────────────────────────

pub struct MockHid {
    pub in_holder: bool,
    pub lever: bool,
    pub pending_delta: i16,
}

impl Default for MockHid {
    fn default() -> Self {
        Self {
            in_holder: true,
            lever: false,
            pending_delta: 0,
        }
    }
}

impl HidPort for MockHid {
    fn tool_in_holder(&self) -> bool {
        self.in_holder
    }

    fn tip_change_asserted(&self) -> bool {
        self.lever
    }

    fn take_target_delta(&mut self) -> i16 {
        core::mem::take(&mut self.pending_delta)
    }
}

// ── MockDisplay / RecordingSink ───────────────────────────────

#[derive(Default)]
pub struct MockDisplay {
    pub messages: Vec<DisplayMessage>,
    pub frames: Vec<StatusSnapshot>,
}

impl DisplayPort for MockDisplay {
    fn show_status(&mut self, status: &StatusSnapshot) {
        self.frames.push(*status);
    }

    fn show_message(&mut self, message: DisplayMessage) {
        self.messages.push(message);
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ADC helpers ───────────────────────────────────────────────

/// Smallest ADC average that reads back as `celsius`.
pub fn counts_for(celsius: u16) -> u16 {
    ((u32::from(celsius) - 25) * 750).div_ceil(100) as u16
}

/// Open thermocouple: saturates the tip-check burst.
pub const NO_TIP_COUNTS: u16 = 4095;

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig {
    pub controller: Controller,
    pub board: MockBoard,
    pub hid: MockHid,
    pub display: MockDisplay,
    pub sink: RecordingSink,
    pub now_ms: u32,
    /// Delivered for every conversion the controller requests.
    pub burst: Vec<u16>,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self::with_config(ControllerConfig::default())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let mut rig = Self {
            controller: Controller::new(config).expect("valid config"),
            board: MockBoard::default(),
            hid: MockHid::default(),
            display: MockDisplay::default(),
            sink: RecordingSink::default(),
            now_ms: 0,
            burst: vec![counts_for(200); ADC_BUFFER_LENGTH],
        };
        rig.controller
            .start(&mut rig.board, &mut rig.display, &mut rig.sink);
        rig
    }

    /// Every following burst reads as `celsius`.
    pub fn set_tip_celsius(&mut self, celsius: u16) {
        self.burst = vec![counts_for(celsius); ADC_BUFFER_LENGTH];
    }

    pub fn set_burst(&mut self, burst: &[u16]) {
        self.burst = burst.to_vec();
    }

    /// Zero-cross edge, every settle-timer expiry it arms, then one tick.
    pub fn half_cycle(&mut self) {
        self.controller.on_zero_cross(self.now_ms, &mut self.board);
        self.fire_settle_timers();
        self.tick();
    }

    pub fn run(&mut self, half_cycles: usize) {
        for _ in 0..half_cycles {
            self.half_cycle();
        }
    }

    /// Advance one tick period with no zero-cross edge.
    pub fn tick(&mut self) {
        self.now_ms = self.now_ms.wrapping_add(HALF_CYCLE_MS);
        self.controller.tick(
            self.now_ms,
            &mut self.hid,
            &mut self.board,
            &mut self.display,
            &mut self.sink,
        );
    }

    pub fn fire_settle_timers(&mut self) {
        // Four phases at most per edge.
        for _ in 0..4 {
            if !self.board.timer_armed {
                break;
            }
            self.board.timer_armed = false;
            self.controller.on_settle_timer(&mut self.board);
            if core::mem::take(&mut self.board.conversion_requested) {
                let burst = self.burst.clone();
                self.controller
                    .on_conversion_complete(&burst, &mut self.board);
            }
        }
    }

    /// Run half-cycles until `mode` is reached.  Panics after `limit`.
    pub fn run_until(&mut self, mode: OperatingMode, limit: usize) {
        for _ in 0..limit {
            if self.controller.mode() == mode {
                return;
            }
            self.half_cycle();
        }
        assert_eq!(self.controller.mode(), mode, "mode not reached in {limit} half-cycles");
    }

    /// Boot with a tip at the current burst temperature until `Idle`.
    pub fn boot_to_idle(&mut self) {
        self.run_until(OperatingMode::Idle, 400);
    }

    /// Boot, lift the tool and wait for the first good sample in `Heating`.
    pub fn boot_to_heating(&mut self) {
        self.boot_to_idle();
        self.hid.in_holder = false;
        self.run_until(OperatingMode::Heating, 2);
    }
}
