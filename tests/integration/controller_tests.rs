//! End-to-end controller tests: full mains half-cycles through the mock board.

use solderctl::app::commands::AppCommand;
use solderctl::app::events::{AppEvent, DisplayMessage};
use solderctl::config::ControllerConfig;
use solderctl::error::{ReadingError, SafetyFault};
use solderctl::fsm::OperatingMode;
use solderctl::heater::interlock::InterlockState;
use solderctl::sensors::thermocouple::{ADC_BUFFER_LENGTH, TipPresence};

use crate::mock_hw::{BoardCall, NO_TIP_COUNTS, Rig};

// ── Boot and tip detection ────────────────────────────────────

#[test]
fn boot_waits_for_tip_then_idles() {
    let mut rig = Rig::new();
    assert_eq!(rig.controller.mode(), OperatingMode::Initializing);
    assert_eq!(
        rig.sink.events.first(),
        Some(&AppEvent::Started(OperatingMode::Initializing))
    );

    rig.run(10);
    assert_eq!(rig.controller.mode(), OperatingMode::AwaitingTipChange);
    assert_eq!(rig.controller.tip_presence(), TipPresence::NotDetected);

    rig.boot_to_idle();
    assert_eq!(rig.controller.tip_presence(), TipPresence::Detected);
    assert_eq!(rig.controller.tip_temperature(), Ok(200));
    assert_eq!(
        rig.display.messages,
        vec![
            DisplayMessage::TipNotDetected,
            DisplayMessage::TipDetected,
            DisplayMessage::Off
        ]
    );
    assert!(rig.sink.contains(&AppEvent::TipPresenceChanged(TipPresence::Detected)));
    assert_eq!(rig.board.heater_pulses(), 0, "no heat before Heating");
}

#[test]
fn tip_insert_delay_is_honoured() {
    let mut rig = Rig::new();
    // Detection lands around half-cycle 51; the 2 s delay runs from the
    // last tick without a tip.
    rig.run(100);
    assert_eq!(rig.controller.tip_presence(), TipPresence::Detected);
    assert_eq!(rig.controller.mode(), OperatingMode::AwaitingTipChange);

    rig.run(100);
    assert_eq!(rig.controller.mode(), OperatingMode::AwaitingTipChange);

    rig.run(60);
    assert_eq!(rig.controller.mode(), OperatingMode::Idle);
}

#[test]
fn missing_tip_keeps_heater_off() {
    let mut rig = Rig::new();
    rig.set_burst(&[NO_TIP_COUNTS; ADC_BUFFER_LENGTH]);
    rig.hid.in_holder = false;

    rig.run(400);
    assert_eq!(rig.controller.mode(), OperatingMode::AwaitingTipChange);
    assert_eq!(rig.controller.tip_presence(), TipPresence::NotDetected);
    assert_eq!(rig.controller.tip_temperature(), Err(ReadingError::NoReading));
    assert_eq!(rig.board.heater_pulses(), 0);
}

// ── Heating ───────────────────────────────────────────────────

#[test]
fn lifting_the_tool_heats_at_full_power_when_cold() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    rig.board.clear();

    rig.run(10);
    assert!(rig.board.heater_pulses() >= 4);
    assert_eq!(rig.controller.status().power_half_cycles, 4);
    assert_ne!(rig.controller.energize_history(), 0);
    assert!(rig.display.messages.contains(&DisplayMessage::On));
}

#[test]
fn heater_pulses_follow_the_sample_sequence() {
    let mut rig = Rig::new();
    rig.boot_to_heating();

    // One sampling half-cycle plans 4, then four energized half-cycles.
    rig.half_cycle();
    assert_eq!(rig.controller.pending_on_half_cycles(), 4);
    rig.board.clear();
    rig.run(4);
    assert_eq!(rig.board.heater_pulses(), 4);
    assert!(!rig.board.calls.contains(&BoardCall::StartConversion));
    assert_eq!(rig.controller.pending_on_half_cycles(), 0);

    rig.board.clear();
    rig.half_cycle();
    assert_eq!(rig.board.heater_pulses(), 0);
    assert!(rig.board.calls.contains(&BoardCall::StartConversion));
}

#[test]
fn near_target_gets_a_single_half_cycle() {
    let mut rig = Rig::new();
    rig.set_tip_celsius(345);
    rig.boot_to_heating();
    rig.half_cycle();
    assert_eq!(rig.controller.pending_on_half_cycles(), 1);

    rig.set_tip_celsius(350);
    rig.run(3);
    assert_eq!(rig.controller.pending_on_half_cycles(), 0);
}

#[test]
fn clamp_is_released_only_while_sampling() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    rig.run(6);
    assert!(rig.board.clamped, "input stays clamped between samples");

    // Heater never switches on while the clamp is released.
    let mut released = false;
    for call in &rig.board.calls {
        match call {
            BoardCall::Clamp(c) => released = !c,
            BoardCall::Heater(true) => assert!(!released),
            _ => {}
        }
    }
}

#[test]
fn noisy_burst_blocks_heat_and_forces_tip_change() {
    let mut rig = Rig::new();
    rig.boot_to_heating();

    let mut noisy = [1000u16; ADC_BUFFER_LENGTH];
    for s in noisy.iter_mut().step_by(2) {
        *s = 1626;
    }
    rig.set_burst(&noisy);
    rig.run_until(OperatingMode::AwaitingTipChange, 10);

    assert_eq!(
        rig.controller.tip_temperature(),
        Err(ReadingError::SampleDeviation)
    );
    assert_eq!(rig.controller.tip_presence(), TipPresence::CheckError);
    assert_ne!(rig.controller.interlock_state(), InterlockState::Ok);
    assert!(rig.sink.contains(&AppEvent::SamplesRejected(1)));

    rig.board.clear();
    rig.run(5);
    assert_eq!(rig.board.heater_pulses(), 0);
    assert!(rig.display.messages.contains(&DisplayMessage::TipCheckError));

    // A clean tip check and the insert delay bring heat back.
    rig.set_tip_celsius(200);
    rig.run_until(OperatingMode::Heating, 400);
}

// ── Standby ───────────────────────────────────────────────────

#[test]
fn holder_caps_at_standby_and_times_out_to_idle() {
    let config = ControllerConfig {
        standby_time_s: 1,
        ..ControllerConfig::default()
    };
    let mut rig = Rig::with_config(config);
    rig.boot_to_heating();

    rig.hid.in_holder = true;
    rig.half_cycle();
    assert_eq!(rig.controller.mode(), OperatingMode::Standby);

    // The plan made while heating runs out, then 200 °C is above the
    // 160 °C standby cap.
    rig.run(5);
    rig.board.clear();
    rig.run(20);
    assert_eq!(rig.board.heater_pulses(), 0);

    rig.run_until(OperatingMode::Idle, 120);
    assert!(rig.controller.status().tip_temperature.is_ok());
}

#[test]
fn standby_still_heats_below_the_cap() {
    let mut rig = Rig::new();
    rig.set_tip_celsius(100);
    rig.boot_to_heating();
    rig.hid.in_holder = true;
    rig.run_until(OperatingMode::Standby, 2);

    rig.board.clear();
    rig.run(10);
    assert!(rig.board.heater_pulses() > 0);
}

#[test]
fn lifting_from_standby_resumes_heating() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    rig.hid.in_holder = true;
    rig.run_until(OperatingMode::Standby, 2);
    rig.hid.in_holder = false;
    rig.run_until(OperatingMode::Heating, 2);
}

// ── Tip change lever ──────────────────────────────────────────

#[test]
fn lever_stops_heat_and_shows_wait() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    rig.run(3);

    rig.hid.lever = true;
    rig.run_until(OperatingMode::AwaitingTipChange, 2);
    assert_eq!(rig.board.last_heater_write(), Some(false));
    assert_eq!(rig.controller.pending_on_half_cycles(), 0);

    rig.board.clear();
    rig.run(5);
    assert_eq!(rig.board.heater_pulses(), 0);
    assert_eq!(rig.display.messages.last(), Some(&DisplayMessage::Wait));

    rig.hid.lever = false;
    rig.run_until(OperatingMode::Heating, 3);
}

// ── Target temperature ────────────────────────────────────────

#[test]
fn hid_delta_and_commands_change_the_target() {
    let mut rig = Rig::new();
    rig.hid.pending_delta = 15;
    rig.half_cycle();
    assert_eq!(rig.controller.target_temperature(), 365);
    assert!(rig.sink.contains(&AppEvent::TargetChanged(365)));

    rig.controller
        .handle_command(AppCommand::StepTarget(-1), &mut rig.sink);
    assert_eq!(rig.controller.target_temperature(), 360);

    rig.controller
        .handle_command(AppCommand::SetTarget(10), &mut rig.sink);
    assert_eq!(rig.controller.target_temperature(), 30);
    assert_eq!(rig.controller.status().target_c, 30);
}

// ── Absolute maximum ──────────────────────────────────────────

#[test]
fn over_temperature_latches_until_reinitialised() {
    let mut rig = Rig::new();
    rig.boot_to_heating();

    rig.set_tip_celsius(480);
    rig.run_until(OperatingMode::Fault, 10);
    assert_eq!(
        rig.controller.fault_flags(),
        SafetyFault::OverTemperature.mask()
    );
    assert_eq!(rig.controller.interlock_state(), InterlockState::Forbidden);
    assert!(rig.sink.contains(&AppEvent::FaultDetected(
        SafetyFault::OverTemperature.mask()
    )));
    assert_eq!(rig.display.messages.last(), Some(&DisplayMessage::Overheating));

    // A good sample alone does not release the latch.
    rig.set_tip_celsius(200);
    rig.board.clear();
    rig.controller.on_zero_cross(rig.now_ms, &mut rig.board);
    rig.fire_settle_timers();
    assert_eq!(rig.controller.interlock_state(), InterlockState::Forbidden);
    assert_eq!(rig.board.heater_pulses(), 0);

    rig.tick();
    assert!(rig.sink.contains(&AppEvent::FaultCleared));
    assert_eq!(rig.controller.mode(), OperatingMode::Initializing);
    assert_eq!(rig.controller.interlock_state(), InterlockState::NotOk);

    rig.run_until(OperatingMode::Heating, 10);
    rig.run(2);
    assert_eq!(rig.controller.interlock_state(), InterlockState::Ok);
}

#[test]
fn status_frames_track_the_mode() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    let last = rig.display.frames.last().copied().expect("frames pushed");
    assert_eq!(last.mode, OperatingMode::Heating);
    assert_eq!(last.tip_presence, TipPresence::Detected);
    assert_eq!(last.tip_temperature, Ok(200));
}
