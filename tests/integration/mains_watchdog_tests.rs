//! Mains-sync watchdog and shared-controller tests.

use solderctl::app::events::{AppEvent, DisplayMessage};
use solderctl::app::service::{Controller, SharedController, TickInputs};
use solderctl::config::ControllerConfig;
use solderctl::error::SafetyFault;
use solderctl::fsm::OperatingMode;
use solderctl::heater::interlock::InterlockState;
use solderctl::scheduler::{PhaseAction, SettlePhase};

use crate::mock_hw::{
    BoardCall, HALF_CYCLE_MS, MockBoard, MockDisplay, MockHid, RecordingSink, Rig,
};

#[test]
fn no_mains_at_boot_is_a_fault() {
    let mut rig = Rig::new();
    rig.tick();

    assert_eq!(rig.controller.mode(), OperatingMode::Fault);
    assert_eq!(rig.controller.fault_flags(), SafetyFault::MainsSyncLost.mask());
    assert!(rig.sink.contains(&AppEvent::FaultDetected(
        SafetyFault::MainsSyncLost.mask()
    )));
    assert_eq!(rig.display.messages.last(), Some(&DisplayMessage::AcNotDetected));
    assert_eq!(rig.board.last_heater_write(), Some(false));
}

#[test]
fn first_edge_recovers_from_boot_fault() {
    let mut rig = Rig::new();
    rig.tick();
    assert_eq!(rig.controller.mode(), OperatingMode::Fault);

    rig.half_cycle();
    assert!(rig.sink.contains(&AppEvent::FaultCleared));
    assert_eq!(rig.controller.mode(), OperatingMode::Initializing);
}

#[test]
fn losing_mains_while_heating_halts_everything() {
    let mut rig = Rig::new();
    rig.boot_to_heating();
    rig.run(2);
    assert!(rig.controller.pending_on_half_cycles() > 0);

    // Edges stop: the next tick is past the detection interval.
    rig.tick();
    assert_eq!(rig.controller.mode(), OperatingMode::Fault);
    assert_eq!(rig.controller.pending_on_half_cycles(), 0);
    assert_ne!(rig.controller.interlock_state(), InterlockState::Ok);
    assert_eq!(rig.controller.settle_phase(), SettlePhase::Idle);
    assert_eq!(rig.board.last_heater_write(), Some(false));
    assert!(rig.board.clamped);

    // Stays faulted without edges; no repeated fault events.
    rig.tick();
    rig.tick();
    assert_eq!(rig.controller.mode(), OperatingMode::Fault);
    let detected = rig
        .sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::FaultDetected(_)))
        .count();
    assert_eq!(detected, 1);

    // Mains back: recover through Initializing to Heating.
    rig.run_until(OperatingMode::Heating, 10);
    assert!(rig.sink.contains(&AppEvent::ModeChanged {
        from: OperatingMode::Fault,
        to: OperatingMode::Initializing,
    }));
}

#[test]
fn detection_interval_boundary() {
    let mut rig = Rig::new();
    rig.half_cycle();
    let edge_at = rig.now_ms;
    rig.controller.on_zero_cross(edge_at, &mut rig.board);
    rig.fire_settle_timers();

    // 12 ms after the edge is still in sync; the tick after is not.
    let mut hid = MockHid::default();
    let mut display = MockDisplay::default();
    let mut sink = RecordingSink::default();
    rig.controller
        .tick(edge_at + 12, &mut hid, &mut rig.board, &mut display, &mut sink);
    assert_eq!(rig.controller.fault_flags(), 0);
    rig.controller
        .tick(edge_at + 13, &mut hid, &mut rig.board, &mut display, &mut sink);
    assert_eq!(rig.controller.fault_flags(), SafetyFault::MainsSyncLost.mask());
}

#[test]
fn edge_mid_sequence_abandons_the_sample() {
    let mut rig = Rig::new();
    rig.controller.on_zero_cross(0, &mut rig.board);

    // True zero-cross, then clamp release.
    assert_eq!(
        rig.controller.on_settle_timer(&mut rig.board),
        PhaseAction::SamplingStarted
    );
    assert!(matches!(
        rig.controller.on_settle_timer(&mut rig.board),
        PhaseAction::ClampReleased { .. }
    ));
    assert!(!rig.board.clamped);

    rig.board.clear();
    rig.controller.on_zero_cross(HALF_CYCLE_MS, &mut rig.board);
    assert!(rig.board.clamped);
    assert_eq!(rig.board.calls.first(), Some(&BoardCall::Clamp(true)));
    assert_eq!(
        rig.controller.settle_phase(),
        SettlePhase::AwaitingTrueZeroCross
    );
}

#[test]
fn shared_controller_drives_a_half_cycle() {
    let shared: SharedController<MockBoard> = SharedController::new();
    let mut display = MockDisplay::default();
    let mut sink = RecordingSink::default();
    let mut hid = MockHid::default();

    let mut controller = Controller::new(ControllerConfig::default()).expect("valid config");
    let mut board = MockBoard::default();
    controller.start(&mut board, &mut display, &mut sink);
    shared.install(controller, board);

    shared.with(|c, b| c.on_zero_cross(0, b)).expect("installed");
    let action = shared.with(|c, b| c.on_settle_timer(b));
    assert_eq!(action, Some(PhaseAction::SamplingStarted));

    let inputs = TickInputs::read(&mut hid);
    let out = shared
        .with(|c, b| c.step(HALF_CYCLE_MS, inputs, b))
        .expect("installed");
    out.deliver(&mut display, &mut sink);
    assert!(sink.events.contains(&AppEvent::ModeChanged {
        from: OperatingMode::Initializing,
        to: OperatingMode::AwaitingTipChange,
    }));
    assert_eq!(
        shared.with(|c, _| c.mode()),
        Some(OperatingMode::AwaitingTipChange)
    );
    assert_eq!(
        shared.with(|_, b| b.timer_armed),
        Some(true),
        "clamp-release phase still pending"
    );
}
