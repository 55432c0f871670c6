//! Soldering station firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter    GpioHid     LogDisplay   LogEventSink      │
//! │  (FrontEnd+Timer    (HidPort)   (Display)    (EventSink)       │
//! │   +Adc)                                                        │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │        Controller (inside SharedController)            │    │
//! │  │  Scheduler · Regulator · Sampler · Interlock · FSM     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//!
//!  zero-cross GPIO ISR ──▶ STATION.on_zero_cross
//!  settle esp_timer    ──▶ STATION.on_settle_timer ──▶ ADC burst
//!                                                  ──▶ STATION.on_conversion_complete
//!  control esp_timer   ──▶ Event::ControlTick ──▶ main loop ──▶ STATION.step
//!                                                             ──▶ display / log sink
//! ```
#![deny(unused_must_use)]

use core::ffi::c_void;

use anyhow::{Result, anyhow};
use esp_idf_hal::delay::FreeRtos;
use log::info;

use solderctl::adapters::hardware::HardwareAdapter;
use solderctl::adapters::hid::GpioHid;
use solderctl::adapters::log_display::LogDisplay;
use solderctl::adapters::log_sink::LogEventSink;
use solderctl::adapters::time::Esp32TimeAdapter;
use solderctl::app::ports::TickSource;
use solderctl::app::service::{Controller, SharedController, TickInputs};
use solderctl::config::ControllerConfig;
use solderctl::drivers::front_end::FrontEnd;
use solderctl::drivers::hw_init::{self, ADC1_CH_THERMOCOUPLE, RawOutputPin};
use solderctl::drivers::hw_timer;
use solderctl::drivers::watchdog::Watchdog;
use solderctl::events::{self, Event};
use solderctl::pins;
use solderctl::sensors::thermocouple::ADC_BUFFER_LENGTH;

type Board = HardwareAdapter<FrontEnd<RawOutputPin, RawOutputPin, RawOutputPin>>;

/// The controller and its board, shared by the interrupt handlers below
/// and the main loop.
static STATION: SharedController<Board> = SharedController::new();

// ── Interrupt handlers ────────────────────────────────────────

unsafe extern "C" fn zero_cross_isr(_arg: *mut c_void) {
    let now_ms = Esp32TimeAdapter::new().now_ms();
    STATION.with(|controller, board| controller.on_zero_cross(now_ms, board));
}

/// Settle-timer expiry.  When the scheduler asks for a conversion, the
/// burst is read after the lock is dropped and delivered in a second pass.
unsafe extern "C" fn settle_timer_cb(_arg: *mut c_void) {
    let wants_burst = STATION
        .with(|controller, board| {
            controller.on_settle_timer(board);
            board.take_conversion_request()
        })
        .unwrap_or(false);
    if !wants_burst {
        return;
    }

    let mut samples = [0u16; ADC_BUFFER_LENGTH];
    let n = hw_init::adc1_burst(ADC1_CH_THERMOCOUPLE, &mut samples);
    STATION.with(|controller, board| controller.on_conversion_complete(&samples[..n], board));
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SolderCtl v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Peripherals (heater off, input clamped) ────────────
    hw_init::init_peripherals()?;

    let config = ControllerConfig::default();
    let front_end = FrontEnd::new(
        RawOutputPin::new(pins::HEATER_GPIO),
        RawOutputPin::new(pins::TIP_CLAMP_GPIO),
        RawOutputPin::new(pins::TIP_CHECK_GPIO),
    );
    let mut board = HardwareAdapter::new(front_end);

    // ── 3. Controller ─────────────────────────────────────────
    let mut display = LogDisplay::new();
    let mut sink = LogEventSink::new();
    let mut hid = GpioHid::new(config.temp_step_c);

    let mut controller =
        Controller::new(config.clone()).map_err(|e| anyhow!("controller config rejected: {e}"))?;
    controller.start(&mut board, &mut display, &mut sink);
    STATION.install(controller, board);

    // ── 4. Interrupt sources ──────────────────────────────────
    // The settle timer must exist before the first zero-cross can arm it.
    hw_timer::init_settle_timer(settle_timer_cb)?;
    hw_init::init_isr_service(zero_cross_isr)?;
    hw_timer::start_control_timer(config.control_tick_interval_ms)?;

    let mut watchdog = Watchdog::default();
    let time = Esp32TimeAdapter::new();

    info!("System ready. Entering event loop.");

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        let mut ticked = false;

        events::drain_events(|event| match event {
            Event::ControlTick | Event::InputChanged => {
                let now_ms = time.now_ms();
                let inputs = TickInputs::read(&mut hid);
                // Logging and drawing happen only once the lock is released.
                let output =
                    STATION.with(|controller, board| controller.step(now_ms, inputs, board));
                if let Some(output) = output {
                    output.deliver(&mut display, &mut sink);
                }
                ticked |= event == Event::ControlTick;
            }
        });

        // Fed only by the periodic tick: a dead control timer trips the TWDT.
        if ticked {
            watchdog.feed(time.now_ms());
        }

        FreeRtos::delay_ms(1);
    }
}
