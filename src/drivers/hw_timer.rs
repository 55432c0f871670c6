//! Hardware timers using ESP-IDF's esp_timer API.
//!
//! Two timers:
//! - a one-shot **settle timer**, re-armed by the zero-cross scheduler for
//!   every phase of the half-cycle sequence;
//! - a periodic **control timer** that pushes [`Event::ControlTick`].
//!
//! Callbacks execute in the ESP timer task context (not ISR).

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

use super::hw_init::{HwInitError, IsrHandler};

#[cfg(target_os = "espidf")]
static mut SETTLE_TIMER: esp_timer_handle_t = core::ptr::null_mut();
#[cfg(target_os = "espidf")]
static mut CONTROL_TIMER: esp_timer_handle_t = core::ptr::null_mut();

/// SAFETY: SETTLE_TIMER is written once in `init_settle_timer()` before the
/// zero-cross ISR is installed.
#[cfg(target_os = "espidf")]
unsafe fn settle_timer() -> esp_timer_handle_t { unsafe { SETTLE_TIMER } }

/// SAFETY: Same invariants as `settle_timer()`.
#[cfg(target_os = "espidf")]
unsafe fn control_timer() -> esp_timer_handle_t { unsafe { CONTROL_TIMER } }

#[cfg(target_os = "espidf")]
unsafe extern "C" fn control_tick_cb(_arg: *mut core::ffi::c_void) {
    push_event(Event::ControlTick);
}

// ── Settle timer ──────────────────────────────────────────────

/// Create the one-shot settle timer.  `on_expiry` runs each time it fires.
#[cfg(target_os = "espidf")]
pub fn init_settle_timer(on_expiry: IsrHandler) -> Result<(), HwInitError> {
    // SAFETY: SETTLE_TIMER is written here once at boot from the main task,
    // before anything can start the timer.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(on_expiry),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"settle\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut SETTLE_TIMER);
        if ret != ESP_OK {
            return Err(HwInitError::TimerFailed(ret));
        }
    }
    info!("hw_timer: settle timer created");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_settle_timer(_on_expiry: IsrHandler) -> Result<(), HwInitError> {
    log::info!("hw_timer(sim): settle timer not created");
    Ok(())
}

/// (Re)arm the settle timer to fire once after `delay_us`.
#[cfg(target_os = "espidf")]
pub fn start_settle(delay_us: u32) {
    // SAFETY: settle_timer() contract.  Stopping an idle timer returns
    // ESP_ERR_INVALID_STATE, which is fine here.
    unsafe {
        let t = settle_timer();
        if t.is_null() { return; }
        esp_timer_stop(t);
        esp_timer_start_once(t, u64::from(delay_us));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn start_settle(_delay_us: u32) {}

#[cfg(target_os = "espidf")]
pub fn stop_settle() {
    // SAFETY: settle_timer() contract.
    unsafe {
        let t = settle_timer();
        if !t.is_null() { esp_timer_stop(t); }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_settle() {}

// ── Control timer ─────────────────────────────────────────────

/// Start the periodic control tick.
#[cfg(target_os = "espidf")]
pub fn start_control_timer(period_ms: u32) -> Result<(), HwInitError> {
    // SAFETY: CONTROL_TIMER is written here once at boot from the single
    // main-task context.  The callback only calls push_event().
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(control_tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: b"control\0".as_ptr() as *const _,
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut CONTROL_TIMER);
        if ret != ESP_OK {
            return Err(HwInitError::TimerFailed(ret));
        }
        let ret = esp_timer_start_periodic(control_timer(), u64::from(period_ms) * 1_000);
        if ret != ESP_OK {
            return Err(HwInitError::TimerFailed(ret));
        }
    }
    info!("hw_timer: control tick every {} ms", period_ms);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_control_timer(_period_ms: u32) -> Result<(), HwInitError> {
    log::info!("hw_timer(sim): control timer not started");
    Ok(())
}

/// Stop both timers.
#[cfg(target_os = "espidf")]
pub fn stop_timers() {
    // SAFETY: handles are valid if created; null-check covers the rest.
    unsafe {
        let st = settle_timer();
        if !st.is_null() { esp_timer_stop(st); }
        let ct = control_timer();
        if !ct.is_null() { esp_timer_stop(ct); }
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn stop_timers() {}
