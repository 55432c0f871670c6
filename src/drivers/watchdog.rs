//! Task watchdog (TWDT) for the control loop.
//!
//! The main loop feeds it after every periodic control tick.  If the tick
//! loop hangs the chip resets, and reset leaves the heater gate low.
//!
//! Feeding also measures the gap since the previous feed: a gap longer
//! than half the timeout is logged, so a loop that is slow but not yet
//! dead shows up in the console before it trips the reset.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::{
    ESP_OK, esp_task_wdt_add, esp_task_wdt_config_t, esp_task_wdt_reconfigure,
    esp_task_wdt_reset,
};
use log::{info, warn};

use crate::app::ports::is_after;

/// TWDT timeout.  Two hundred control ticks at the default rate.
pub const DEFAULT_TIMEOUT_MS: u32 = 2_000;

pub struct Watchdog {
    timeout_ms: u32,
    /// Time of the last feed; `None` until the first one.
    last_feed_ms: Option<u32>,
    /// Longest gap seen between two feeds.
    worst_gap_ms: u32,
    #[cfg(target_os = "espidf")]
    subscribed: bool,
}

impl Default for Watchdog {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MS)
    }
}

impl Watchdog {
    /// Configure the TWDT with `timeout_ms` and subscribe the calling task.
    /// On the host nothing is armed.
    pub fn new(timeout_ms: u32) -> Self {
        #[cfg(target_os = "espidf")]
        let subscribed = {
            let cfg = esp_task_wdt_config_t {
                timeout_ms,
                idle_core_mask: 0,
                trigger_panic: true,
            };
            // SAFETY: called once from the main task during boot.
            let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
            if ret != ESP_OK {
                warn!("watchdog: reconfigure returned {} (already running?)", ret);
            }
            // SAFETY: a null handle subscribes the calling task.
            let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
            if ret != ESP_OK {
                warn!("watchdog: subscribe failed ({}); running unguarded", ret);
            }
            ret == ESP_OK
        };

        info!("watchdog: {} ms timeout", timeout_ms);
        Self {
            timeout_ms,
            last_feed_ms: None,
            worst_gap_ms: 0,
            #[cfg(target_os = "espidf")]
            subscribed,
        }
    }

    /// Reset the TWDT and record the feed time.
    pub fn feed(&mut self, now_ms: u32) {
        #[cfg(target_os = "espidf")]
        if self.subscribed {
            // SAFETY: resets the TWDT entry of the calling task.
            unsafe {
                esp_task_wdt_reset();
            }
        }

        if let Some(last) = self.last_feed_ms {
            let gap = now_ms.wrapping_sub(last);
            if gap > self.worst_gap_ms {
                self.worst_gap_ms = gap;
            }
            if is_after(now_ms, last.wrapping_add(self.timeout_ms / 2)) {
                warn!("watchdog: {} ms since last feed (timeout {} ms)", gap, self.timeout_ms);
            }
        }
        self.last_feed_ms = Some(now_ms);
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn worst_gap_ms(&self) -> u32 {
        self.worst_gap_ms
    }
}
