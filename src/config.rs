//! Controller configuration parameters
//!
//! All tunable constants of the heater control core.  The defaults are the
//! values the station ships with; nothing is persisted, so a build with a
//! different tip or heater changes them here.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    // --- Temperature limits ---
    /// Target temperature at power-up (°C)
    pub default_target_c: u16,
    /// Lowest selectable target (°C)
    pub min_temp_c: u16,
    /// Highest selectable target; heater never energized at or above (°C)
    pub max_temp_c: u16,
    /// Absolute cutoff; a reading above it latches a safety fault (°C)
    pub abs_max_temp_c: u16,
    /// Target change per encoder detent (°C)
    pub temp_step_c: u16,

    // --- Regulator ---
    /// Upper bound on energized half-cycles between two samples
    pub max_on_half_cycles: u8,
    /// Dead band below target in which no heat is requested (°C)
    pub hysteresis_c: u16,
    /// Temperature error worth one energized half-cycle (°C)
    pub error_per_half_cycle_c: u16,

    // --- Standby ---
    /// Effective target cap while the tool rests in the holder (°C)
    pub standby_temp_c: u16,
    /// Time in standby before dropping to idle (seconds)
    pub standby_time_s: u32,

    // --- Tip handling ---
    /// Delay after a tip is detected before leaving tip change (milliseconds)
    pub tip_change_delay_ms: u32,
    /// Half-cycles between tip-presence checks
    pub tip_check_interval_half_cycles: u16,

    // --- Thermocouple front end ---
    /// Maximum allowed distance of any sample from the buffer average (ADC counts)
    pub adc_max_deviation: u16,
    /// Biased average below this value means a tip is inserted (ADC counts)
    pub adc_tip_max_value: u16,

    // --- Mains timing ---
    /// No zero-cross for this long means mains sync is lost (milliseconds)
    pub ac_detection_interval_ms: u32,
    /// Offset from the detector edge to the true zero-cross (microseconds)
    pub zero_cross_delay_us: u32,
    /// Length of each post-zero-cross settle phase (microseconds)
    pub settle_period_us: u32,

    // --- Timing ---
    /// Control tick interval (milliseconds)
    pub control_tick_interval_ms: u32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Temperature limits
            default_target_c: 350,
            min_temp_c: 30,
            max_temp_c: 450,
            abs_max_temp_c: 470,
            temp_step_c: 5,

            // Regulator
            max_on_half_cycles: 4,
            hysteresis_c: 3,
            error_per_half_cycle_c: 10,

            // Standby
            standby_temp_c: 160,
            standby_time_s: 300, // 5 min

            // Tip handling
            tip_change_delay_ms: 2000,
            tip_check_interval_half_cycles: 50, // ~500 ms at 50 Hz

            // Thermocouple front end
            adc_max_deviation: 200,
            adc_tip_max_value: 3800,

            // Mains timing
            ac_detection_interval_ms: 12, // > one 50 Hz half-cycle
            zero_cross_delay_us: 500,
            settle_period_us: 2000,

            // Timing
            control_tick_interval_ms: 10, // 100 Hz
        }
    }
}

impl ControllerConfig {
    /// Reject parameter sets the control core cannot run safely with.
    pub fn validate(&self) -> Result<()> {
        if self.min_temp_c >= self.max_temp_c {
            return Err(Error::Config("min_temp_c must be below max_temp_c"));
        }
        if self.max_temp_c > self.abs_max_temp_c {
            return Err(Error::Config("max_temp_c exceeds abs_max_temp_c"));
        }
        if !(self.min_temp_c..=self.max_temp_c).contains(&self.default_target_c) {
            return Err(Error::Config("default_target_c outside [min, max]"));
        }
        if self.max_on_half_cycles == 0 {
            return Err(Error::Config("max_on_half_cycles must be non-zero"));
        }
        if self.error_per_half_cycle_c == 0 {
            return Err(Error::Config("error_per_half_cycle_c must be non-zero"));
        }
        if self.tip_check_interval_half_cycles == 0 {
            return Err(Error::Config("tip_check_interval_half_cycles must be non-zero"));
        }
        if self.ac_detection_interval_ms == 0 || self.control_tick_interval_ms == 0 {
            return Err(Error::Config("timing intervals must be non-zero"));
        }
        // Both settle phases have to finish inside one half-cycle.
        let sequence_us = u64::from(self.zero_cross_delay_us) + 2 * u64::from(self.settle_period_us);
        if sequence_us >= u64::from(self.ac_detection_interval_ms) * 1000 {
            return Err(Error::Config("settle sequence longer than a half-cycle"));
        }
        Ok(())
    }
}
