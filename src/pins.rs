//! GPIO / peripheral pin assignments for the station main board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Mains interface
// ---------------------------------------------------------------------------

/// Digital input: optocoupled zero-cross detector.  Rising edge shortly
/// before each mains zero crossing.
pub const ZERO_CROSS_GPIO: i32 = 4;

/// Digital output: triac gate driver for the heater.  HIGH = conduct on
/// the next half-cycle.
pub const HEATER_GPIO: i32 = 5;

// ---------------------------------------------------------------------------
// Thermocouple front end
// ---------------------------------------------------------------------------

/// Open-drain output: shorts the amplifier input while the heater may be
/// conducting.  LOW = clamped.
pub const TIP_CLAMP_GPIO: i32 = 6;

/// Digital output: pulls the thermocouple input up through a resistor for
/// the tip-presence check.  HIGH = bias on.
pub const TIP_CHECK_GPIO: i32 = 7;

/// Amplified thermocouple voltage.  ADC1 channel 0 (GPIO 36 on ESP32).
pub const THERMOCOUPLE_ADC_GPIO: i32 = 36;
/// ADC attenuation (11 dB → 0 – 3.1 V range).
pub const THERMOCOUPLE_ADC_ATTEN: u32 = 3; // esp_idf_hal::adc::attenuation::DB_11

// ---------------------------------------------------------------------------
// Tool inputs (active-low with external pull-ups)
// ---------------------------------------------------------------------------

/// Holder reed switch.  LOW = tool resting in the holder.
pub const HOLDER_GPIO: i32 = 16;
/// Tip-change lever.  LOW = lever pulled.
pub const TIP_CHANGE_GPIO: i32 = 17;

/// Target up / down push-buttons.
pub const TARGET_UP_GPIO: i32 = 18;
pub const TARGET_DOWN_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// UART debug
// ---------------------------------------------------------------------------

pub const UART_TX_GPIO: i32 = 1;
pub const UART_RX_GPIO: i32 = 3;
