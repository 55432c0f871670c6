//! One-shot hardware peripheral initialization.
//!
//! Configures the thermocouple ADC channel, GPIO directions and the GPIO
//! ISR service using raw ESP-IDF sys calls.  Called once from `main()`
//! before the event loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    TimerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::TimerFailed(rc)      => write!(f, "esp_timer setup failed (rc={})", rc),
        }
    }
}

impl core::error::Error for HwInitError {}

/// Interrupt handler signature shared by GPIO ISRs and esp_timer callbacks.
pub type IsrHandler = unsafe extern "C" fn(*mut core::ffi::c_void);

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before event loop; single-threaded.
    unsafe {
        init_adc()?;
        init_gpio_inputs()?;
        init_gpio_outputs()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// ADC1 channel wired to the thermocouple amplifier (GPIO 36).
pub const ADC1_CH_THERMOCOUPLE: u32 = 0;

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: written once by `init_adc()` before any reader runs.  Readers
/// are the settle-timer callback only.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: pins::THERMOCOUPLE_ADC_ATTEN,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_THERMOCOUPLE, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=thermocouple)", ADC1_CH_THERMOCOUPLE);
    Ok(())
}

/// Fill `buf` with back-to-back conversions.  Returns how many succeeded;
/// a failed read ends the burst early.
#[cfg(target_os = "espidf")]
pub fn adc1_burst(channel: u32, buf: &mut [u16]) -> usize {
    for (filled, slot) in buf.iter_mut().enumerate() {
        let mut raw: i32 = 0;
        // SAFETY: adc1_handle() contract; only the settle-timer task reads.
        let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
        if ret != ESP_OK as i32 {
            return filled;
        }
        *slot = raw.max(0) as u16;
    }
    buf.len()
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_burst(_channel: u32, buf: &mut [u16]) -> usize {
    buf.fill(0);
    buf.len()
}

// ── GPIO Inputs ───────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_inputs() -> Result<(), HwInitError> {
    let input_pins = [
        pins::HOLDER_GPIO,
        pins::TIP_CHANGE_GPIO,
        pins::TARGET_UP_GPIO,
        pins::TARGET_DOWN_GPIO,
        pins::ZERO_CROSS_GPIO,
    ];

    for &pin in &input_pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode: gpio_mode_t_GPIO_MODE_INPUT,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO inputs configured");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Sim: every input idles high (pull-ups, nothing pressed).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO Outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_outputs() -> Result<(), HwInitError> {
    // (pin, mode, boot level): heater off, bias off, input clamped.
    let outputs = [
        (pins::HEATER_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT, 0),
        (pins::TIP_CHECK_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT, 0),
        (pins::TIP_CLAMP_GPIO, gpio_mode_t_GPIO_MODE_OUTPUT_OD, 0),
    ];

    for &(pin, mode, level) in &outputs {
        // Drive the safe level before the pin becomes an output.
        unsafe { gpio_set_level(pin, level) };
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    }

    info!("hw_init: GPIO outputs configured (heater off, tip clamped)");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) -> i32 {
    // SAFETY: gpio_set_level writes to an already-configured output pin;
    // it is a single register write and safe from ISR context.
    unsafe { gpio_set_level(pin, u32::from(high)) }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) -> i32 {
    0
}

/// Output pin addressed by GPIO number, for drivers written against
/// `embedded_hal::digital::OutputPin`.
#[derive(Debug, Clone, Copy)]
pub struct RawOutputPin {
    gpio: i32,
}

impl RawOutputPin {
    /// The pin must already be configured as an output by `init_peripherals()`.
    pub const fn new(gpio: i32) -> Self {
        Self { gpio }
    }
}

/// Non-zero `esp_err_t` from `gpio_set_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioWriteError(pub i32);

impl embedded_hal::digital::Error for GpioWriteError {
    fn kind(&self) -> embedded_hal::digital::ErrorKind {
        embedded_hal::digital::ErrorKind::Other
    }
}

impl embedded_hal::digital::ErrorType for RawOutputPin {
    type Error = GpioWriteError;
}

impl embedded_hal::digital::OutputPin for RawOutputPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        match gpio_write(self.gpio, false) {
            0 => Ok(()),
            rc => Err(GpioWriteError(rc)),
        }
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        match gpio_write(self.gpio, true) {
            0 => Ok(()),
            rc => Err(GpioWriteError(rc)),
        }
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::events::{push_event, Event};

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tool_input_isr(_arg: *mut core::ffi::c_void) {
    push_event(Event::InputChanged);
}

/// Install the per-pin GPIO ISR service.
///
/// `on_zero_cross` runs on every rising edge of the zero-cross detector.
/// Holder and lever edges push [`Event::InputChanged`](crate::events::Event).
#[cfg(target_os = "espidf")]
pub fn init_isr_service(on_zero_cross: IsrHandler) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed.  Handlers are plain static functions.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK && ret != ESP_ERR_INVALID_STATE {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_set_intr_type(pins::ZERO_CROSS_GPIO, gpio_int_type_t_GPIO_INTR_POSEDGE);
        gpio_isr_handler_add(pins::ZERO_CROSS_GPIO, Some(on_zero_cross), core::ptr::null_mut());
        gpio_intr_enable(pins::ZERO_CROSS_GPIO);

        for pin in [pins::HOLDER_GPIO, pins::TIP_CHANGE_GPIO] {
            gpio_set_intr_type(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE);
            gpio_isr_handler_add(pin, Some(tool_input_isr), core::ptr::null_mut());
            gpio_intr_enable(pin);
        }

        info!("hw_init: ISR service installed (zero-cross, holder, tip-change)");
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_on_zero_cross: IsrHandler) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
