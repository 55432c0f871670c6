//! Thermocouple sampler.
//!
//! Consumes one ADC burst per sampling half-cycle.  Every burst is
//! averaged; what the average means depends on the measurement mode:
//!
//! ```text
//!  MeasureTemperature ──(tip check due)──▶ CheckTipAvailable
//!          ▲                                      │ burst: bias on,
//!          │                                      │ average vs. open-circuit level
//!          │                                      ▼
//!          └──────(burst discarded)──── CheckTipAvailableWait
//! ```
//!
//! The wait step throws away the burst taken right after the bias pin is
//! released, while the amplifier is still recovering from saturation.
//!
//! A burst is rejected whole if any one sample strays more than
//! `adc_max_deviation` counts from the average.  This drops mains
//! switching spikes without a filter, at the cost of the whole burst.

use heapless::Vec;

use crate::app::ports::FrontEndPort;
use crate::config::ControllerConfig;
use crate::error::{ReadingError, TipTemperature};

/// Samples per ADC burst.
pub const ADC_BUFFER_LENGTH: usize = 50;

/// Linear thermocouple amplifier mapping: °C = counts × 100 / 750 + 25.
const COUNTS_PER_100_C: u32 = 750;
const COLD_JUNCTION_C: u32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementMode {
    MeasureTemperature,
    CheckTipAvailable,
    CheckTipAvailableWait,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipPresence {
    Detected,
    NotDetected,
    /// The last temperature burst was noisy; presence is re-established by
    /// the next tip check.
    CheckError,
}

/// What one burst produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A tip-presence check completed.
    TipCheck(TipPresence),
    /// A good temperature reading (°C).
    Temperature(u16),
    /// The burst was rejected.
    Rejected(ReadingError),
    /// Post-check recovery burst, ignored.
    Discarded,
    /// Temperature burst without a detected tip, ignored.
    NoTip,
}

pub struct ThermocoupleSampler {
    buffer: Vec<u16, ADC_BUFFER_LENGTH>,
    average: u16,
    mode: MeasurementMode,
    tip_temperature: TipTemperature,
    tip_presence: TipPresence,
    deviation_error: bool,

    max_deviation: u16,
    tip_max_value: u16,
}

impl ThermocoupleSampler {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            buffer: Vec::new(),
            average: 0,
            mode: MeasurementMode::MeasureTemperature,
            tip_temperature: Err(ReadingError::NoReading),
            tip_presence: TipPresence::NotDetected,
            deviation_error: false,
            max_deviation: config.adc_max_deviation,
            tip_max_value: config.adc_tip_max_value,
        }
    }

    /// Arm a tip-presence check for the next burst: bias the input and
    /// switch mode.  Ignored unless measuring temperature.
    pub fn begin_tip_check(&mut self, out: &mut impl FrontEndPort) -> bool {
        if self.mode != MeasurementMode::MeasureTemperature {
            return false;
        }
        out.set_tip_check_bias(true);
        self.mode = MeasurementMode::CheckTipAvailable;
        true
    }

    /// Process a completed burst.  Samples beyond [`ADC_BUFFER_LENGTH`] are
    /// ignored.
    pub fn on_conversion_complete(
        &mut self,
        raw: &[u16],
        out: &mut impl FrontEndPort,
    ) -> SampleOutcome {
        self.buffer.clear();
        let take = raw.len().min(ADC_BUFFER_LENGTH);
        // Cannot fail: `take` never exceeds the capacity.
        let _ = self.buffer.extend_from_slice(&raw[..take]);

        if self.buffer.is_empty() {
            return self.reject_empty(out);
        }
        self.average = Self::mean(&self.buffer);

        match self.mode {
            MeasurementMode::CheckTipAvailable => {
                self.mode = MeasurementMode::CheckTipAvailableWait;
                out.set_tip_check_bias(false);
                self.tip_presence = if self.average < self.tip_max_value {
                    TipPresence::Detected
                } else {
                    TipPresence::NotDetected
                };
                SampleOutcome::TipCheck(self.tip_presence)
            }
            MeasurementMode::CheckTipAvailableWait => {
                self.mode = MeasurementMode::MeasureTemperature;
                SampleOutcome::Discarded
            }
            MeasurementMode::MeasureTemperature => {
                if self.tip_presence != TipPresence::Detected {
                    self.tip_temperature = Err(ReadingError::NoReading);
                    return SampleOutcome::NoTip;
                }
                self.measure()
            }
        }
    }

    fn measure(&mut self) -> SampleOutcome {
        let celsius = counts_to_celsius(self.average);
        let avg = i32::from(self.average);
        let max_dev = i32::from(self.max_deviation);
        self.deviation_error = self
            .buffer
            .iter()
            .any(|&s| (i32::from(s) - avg).abs() > max_dev);

        if self.deviation_error {
            self.tip_temperature = Err(ReadingError::SampleDeviation);
            self.tip_presence = TipPresence::CheckError;
            // Momentary: the next burst starts clean.
            self.deviation_error = false;
            return SampleOutcome::Rejected(ReadingError::SampleDeviation);
        }

        self.tip_temperature = Ok(celsius);
        SampleOutcome::Temperature(celsius)
    }

    fn reject_empty(&mut self, out: &mut impl FrontEndPort) -> SampleOutcome {
        // A tip check that produced nothing must not leave the bias driven.
        if self.mode == MeasurementMode::CheckTipAvailable {
            out.set_tip_check_bias(false);
            self.mode = MeasurementMode::CheckTipAvailableWait;
        }
        self.tip_temperature = Err(ReadingError::EmptyBuffer);
        SampleOutcome::Rejected(ReadingError::EmptyBuffer)
    }

    fn mean(samples: &[u16]) -> u16 {
        let sum: u32 = samples.iter().map(|&s| u32::from(s)).sum();
        (sum / samples.len() as u32) as u16
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn tip_temperature(&self) -> TipTemperature {
        self.tip_temperature
    }

    pub fn tip_presence(&self) -> TipPresence {
        self.tip_presence
    }

    pub fn mode(&self) -> MeasurementMode {
        self.mode
    }

    pub fn buffer_average(&self) -> u16 {
        self.average
    }
}

/// Convert an averaged ADC reading to °C.
pub fn counts_to_celsius(average: u16) -> u16 {
    (u32::from(average) * 100 / COUNTS_PER_100_C + COLD_JUNCTION_C) as u16
}
