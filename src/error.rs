//! Unified error types for the soldering controller.
//!
//! Every fallible path in the control core converts into [`Error`].  All
//! variants are `Copy` so they can be passed out of interrupt handlers
//! and through the FSM without allocation.
//!
//! Tip readings use the tagged [`TipTemperature`] result instead of a
//! magic "reading error" number, so a legitimate reading can never be
//! mistaken for a failure.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The thermocouple front end produced no usable reading.
    Reading(ReadingError),
    /// A safety condition forced the heater off.
    Safety(SafetyFault),
    /// Configuration values are inconsistent.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reading(e) => write!(f, "reading: {e}"),
            Self::Safety(e) => write!(f, "safety: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reading errors
// ---------------------------------------------------------------------------

/// Why the tip temperature is currently unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadingError {
    /// No successful temperature conversion yet (boot, no tip, or after a
    /// tip check).
    NoReading,
    /// At least one sample in the last buffer strayed too far from the
    /// buffer average; the whole buffer was discarded.
    SampleDeviation,
    /// The conversion delivered zero samples.
    EmptyBuffer,
}

impl fmt::Display for ReadingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoReading => write!(f, "no reading"),
            Self::SampleDeviation => write!(f, "sample deviation"),
            Self::EmptyBuffer => write!(f, "empty sample buffer"),
        }
    }
}

impl From<ReadingError> for Error {
    fn from(e: ReadingError) -> Self {
        Self::Reading(e)
    }
}

/// Tip temperature in °C, or the reason there is none.
pub type TipTemperature = core::result::Result<u16, ReadingError>;

// ---------------------------------------------------------------------------
// Safety faults
// ---------------------------------------------------------------------------

/// Faults that force the controller into `Fault` and hard-disable the
/// heater.  Accumulated in a bitfield by the safety supervisor so that
/// several can be active at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SafetyFault {
    /// No zero-cross edge within the AC detection interval.
    MainsSyncLost = 0b0000_0001,
    /// A valid tip reading exceeded the absolute maximum temperature.
    OverTemperature = 0b0000_0010,
}

impl SafetyFault {
    /// Return the bitmask for this fault.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for SafetyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainsSyncLost => write!(f, "mains sync lost"),
            Self::OverTemperature => write!(f, "over temperature"),
        }
    }
}

impl From<SafetyFault> for Error {
    fn from(e: SafetyFault) -> Self {
        Self::Safety(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
