//! Soldering station controller library.
//!
//! Exposes the control core for integration testing and the firmware
//! binary.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod heater;
pub mod safety;
pub mod scheduler;
pub mod sensors;

pub mod events;
pub mod pins;

// Board-facing modules; target code is cfg-gated inside, with host
// simulation fallbacks.
pub mod adapters;
pub mod drivers;
