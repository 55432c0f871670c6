//! Application core: pure domain logic, zero I/O.
//!
//! Mode orchestration, safety evaluation and the interrupt-facing entry
//! points of the heater control loop.  All interaction with hardware
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
