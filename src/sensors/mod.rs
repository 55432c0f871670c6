//! Sensor front ends.

pub mod thermocouple;
