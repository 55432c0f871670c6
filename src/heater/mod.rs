//! Heater power path: the safety interlock and the duty-cycle regulator.

pub mod interlock;
pub mod regulator;
