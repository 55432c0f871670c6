//! Output drivers, hardware initialisation, timers and the task watchdog.

pub mod front_end;
pub mod hw_init;
pub mod hw_timer;
pub mod watchdog;
