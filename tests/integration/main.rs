//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem against
//! the mock board.  All tests run on the host with no real hardware.

mod controller_tests;
mod mains_watchdog_tests;
mod mock_hw;
