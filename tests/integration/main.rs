//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one slice of the
//! `DeviceService` against mock adapters.  All tests run on the host
//! (x86_64) with no real hardware required.

mod command_tests;
mod link_session_tests;
mod main_loop_tests;
mod mock_hw;
