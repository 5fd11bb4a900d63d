//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one part of the S88
//! subsystem against mock adapters.  All tests run on the host with no
//! real hardware required.

mod manager_tests;
mod mock_hw;
mod registry_tests;
mod scan_tests;
