//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters. All tests run on the host (x86_64) with no
//! real hardware required.

mod auto_connect_tests;
mod connect_tests;
mod mocks;
mod shell_flow_tests;
mod upload_flow_tests;
