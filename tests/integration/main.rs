//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one service against
//! the mock link and application.  All tests run on the host (x86_64)
//! with no real transport required.

mod notification_tests;
mod param_service_tests;
mod provisioning_time_tests;
mod stream_service_tests;
