//! Integration test driver for `tests/integration/` submodules.
//!
//! Every test runs on the host against a simulated bank of expanders
//! (`sim_bus`), with a virtual clock and wall travel model.

mod conductor_tests;
mod init_tests;
