pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{CountingCache, FailingDelegate, FixedDelegate, SlowDelegate};
#[allow(unused_imports)]
pub use setup::{as_of, init_tracing, TestSetup, TestSetupBuilder};
