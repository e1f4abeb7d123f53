//! Utilities used by the controller: options, logging, statistics and the trigger heuristics.

pub mod heap;
pub mod logger;
pub mod options;
pub mod statistics;

/// Test utilities, including the mock host and the simulated collector.
#[cfg(any(test, feature = "test_private"))]
pub mod test_util;
