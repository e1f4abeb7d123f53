use thiserror::Error;

/// Errors returned by the OOB controller API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OOBError {
    /// `stat()` was given a key that does not name a counter.
    #[error("unknown OOB statistic key: {0:?}")]
    UnknownStatKey(String),
    /// `run()`, `clear()` or `stat()` was called before `setup()` (or after `teardown()`).
    #[error("the OOB controller is not set up")]
    NotInstalled,
}
