// Some helpers are only used by some of the test modules.
#![allow(dead_code)]

use std::panic;
use std::sync::Mutex;

pub mod fixtures;
pub mod mock_host;
pub mod mock_method;
pub mod simulated_host;

lazy_static! {
    // A global lock to make tests serial.
    // The mock host, the simulated host and the env vars read by `Options` are all process-wide,
    // so any test touching them takes this lock.
    static ref SERIAL_TEST_LOCK: Mutex<()> = Mutex::default();
}

// force some tests to be executed serially
pub fn serial_test<F>(f: F)
where
    F: FnOnce(),
{
    // If one test fails, the lock will become poisoned. We would want to continue for other tests anyway.
    let _guard = SERIAL_TEST_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f();
}

// Always execute a cleanup closure no matter the test panics or not.
pub fn with_cleanup<T, C>(test: T, cleanup: C)
where
    T: FnOnce() + panic::UnwindSafe,
    C: FnOnce(),
{
    let res = panic::catch_unwind(test);
    cleanup();
    if let Err(e) = res {
        panic::resume_unwind(e);
    }
}
