//! Host-to-OOB interface: safe Rust APIs.
//!
//! This module provides a safe Rust API for the OOB controller. We expect the host binding to
//! wrap these functions with its own surface (for example as methods on a runtime module that
//! the application calls between requests), and to manage any unsafety if it exposes them
//! over FFI.
//!
//! The same operations are available as methods on [`OOBController`]. These functions exist so
//! a binding can be written against one flat API.

use crate::host::HostBinding;
use crate::oob::{OOBController, OOBControllerBuilder};
use crate::util::statistics::StatKey;
use crate::OOBError;

/// Initialize an OOB controller. A host should call this once, and keep the returned controller
/// for the lifetime of the process.
///
/// We expect a binding to initialize the controller in the following steps:
///
/// 1. Create an [`OOBControllerBuilder`].
/// 2. Set options by [`process()`] or [`process_bulk()`]. Options can also be set through
///    `OOBGC_*` env vars.
/// 3. Create the controller with this function.
/// 4. Make the controller `'static` (e.g. with `Box::leak()`) and call [`setup()`] so it receives
///    collector events.
///
/// Note that this method will attempt to initialize a logger. If the host would like to use its
/// own logger, it should initialize the logger before calling this method.
pub fn oob_init<H: HostBinding>(builder: &OOBControllerBuilder) -> Box<OOBController<H>> {
    Box::new(builder.build())
}

/// Process an option. Returns true if the option is set successfully.
///
/// Arguments:
/// * `builder`: A reference to an OOB controller builder.
/// * `name`: The name of the option.
/// * `value`: The value of the option (as a string).
pub fn process(builder: &mut OOBControllerBuilder, name: &str, value: &str) -> bool {
    builder.set_option(name, value)
}

/// Process multiple options. Returns true if all the options are processed successfully.
///
/// Arguments:
/// * `builder`: A reference to an OOB controller builder.
/// * `options`: a string that is key value pairs separated by white spaces, e.g. "max_threshold_cap=1000 oob_trigger=Delegated"
pub fn process_bulk(builder: &mut OOBControllerBuilder, options: &str) -> bool {
    builder.set_options_bulk_by_str(options)
}

/// Register the controller with the host. Returns false if it was already registered.
pub fn setup<H: HostBinding>(oob: &'static OOBController<H>) -> bool {
    oob.setup()
}

/// Deregister the controller from the host. Returns false if it was not registered.
pub fn teardown<H: HostBinding>(oob: &'static OOBController<H>) -> bool {
    oob.teardown()
}

/// Perform at most one unit of pending collection work. Returns whether work was done.
/// This must only be called at a safe point.
pub fn run<H: HostBinding>(oob: &OOBController<H>) -> Result<bool, OOBError> {
    oob.run()
}

/// Reset all the OOB counters.
pub fn clear<H: HostBinding>(oob: &OOBController<H>) -> Result<(), OOBError> {
    oob.clear()
}

/// Read an OOB counter by name (`count`, `major_count`, `minor_count`, `sweep_count`).
pub fn stat<H: HostBinding>(oob: &OOBController<H>, key: &str) -> Result<usize, OOBError> {
    oob.stat(key)
}

/// Read an OOB counter.
pub fn stat_of<H: HostBinding>(oob: &OOBController<H>, key: StatKey) -> Result<usize, OOBError> {
    oob.stat_of(key)
}
