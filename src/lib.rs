//! oobgc lets an application decide when its runtime's garbage collector does its work.
//!
//! Collectors trigger by themselves when allocation crosses some limit, which means a pause can
//! land anywhere, including in the middle of a latency-critical request. With oobgc the
//! application calls [`OOBController::run()`] at points it knows are safe (e.g. after a request
//! was answered). If the collector has work pending, or is about to need a collection, that work
//! is done there, "out of band", and the collector no longer has to trigger on its own.
//!
//! A `run()` performs at most one unit of work, checked in this order:
//! 1. finish an outstanding lazy sweep,
//! 2. a major collection, if the old generation is due,
//! 3. a minor collection, if the young generation is due.
//!
//! The controller does not implement a collector. It talks to the host runtime through the
//! traits in [`host`]: a binding implements [`host::HostBinding`] and the controller is generic
//! over it.
//!
//! ```ignore
//! let builder = OOBControllerBuilder::new();
//! let oob: &'static OOBController<MyHost> = Box::leak(oob_manager::oob_init(&builder));
//! oob.setup();
//! loop {
//!     serve_one_request();
//!     oob.run()?;
//! }
//! ```

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;

mod error;
pub mod host;
mod oob;
pub mod oob_manager;
pub mod util;

#[cfg(test)]
mod tests;

pub use crate::error::OOBError;
pub use crate::oob::{OOBAction, OOBController, OOBControllerBuilder};
pub use crate::util::options::{OOBTriggerSelector, Options};
pub use crate::util::statistics::{OOBStats, StatKey, WorkKind};
