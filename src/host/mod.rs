//! Host-to-OOB interface: the traits a host runtime implements so the OOB controller can
//! observe its collector and ask it to perform units of collection work.
//!
//! The controller never owns any collector state. Everything it knows about the heap comes
//! through [`Collection`] and [`HeapInspection`], and everything it does to the heap goes
//! through the step primitives on [`Collection`]. A binding implements [`HostBinding`] on a
//! (usually zero-sized) type and points the associated types at its implementations.

mod collection;
mod heap;
mod hostbinding;

pub use self::collection::{Collection, CollectionKind, GCEvent, GCEventListener, GCPhase};
pub use self::heap::{HeapInspection, HeapStats};
pub use self::hostbinding::HostBinding;
