use super::{Collection, HeapInspection};

/// Default number of object slots in a heap page.
const DEFAULT_HEAP_PAGE_OBJ_LIMIT: usize = 409;

/// The `HostBinding` trait associates the host-specific traits, and provides host-specific constants.
pub trait HostBinding
where
    Self: Sized + 'static + Send + Sync + Default,
{
    /// The collector's phase query, step primitives and event registration.
    type HostCollection: Collection<Self>;
    /// The collector's heap counters.
    type HostHeap: HeapInspection<Self>;

    /// How many object slots fit in one heap page. A tomb page (an empty page kept around after
    /// sweeping) contributes this many free slots to the next allocation window.
    const HEAP_PAGE_OBJ_LIMIT: usize = DEFAULT_HEAP_PAGE_OBJ_LIMIT;
}
