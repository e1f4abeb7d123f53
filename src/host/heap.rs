use super::HostBinding;

/// A snapshot of the host's heap counters. The names follow the usual generational
/// collector statistics. Counters a host does not track can be left at zero.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects allocated since the process started. This never decreases.
    pub total_allocated_objects: usize,
    /// Slots reclaimed by the last sweep.
    pub heap_swept_slots: usize,
    /// Empty pages kept after the last sweep.
    pub heap_tomb_pages: usize,
    /// Slots still waiting for finalizers to run.
    pub heap_final_slots: usize,
    /// Objects in the old generation, live or not yet collected.
    pub old_objects: usize,
    /// The old generation size at which the host schedules a major collection.
    pub old_objects_limit: usize,
    /// Old objects without write barriers that must be rescanned on every minor collection.
    pub remembered_wb_unprotected_objects: usize,
    /// The remembered set size at which the host schedules a major collection.
    pub remembered_wb_unprotected_objects_limit: usize,
}

/// Host-specific methods for reading heap counters.
pub trait HeapInspection<H: HostBinding> {
    /// Return a snapshot of the heap counters.
    fn heap_stats() -> HeapStats;
}
