use super::{HeapStats, HostBinding};

/// The phase the host collector is in, as observed at a safe point.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GCPhase {
    /// No collection cycle is in progress.
    Idle,
    /// An incremental mark is in progress. Starting a collection finishes it.
    Marking,
    /// Marking is done, and lazy sweeping has not yet reclaimed every dead object.
    Sweeping,
    /// The host is executing collection work on the calling thread right now (e.g. the caller
    /// is a finalizer or a GC hook). It is never safe to step the collector from here.
    Collecting,
}

/// The kind of collection the host actually performed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CollectionKind {
    /// Only the young generation was collected.
    Minor,
    /// All generations were collected.
    Major,
}

/// Collector events a registered listener is informed about.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GCEvent {
    /// A collection cycle starts.
    Start,
    /// Marking finished. Sweeping may be done lazily after this.
    EndMark,
    /// Sweeping finished and the cycle is over.
    EndSweep,
}

/// Something the host calls back on collector events. The OOB controller registers itself
/// as a listener in `setup()`.
pub trait GCEventListener: Sync {
    /// Called by the host when `event` happens. `stats` is a snapshot of the heap counters at
    /// the time of the event.
    fn on_gc_event(&self, event: GCEvent, stats: &HeapStats);
}

/// Host-specific methods for observing and stepping the collector.
pub trait Collection<H: HostBinding> {
    /// Return the current phase of the collector.
    fn current_phase() -> GCPhase;

    /// Drive an outstanding lazy sweep to completion. After this returns, the phase is
    /// `GCPhase::Idle`. This is only called when the phase is `GCPhase::Sweeping`.
    fn finish_sweep();

    /// Perform a full collection, including its sweep.
    fn start_major_collection();

    /// Perform a young-generation collection, including its sweep. The host may decide to
    /// collect the whole heap instead (for example when the old generation is over its limit).
    /// The return value reports which kind of collection was actually performed.
    fn start_minor_collection() -> CollectionKind;

    /// Does the host itself consider a major collection due? Only consulted by the
    /// `Delegated` trigger.
    fn is_major_collection_due() -> bool {
        false
    }

    /// Does the host itself consider a minor collection due? Only consulted by the
    /// `Delegated` trigger.
    fn is_minor_collection_due() -> bool {
        false
    }

    /// Start delivering collector events to `listener`. The host keeps at most one listener.
    fn register_listener(listener: &'static dyn GCEventListener);

    /// Stop delivering collector events.
    fn unregister_listener();
}
