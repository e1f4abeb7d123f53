//! A small simulated generational collector with lazy sweeping.
//!
//! The model is deliberately simple, but it triggers the way a real allocation-driven collector
//! does: a sweep leaves a fixed number of free slots, and when allocation has used all of them the
//! collector starts a minor collection by itself. Objects surviving a minor collection are
//! promoted to the old generation. Dead old objects are only reclaimed by a major collection,
//! and a minor collection is escalated to a major one when the old generation is over its limit.

use crate::host::{
    Collection, CollectionKind, GCEvent, GCEventListener, GCPhase, HeapInspection, HeapStats,
    HostBinding,
};

use std::sync::Mutex;

/// The default number of free slots a sweep leaves.
pub const DEFAULT_FREE_SLOTS_TARGET: usize = 100_000;
/// The default lower bound of the old generation limit.
pub const DEFAULT_MIN_OLD_OBJECTS_LIMIT: usize = 10_000;

lazy_static! {
    static ref SIMULATED_HEAP: Mutex<SimulatedHeap> = Mutex::new(SimulatedHeap::default());
}

pub struct SimulatedHeap {
    pub phase: GCPhase,
    pub total_allocated_objects: usize,
    /// Slots that can be allocated before the collector has to start a collection.
    pub free_slots: usize,
    /// Free slots each sweep leaves. The heap grows or shrinks to keep this many.
    pub free_slots_target: usize,
    /// Free slots the current cycle's sweep will leave once it is finished.
    pending_free_slots: usize,
    /// Slots reclaimed by the last finished sweep.
    pub swept_slots: usize,
    /// Live objects allocated since the last collection.
    pub live_young: usize,
    /// Live objects in the old generation.
    pub live_old: usize,
    /// Objects in the old generation, including dead ones not reclaimed yet.
    pub old_objects: usize,
    pub old_objects_limit: usize,
    pub min_old_objects_limit: usize,
    /// Do collections the collector starts by itself sweep right away, or lazily?
    pub immediate_sweep: bool,
    pub minor_gc_count: usize,
    pub major_gc_count: usize,
    /// Collections the collector started by itself because allocation ran out of free slots.
    pub autonomous_gc_count: usize,
    listener: Option<&'static dyn GCEventListener>,
    events: Vec<(GCEvent, HeapStats)>,
}

impl Default for SimulatedHeap {
    fn default() -> Self {
        Self::new(DEFAULT_FREE_SLOTS_TARGET)
    }
}

impl SimulatedHeap {
    pub fn new(free_slots_target: usize) -> Self {
        SimulatedHeap {
            phase: GCPhase::Idle,
            total_allocated_objects: 0,
            free_slots: free_slots_target,
            free_slots_target,
            pending_free_slots: 0,
            swept_slots: 0,
            live_young: 0,
            live_old: 0,
            old_objects: 0,
            old_objects_limit: DEFAULT_MIN_OLD_OBJECTS_LIMIT,
            min_old_objects_limit: DEFAULT_MIN_OLD_OBJECTS_LIMIT,
            immediate_sweep: true,
            minor_gc_count: 0,
            major_gc_count: 0,
            autonomous_gc_count: 0,
            listener: None,
            events: vec![],
        }
    }

    pub fn gc_count(&self) -> usize {
        self.minor_gc_count + self.major_gc_count
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            total_allocated_objects: self.total_allocated_objects,
            heap_swept_slots: self.swept_slots,
            heap_tomb_pages: 0,
            heap_final_slots: 0,
            old_objects: self.old_objects,
            old_objects_limit: self.old_objects_limit,
            // The simulation has no write-barrier-unprotected objects.
            remembered_wb_unprotected_objects: 0,
            remembered_wb_unprotected_objects_limit: 0,
        }
    }

    fn emit(&mut self, event: GCEvent) {
        if self.listener.is_some() {
            let stats = self.stats();
            self.events.push((event, stats));
        }
    }

    /// Allocate `n` objects, `retain` of which stay alive. Starts a minor collection whenever
    /// the free slots run out.
    pub fn allocate(&mut self, n: usize, retain: usize) {
        assert!(retain <= n);
        let mut remaining = n;
        while remaining > 0 {
            if self.phase == GCPhase::Sweeping {
                // Allocation drives the lazy sweep.
                self.sweep();
            }
            if self.free_slots == 0 {
                trace!("Simulated heap: out of free slots, collecting");
                self.autonomous_gc_count += 1;
                let immediate_sweep = self.immediate_sweep;
                self.collect(CollectionKind::Minor, immediate_sweep);
                continue;
            }
            let chunk = remaining.min(self.free_slots);
            self.free_slots -= chunk;
            self.total_allocated_objects += chunk;
            remaining -= chunk;
        }
        self.live_young += retain;
    }

    /// Let `n` live objects die, young ones first.
    pub fn release(&mut self, n: usize) {
        let young = n.min(self.live_young);
        self.live_young -= young;
        self.live_old -= (n - young).min(self.live_old);
    }

    /// Run a collection. A requested minor collection becomes a major one when the old
    /// generation is over its limit. Returns the kind of collection performed.
    pub fn collect(&mut self, requested: CollectionKind, immediate_sweep: bool) -> CollectionKind {
        if self.phase == GCPhase::Sweeping {
            self.sweep();
        }
        let kind = if requested == CollectionKind::Minor && self.old_objects > self.old_objects_limit
        {
            CollectionKind::Major
        } else {
            requested
        };

        self.phase = GCPhase::Marking;
        self.emit(GCEvent::Start);

        self.live_old += self.live_young;
        match kind {
            CollectionKind::Minor => {
                self.old_objects += self.live_young;
                self.minor_gc_count += 1;
            }
            CollectionKind::Major => {
                self.old_objects = self.live_old;
                self.old_objects_limit = (self.old_objects * 2).max(self.min_old_objects_limit);
                self.major_gc_count += 1;
            }
        }
        self.live_young = 0;
        self.pending_free_slots = self.free_slots_target;

        self.phase = GCPhase::Sweeping;
        self.emit(GCEvent::EndMark);
        if immediate_sweep {
            self.sweep();
        }
        kind
    }

    /// Finish an outstanding sweep. Does nothing if there is none.
    pub fn sweep(&mut self) {
        if self.phase != GCPhase::Sweeping {
            return;
        }
        self.swept_slots = self.pending_free_slots;
        self.free_slots = self.pending_free_slots;
        self.phase = GCPhase::Idle;
        self.emit(GCEvent::EndSweep);
    }
}

/// Access the simulated heap. Collector events raised by `func` are delivered to the registered
/// listener after the heap lock is released.
pub fn simulated_heap<F, R>(func: F) -> R
where
    F: FnOnce(&mut SimulatedHeap) -> R,
{
    let (ret, events, listener) = {
        let mut heap = SIMULATED_HEAP
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let ret = func(&mut heap);
        let events = std::mem::take(&mut heap.events);
        (ret, events, heap.listener)
    };
    if let Some(listener) = listener {
        for (event, stats) in events.iter() {
            listener.on_gc_event(*event, stats);
        }
    }
    ret
}

/// Install `heap` as the simulated heap, and run `test`. Tests using the simulated heap run serially.
pub fn with_simulated_host<T>(heap: SimulatedHeap, test: T)
where
    T: FnOnce() + std::panic::UnwindSafe,
{
    super::serial_test(|| {
        simulated_heap(|h| *h = heap);
        super::with_cleanup(test, || simulated_heap(|h| *h = SimulatedHeap::default()));
    })
}

/// A host backed by the simulated heap.
#[derive(Default)]
pub struct SimulatedHost;

impl HostBinding for SimulatedHost {
    type HostCollection = SimulatedHost;
    type HostHeap = SimulatedHost;
}

impl Collection<SimulatedHost> for SimulatedHost {
    fn current_phase() -> GCPhase {
        simulated_heap(|h| h.phase)
    }

    fn finish_sweep() {
        simulated_heap(|h| h.sweep())
    }

    fn start_major_collection() {
        simulated_heap(|h| h.collect(CollectionKind::Major, true));
    }

    fn start_minor_collection() -> CollectionKind {
        simulated_heap(|h| h.collect(CollectionKind::Minor, true))
    }

    fn register_listener(listener: &'static dyn GCEventListener) {
        simulated_heap(|h| h.listener = Some(listener))
    }

    fn unregister_listener() {
        simulated_heap(|h| h.listener = None)
    }
}

impl HeapInspection<SimulatedHost> for SimulatedHost {
    fn heap_stats() -> HeapStats {
        simulated_heap(|h| h.stats())
    }
}
