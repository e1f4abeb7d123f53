use crate::host::{
    Collection, CollectionKind, GCEvent, GCEventListener, GCPhase, HeapInspection, HeapStats,
    HostBinding,
};

use super::mock_method::*;

use std::default::Default;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

lazy_static! {
    // The mutex may get poisoned any time. Accessing this mutex needs to deal with the poisoned case.
    // One can use read/write_mockhost to access the mock host.
    static ref MOCK_HOST_INSTANCE: Mutex<MockHost> = Mutex::new(MockHost::default());
}

macro_rules! mock {
    ($fn: ident($($arg:expr),*)) => {
        write_mockhost(|mock| mock.$fn.call(($($arg),*)))
    };
}

pub fn read_mockhost<F, R>(func: F) -> R
where
    F: FnOnce(&MockHost) -> R,
{
    let lock = MOCK_HOST_INSTANCE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    func(&lock)
}

pub fn write_mockhost<F, R>(func: F) -> R
where
    F: FnOnce(&mut MockHost) -> R,
{
    let mut lock = MOCK_HOST_INSTANCE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    func(&mut lock)
}

/// Install the mock host returned by `setup`, run `test`, then run `cleanup` even if the test
/// panicked. Tests using the mock host run serially.
pub fn with_mockhost<S, T, C>(setup: S, test: T, cleanup: C)
where
    S: FnOnce() -> MockHost,
    T: FnOnce() + std::panic::UnwindSafe,
    C: FnOnce(),
{
    super::serial_test(|| {
        // Setup
        {
            write_mockhost(|mock| *mock = setup());
        }
        super::with_cleanup(test, cleanup);
    })
}

pub fn default_setup() -> MockHost {
    MockHost::default()
}

pub fn no_cleanup() {}

/// A mock host with a lazy sweep outstanding. `finish_sweep()` finishes it, and the host is idle
/// from then on.
pub fn sweeping_setup() -> MockHost {
    let sweeping = Arc::new(AtomicBool::new(true));
    let finish = sweeping.clone();
    MockHost {
        current_phase: MockMethod::new_fixed(Box::new(move |()| {
            if sweeping.load(Ordering::SeqCst) {
                GCPhase::Sweeping
            } else {
                GCPhase::Idle
            }
        })),
        finish_sweep: MockMethod::new_fixed(Box::new(move |()| {
            finish.store(false, Ordering::SeqCst)
        })),
        ..MockHost::default()
    }
}

/// Deliver a collector event to the registered listener, as a host would. Does nothing if no
/// listener is registered. The listener is called without holding the mock host lock, so it may
/// call back into the host.
pub fn fire_gc_event(event: GCEvent, stats: HeapStats) {
    let listener = read_mockhost(|mock| mock.listener);
    if let Some(listener) = listener {
        listener.on_gc_event(event, &stats);
    }
}

/// Fire the events of one complete collection cycle: start, end of mark, end of sweep.
pub fn fire_gc_cycle(start: HeapStats, end: HeapStats) {
    fire_gc_event(GCEvent::Start, start);
    fire_gc_event(GCEvent::EndMark, end);
    fire_gc_event(GCEvent::EndSweep, end);
}

/// A host whose every method is a `MockMethod`. By default it is idle, reports empty heap
/// counters, considers nothing due, and panics if asked to perform any collection work.
pub struct MockHost {
    // collection
    pub current_phase: MockMethod<(), GCPhase>,
    pub finish_sweep: MockMethod<(), ()>,
    pub start_major_collection: MockMethod<(), ()>,
    pub start_minor_collection: MockMethod<(), CollectionKind>,
    pub is_major_collection_due: MockMethod<(), bool>,
    pub is_minor_collection_due: MockMethod<(), bool>,
    pub register_listener: MockMethod<(), ()>,
    pub unregister_listener: MockMethod<(), ()>,
    // heap inspection
    pub heap_stats: MockMethod<(), HeapStats>,
    /// The listener passed to the last `register_listener()`, cleared by `unregister_listener()`.
    pub listener: Option<&'static dyn GCEventListener>,
}

impl Default for MockHost {
    fn default() -> Self {
        Self {
            current_phase: MockMethod::new_value(GCPhase::Idle),
            finish_sweep: MockMethod::new_unimplemented(),
            start_major_collection: MockMethod::new_unimplemented(),
            start_minor_collection: MockMethod::new_unimplemented(),
            is_major_collection_due: MockMethod::new_default(),
            is_minor_collection_due: MockMethod::new_default(),
            register_listener: MockMethod::new_default(),
            unregister_listener: MockMethod::new_default(),
            heap_stats: MockMethod::new_default(),
            listener: None,
        }
    }
}

impl HostBinding for MockHost {
    type HostCollection = MockHost;
    type HostHeap = MockHost;

    const HEAP_PAGE_OBJ_LIMIT: usize = 100;
}

impl Collection<MockHost> for MockHost {
    fn current_phase() -> GCPhase {
        mock!(current_phase())
    }

    fn finish_sweep() {
        mock!(finish_sweep())
    }

    fn start_major_collection() {
        mock!(start_major_collection())
    }

    fn start_minor_collection() -> CollectionKind {
        mock!(start_minor_collection())
    }

    fn is_major_collection_due() -> bool {
        mock!(is_major_collection_due())
    }

    fn is_minor_collection_due() -> bool {
        mock!(is_minor_collection_due())
    }

    fn register_listener(listener: &'static dyn GCEventListener) {
        write_mockhost(|mock| {
            mock.register_listener.call(());
            mock.listener = Some(listener);
        })
    }

    fn unregister_listener() {
        write_mockhost(|mock| {
            mock.unregister_listener.call(());
            mock.listener = None;
        })
    }
}

impl HeapInspection<MockHost> for MockHost {
    fn heap_stats() -> HeapStats {
        mock!(heap_stats())
    }
}
