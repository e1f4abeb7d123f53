//! The out-of-band collection controller.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::host::{Collection, CollectionKind, GCEvent, GCEventListener, GCPhase, HeapInspection};
use crate::host::{HeapStats, HostBinding};
use crate::util::heap::oob_trigger::OOBTrigger;
use crate::util::options::Options;
use crate::util::statistics::{OOBStats, StatKey, WorkKind};
use crate::OOBError;

/// A unit of collection work `run()` can perform, or none.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum OOBAction {
    /// A lazy sweep is outstanding. Finish it.
    FinishSweep,
    /// The old generation is due for collection. Collect the whole heap.
    MajorCollection,
    /// The young generation is due for collection.
    MinorCollection,
    /// Nothing is due.
    Nothing,
}

/// OOBControllerBuilder can create an OOB controller instance. It collects options before the
/// controller exists, from env vars and from calls to `set_option()`.
pub struct OOBControllerBuilder {
    /// The options for this instance.
    pub options: Options,
}

impl OOBControllerBuilder {
    /// Create a builder with options read from env vars (`OOBGC_*`).
    pub fn new() -> Self {
        OOBControllerBuilder {
            options: Options::default(),
        }
    }

    /// Create a builder with the built-in default options, ignoring env vars.
    pub fn new_no_env_vars() -> Self {
        OOBControllerBuilder {
            options: Options::builtin_defaults(),
        }
    }

    /// Set an option. Returns false if the name is unknown or the value is invalid.
    pub fn set_option(&mut self, name: &str, val: &str) -> bool {
        self.options.set_from_str(name, val)
    }

    /// Set multiple options from a string like `"max_threshold_cap=1000 oob_trigger=Delegated"`.
    /// Returns true only if every option was set.
    pub fn set_options_bulk_by_str(&mut self, options: &str) -> bool {
        self.options.set_bulk_from_str(options)
    }

    /// Build a controller.
    pub fn build<H: HostBinding>(&self) -> OOBController<H> {
        OOBController::new(self.options.clone())
    }
}

impl Default for OOBControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The out-of-band GC controller. An application calls `run()` at points where it knows a
/// collection pause is harmless (e.g. between two requests), and the controller performs at most
/// one pending unit of collection work there, so the collector does not have to trigger by itself
/// in the middle of critical work.
///
/// A host is expected to create one controller per process, and keep it for the lifetime of the
/// process (`setup()` hands the host a `'static` reference for event delivery). `Box::leak()` or a
/// lazily initialized static both work.
///
/// The controller is not thread safe in the sense of coordinating with other threads: `run()` must
/// be called from the thread that owns the collector's safe point protocol. Counters are atomics,
/// so `stat()` from elsewhere sees either the value before or after a unit of work.
pub struct OOBController<H: HostBinding> {
    pub(crate) options: Options,
    installed: AtomicBool,
    trigger: OOBTrigger<H>,
    stats: OOBStats,
    phantom: PhantomData<H>,
}

impl<H: HostBinding> OOBController<H> {
    /// Create a controller. This will attempt to initialize a logger. If the host would like to
    /// use its own logger, it should initialize the logger before calling this method.
    pub fn new(options: Options) -> Self {
        match crate::util::logger::try_init() {
            Ok(_) => debug!("oobgc initialized the logger."),
            Err(_) => debug!(
                "oobgc failed to initialize the logger. Possibly a logger has been initialized by user."
            ),
        }
        debug!("Creating OOB controller with {:?}", options);
        OOBController {
            trigger: OOBTrigger::new(&options),
            options,
            installed: AtomicBool::new(false),
            stats: OOBStats::new(),
            phantom: PhantomData,
        }
    }

    /// Register the controller with the host, so the host starts delivering collector events.
    /// Returns true if this call installed the controller, and false if it was already installed.
    /// Calling this more than once is harmless, and never touches the counters.
    pub fn setup(&'static self) -> bool {
        if self
            .installed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("OOB controller is already installed");
            return false;
        }
        <H::HostCollection as Collection<H>>::register_listener(self);
        info!("OOB controller installed");
        true
    }

    /// Deregister the controller from the host. Returns true if the controller was installed.
    /// The counters are kept, but can only be read after another `setup()`.
    pub fn teardown(&'static self) -> bool {
        if self
            .installed
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        <H::HostCollection as Collection<H>>::unregister_listener();
        info!("OOB controller uninstalled");
        if self.options.print_stats_on_teardown {
            self.stats.print_stats();
        }
        true
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::SeqCst)
    }

    fn check_installed(&self) -> Result<(), OOBError> {
        if self.is_installed() {
            Ok(())
        } else {
            Err(OOBError::NotInstalled)
        }
    }

    /// Reset all the counters to zero.
    pub fn clear(&self) -> Result<(), OOBError> {
        self.check_installed()?;
        self.stats.clear();
        Ok(())
    }

    /// Perform at most one pending unit of collection work. Returns whether any work was done.
    ///
    /// This blocks for as long as the unit of work takes, which may be a full collection. It must
    /// only be called at a safe point.
    ///
    /// # Panics
    /// Panics if the host reports that it is in the middle of collection work
    /// (`GCPhase::Collecting`). Stepping the collector from there would corrupt its heap.
    pub fn run(&self) -> Result<bool, OOBError> {
        self.check_installed()?;

        let heap = <H::HostHeap as HeapInspection<H>>::heap_stats();
        self.trigger.policy.on_run(&heap);

        let action = self.decide_with(&heap);
        Ok(self.dispatch(action))
    }

    /// Classify the current situation without performing any work. `run()` is `decide()`
    /// followed by performing the action.
    pub fn decide(&self) -> OOBAction {
        let heap = <H::HostHeap as HeapInspection<H>>::heap_stats();
        self.decide_with(&heap)
    }

    fn decide_with(&self, heap: &HeapStats) -> OOBAction {
        let phase = <H::HostCollection as Collection<H>>::current_phase();
        match phase {
            GCPhase::Collecting => panic!(
                "OOB collection requested while the host collector is busy. run() must only be called at a safe point."
            ),
            // Finishing a sweep that already started is the cheapest work there is, and it has
            // to be done before another cycle can start anyway.
            GCPhase::Sweeping => OOBAction::FinishSweep,
            GCPhase::Idle | GCPhase::Marking => {
                if self.trigger.policy.is_major_due(heap) {
                    OOBAction::MajorCollection
                } else if self.trigger.policy.is_minor_due(heap) {
                    OOBAction::MinorCollection
                } else {
                    OOBAction::Nothing
                }
            }
        }
    }

    /// Perform `action`, and count it once it is finished.
    fn dispatch(&self, action: OOBAction) -> bool {
        let kind = match action {
            OOBAction::Nothing => return false,
            OOBAction::FinishSweep => {
                debug!("OOB: finishing lazy sweep");
                <H::HostCollection as Collection<H>>::finish_sweep();
                debug_assert_eq!(
                    <H::HostCollection as Collection<H>>::current_phase(),
                    GCPhase::Idle,
                    "The host is still sweeping after finish_sweep()"
                );
                WorkKind::Sweep
            }
            OOBAction::MajorCollection => {
                debug!("OOB: major collection");
                <H::HostCollection as Collection<H>>::start_major_collection();
                WorkKind::Major
            }
            OOBAction::MinorCollection => {
                debug!("OOB: minor collection");
                match <H::HostCollection as Collection<H>>::start_minor_collection() {
                    CollectionKind::Minor => WorkKind::Minor,
                    CollectionKind::Major => {
                        debug!("OOB: the host escalated the minor collection to a major one");
                        WorkKind::Major
                    }
                }
            }
        };
        self.stats.inc(kind);
        true
    }

    /// Read a counter by name: `count`, `major_count`, `minor_count` or `sweep_count`, with or
    /// without a leading colon.
    pub fn stat(&self, key: &str) -> Result<usize, OOBError> {
        self.check_installed()?;
        let key = StatKey::parse(key)?;
        Ok(self.stats.value_of(key))
    }

    /// Read a counter.
    pub fn stat_of(&self, key: StatKey) -> Result<usize, OOBError> {
        self.check_installed()?;
        Ok(self.stats.value_of(key))
    }

    /// The counters block.
    pub fn stats(&self) -> &OOBStats {
        &self.stats
    }

    pub fn get_options(&self) -> &Options {
        &self.options
    }
}

impl<H: HostBinding> GCEventListener for OOBController<H> {
    fn on_gc_event(&self, event: GCEvent, stats: &HeapStats) {
        trace!("GC event {:?}: {:?}", event, stats);
        self.trigger.on_gc_event(event, stats);
    }
}
