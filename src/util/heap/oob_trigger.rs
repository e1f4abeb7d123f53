use atomic::{Atomic, Ordering};
use bytemuck::NoUninit;
use std::marker::PhantomData;

use crate::host::{Collection, GCEvent, HeapStats, HostBinding};
use crate::util::options::{OOBTriggerSelector, Options};

/// OOBTrigger decides whether a major or a minor collection is due when `run()` is called.
/// All the heap-pressure heuristics of the controller are resolved here. Depending on the
/// policy, the decision is made from the collector's events and heap counters, or forwarded
/// to the host.
pub struct OOBTrigger<H: HostBinding> {
    /// The triggering policy.
    pub policy: Box<dyn OOBTriggerPolicy<H>>,
}

impl<H: HostBinding> OOBTrigger<H> {
    pub fn new(options: &Options) -> Self {
        OOBTrigger {
            policy: match options.oob_trigger {
                OOBTriggerSelector::AllocationLimit => {
                    Box::new(AllocationLimitTrigger::<H>::new(options))
                }
                OOBTriggerSelector::Delegated => Box::new(DelegatedTrigger::<H>::new()),
            },
        }
    }

    /// Inform the policy about a collector event.
    pub fn on_gc_event(&self, event: GCEvent, stats: &HeapStats) {
        match event {
            GCEvent::Start => self.policy.on_gc_start(stats),
            GCEvent::EndMark => self.policy.on_gc_end_mark(stats),
            GCEvent::EndSweep => self.policy.on_gc_end_sweep(stats),
        }
    }
}

/// This trait describes an OOB trigger policy. A policy has hooks to be informed about
/// collector events and about each `run()` so it can collect some statistics about allocation.
/// It then decides whether a major or a minor collection is due.
pub trait OOBTriggerPolicy<H: HostBinding>: Sync + Send {
    /// Inform the policy that a collection starts.
    fn on_gc_start(&self, _stats: &HeapStats) {}
    /// Inform the policy that marking ended.
    fn on_gc_end_mark(&self, _stats: &HeapStats) {}
    /// Inform the policy that sweeping ended.
    fn on_gc_end_sweep(&self, _stats: &HeapStats) {}
    /// Inform the policy that `run()` was called. This happens before any `is_*_due` query of
    /// the same `run()`.
    fn on_run(&self, _stats: &HeapStats) {}
    /// Is a full collection due now?
    fn is_major_due(&self, stats: &HeapStats) -> bool;
    /// Is a young generation collection due now?
    fn is_minor_due(&self, stats: &HeapStats) -> bool;
}

/// Forward the decision to the host's own predicates.
pub struct DelegatedTrigger<H: HostBinding> {
    phantom: PhantomData<H>,
}

impl<H: HostBinding> DelegatedTrigger<H> {
    pub fn new() -> Self {
        Self {
            phantom: PhantomData,
        }
    }
}

impl<H: HostBinding> Default for DelegatedTrigger<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: HostBinding> OOBTriggerPolicy<H> for DelegatedTrigger<H> {
    fn is_major_due(&self, _stats: &HeapStats) -> bool {
        <H::HostCollection as Collection<H>>::is_major_collection_due()
    }

    fn is_minor_due(&self, _stats: &HeapStats) -> bool {
        <H::HostCollection as Collection<H>>::is_minor_collection_due()
    }
}

/// The allocation window the collector opened at its last sweep, and the allocation rate
/// observed between `run()` calls.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, NoUninit)]
pub struct AllocationWindow {
    /// The collector is expected to start its next collection once `total_allocated_objects`
    /// reaches this. 0 means unknown: no sweep has finished since the last collection started.
    pub allocation_limit: usize,
    /// `total_allocated_objects` when the last collection started.
    pub gc_start_total_allocated_objects: usize,
    /// `total_allocated_objects` at the last `run()`.
    pub prev_allocated_objects: usize,
    /// How many `run()` calls we have seen.
    pub runs_observed: usize,
    /// Smoothed number of objects allocated between two `run()` calls.
    pub mean_threshold: usize,
    /// Largest number of objects allocated between two `run()` calls, capped.
    pub max_threshold: usize,
}

/// Predict the collector's next collection the way the collector computes it.
///
/// When a sweep ends, the free slots it found (plus the slots in tomb pages, minus the slots
/// held for finalization) are what can be allocated before the collector has to start again.
/// Adding them to the allocation count at the start of the cycle gives the allocation limit.
/// A collection is due at `run()` when the next burst of allocation, estimated from the bursts
/// seen so far, would likely cross the limit before the next `run()`.
pub struct AllocationLimitTrigger<H: HostBinding> {
    max_threshold_cap: usize,
    old_objects_ratio: f64,
    major_headroom_ratio: f64,
    window: Atomic<AllocationWindow>,
    phantom: PhantomData<H>,
}

impl<H: HostBinding> AllocationLimitTrigger<H> {
    pub fn new(options: &Options) -> Self {
        Self {
            max_threshold_cap: options.max_threshold_cap,
            old_objects_ratio: options.old_objects_ratio,
            major_headroom_ratio: options.major_headroom_ratio,
            window: Atomic::new(AllocationWindow::default()),
            phantom: PhantomData,
        }
    }

    pub fn window(&self) -> AllocationWindow {
        self.window.load(Ordering::Relaxed)
    }

    fn access_window<F>(&self, f: F)
    where
        F: FnOnce(&mut AllocationWindow),
    {
        let mut window = self.window.load(Ordering::Relaxed);
        f(&mut window);
        self.window.store(window, Ordering::Relaxed);
    }

    fn near_limit(curr: usize, limit: usize, headroom: f64) -> bool {
        curr as f64 >= limit as f64 - headroom
    }
}

impl<H: HostBinding> OOBTriggerPolicy<H> for AllocationLimitTrigger<H> {
    fn on_gc_start(&self, stats: &HeapStats) {
        self.access_window(|window| {
            window.allocation_limit = 0;
            window.gc_start_total_allocated_objects = stats.total_allocated_objects;
            trace!(
                "on_gc_start: total_allocated_objects = {}",
                stats.total_allocated_objects
            );
        });
    }

    fn on_gc_end_sweep(&self, stats: &HeapStats) {
        self.access_window(|window| {
            window.allocation_limit = (window.gc_start_total_allocated_objects
                + stats.heap_swept_slots
                + stats.heap_tomb_pages * H::HEAP_PAGE_OBJ_LIMIT)
                .saturating_sub(stats.heap_final_slots);
            trace!(
                "on_gc_end_sweep: allocation_limit = {} + swept {} + tomb pages {} * {} - final {} = {}",
                window.gc_start_total_allocated_objects,
                stats.heap_swept_slots,
                stats.heap_tomb_pages,
                H::HEAP_PAGE_OBJ_LIMIT,
                stats.heap_final_slots,
                window.allocation_limit
            );
        });
    }

    fn on_run(&self, stats: &HeapStats) {
        let curr = stats.total_allocated_objects;
        let cap = self.max_threshold_cap;
        self.access_window(|window| {
            if window.runs_observed > 0 {
                let diff = curr.saturating_sub(window.prev_allocated_objects);
                window.mean_threshold = if window.mean_threshold == 0 {
                    diff
                } else {
                    diff / 4 + window.mean_threshold * 3 / 4
                };
                window.max_threshold = window.max_threshold.max(diff).min(cap);
                trace!(
                    "on_run: diff = {}, mean = {}, max = {}",
                    diff,
                    window.mean_threshold,
                    window.max_threshold
                );
            }
            window.prev_allocated_objects = curr;
            window.runs_observed += 1;
        });
    }

    fn is_major_due(&self, stats: &HeapStats) -> bool {
        let window = self.window();
        if window.allocation_limit == 0 {
            return false;
        }
        let ratio = self.old_objects_ratio;
        // A zero limit means the host does not track that counter.
        let over = |value: usize, limit: usize| limit > 0 && value as f64 >= limit as f64 * ratio;
        let old_gen_full = over(stats.old_objects, stats.old_objects_limit)
            || over(
                stats.remembered_wb_unprotected_objects,
                stats.remembered_wb_unprotected_objects_limit,
            );
        let due = old_gen_full
            && Self::near_limit(
                stats.total_allocated_objects,
                window.allocation_limit,
                window.max_threshold as f64 * self.major_headroom_ratio,
            );
        if due {
            debug!(
                "Major collection due: {} >= {} - {} * {}",
                stats.total_allocated_objects,
                window.allocation_limit,
                window.max_threshold,
                self.major_headroom_ratio
            );
        }
        due
    }

    fn is_minor_due(&self, stats: &HeapStats) -> bool {
        let window = self.window();
        if window.allocation_limit == 0 {
            return false;
        }
        let due = stats.total_allocated_objects
            >= window.allocation_limit.saturating_sub(window.mean_threshold);
        if due {
            debug!(
                "Minor collection due: {} >= {} - {}",
                stats.total_allocated_objects, window.allocation_limit, window.mean_threshold
            );
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::test_util::mock_host::MockHost;

    fn trigger() -> AllocationLimitTrigger<MockHost> {
        AllocationLimitTrigger::new(&Options::builtin_defaults())
    }

    fn allocated(total: usize) -> HeapStats {
        HeapStats {
            total_allocated_objects: total,
            ..Default::default()
        }
    }

    #[test]
    fn nothing_due_before_first_sweep() {
        let trigger = trigger();
        trigger.on_run(&allocated(1_000_000));
        assert!(!trigger.is_minor_due(&allocated(1_000_000)));
        assert!(!trigger.is_major_due(&HeapStats {
            total_allocated_objects: 1_000_000,
            old_objects: 100,
            old_objects_limit: 100,
            ..Default::default()
        }));
    }

    #[test]
    fn allocation_limit_from_sweep() {
        let trigger = trigger();
        trigger.on_gc_start(&allocated(5_000));
        trigger.on_gc_end_sweep(&HeapStats {
            total_allocated_objects: 5_000,
            heap_swept_slots: 30_000,
            heap_tomb_pages: 2,
            heap_final_slots: 100,
            ..Default::default()
        });
        assert_eq!(
            trigger.window().allocation_limit,
            5_000 + 30_000 + 2 * MockHost::HEAP_PAGE_OBJ_LIMIT - 100
        );
    }

    #[test]
    fn gc_start_clears_allocation_limit() {
        let trigger = trigger();
        trigger.on_gc_start(&allocated(0));
        trigger.on_gc_end_sweep(&HeapStats {
            heap_swept_slots: 10_000,
            ..Default::default()
        });
        assert_eq!(trigger.window().allocation_limit, 10_000);

        trigger.on_gc_start(&allocated(9_000));
        assert_eq!(trigger.window().allocation_limit, 0);
        assert_eq!(trigger.window().gc_start_total_allocated_objects, 9_000);
    }

    #[test]
    fn first_run_only_records_allocation_count() {
        let trigger = trigger();
        trigger.on_run(&allocated(12_345));
        let window = trigger.window();
        assert_eq!(window.prev_allocated_objects, 12_345);
        assert_eq!(window.mean_threshold, 0);
        assert_eq!(window.max_threshold, 0);
    }

    #[test]
    fn mean_is_smoothed_and_max_is_capped() {
        let mut options = Options::builtin_defaults();
        options.max_threshold_cap = 50_000;
        let trigger = AllocationLimitTrigger::<MockHost>::new(&options);

        trigger.on_run(&allocated(0));
        trigger.on_run(&allocated(40_000));
        assert_eq!(trigger.window().mean_threshold, 40_000);
        assert_eq!(trigger.window().max_threshold, 40_000);

        trigger.on_run(&allocated(40_000 + 80_000));
        // 80_000 / 4 + 40_000 * 3 / 4
        assert_eq!(trigger.window().mean_threshold, 50_000);
        assert_eq!(trigger.window().max_threshold, 50_000);

        trigger.on_run(&allocated(120_000 + 10_000));
        // 10_000 / 4 + 50_000 * 3 / 4
        assert_eq!(trigger.window().mean_threshold, 40_000);
        assert_eq!(trigger.window().max_threshold, 50_000);
    }

    #[test]
    fn minor_due_within_mean_of_limit() {
        let trigger = trigger();
        trigger.on_gc_start(&allocated(0));
        trigger.on_gc_end_sweep(&HeapStats {
            heap_swept_slots: 100_000,
            ..Default::default()
        });
        trigger.on_run(&allocated(0));
        trigger.on_run(&allocated(20_000));

        assert!(!trigger.is_minor_due(&allocated(79_999)));
        assert!(trigger.is_minor_due(&allocated(80_000)));
    }

    #[test]
    fn major_due_needs_full_old_generation() {
        let trigger = trigger();
        trigger.on_gc_start(&allocated(0));
        trigger.on_gc_end_sweep(&HeapStats {
            heap_swept_slots: 100_000,
            ..Default::default()
        });
        trigger.on_run(&allocated(0));
        trigger.on_run(&allocated(50_000));

        // 100_000 - 50_000 * 0.98 = 51_000
        let near_limit = HeapStats {
            total_allocated_objects: 51_010,
            old_objects: 960,
            old_objects_limit: 1_000,
            ..Default::default()
        };
        assert!(!trigger.is_major_due(&near_limit));
        assert!(trigger.is_major_due(&HeapStats {
            old_objects: 980,
            ..near_limit
        }));
        assert!(trigger.is_major_due(&HeapStats {
            remembered_wb_unprotected_objects: 98,
            remembered_wb_unprotected_objects_limit: 100,
            ..near_limit
        }));
        assert!(!trigger.is_major_due(&HeapStats {
            total_allocated_objects: 50_990,
            old_objects: 1_000,
            ..near_limit
        }));
    }

    #[test]
    fn untracked_old_generation_is_never_full() {
        let trigger = trigger();
        trigger.on_gc_start(&allocated(0));
        trigger.on_gc_end_sweep(&HeapStats {
            heap_swept_slots: 100_000,
            ..Default::default()
        });
        // Right at the limit, but both old generation limits are zero.
        assert!(!trigger.is_major_due(&HeapStats {
            total_allocated_objects: 100_000,
            old_objects: 5_000,
            remembered_wb_unprotected_objects: 5_000,
            ..Default::default()
        }));
        assert!(trigger.is_minor_due(&allocated(100_000)));
    }
}
