use super::mock_test_prelude::*;

#[test]
pub fn oob_finishes_lazy_sweep() {
    with_simulated_host(SimulatedHeap::default(), || {
        let oob = create_installed_oob::<SimulatedHost>();
        simulated_heap(|h| {
            h.collect(CollectionKind::Major, false);
            assert_eq!(h.phase, GCPhase::Sweeping);
        });

        assert_eq!(oob_manager::run(oob), Ok(true));
        assert_eq!(oob_manager::stat(oob, "sweep_count"), Ok(1));
        assert_eq!(oob_manager::stat(oob, "count"), Ok(1));
        simulated_heap(|h| {
            assert_eq!(h.phase, GCPhase::Idle);
            assert_eq!(h.swept_slots, DEFAULT_FREE_SLOTS_TARGET);
            assert_eq!(h.gc_count(), 1);
        });

        // Nothing is left to do.
        assert_eq!(oob_manager::run(oob), Ok(false));
        assert_eq!(oob_manager::stat(oob, "count"), Ok(1));
    })
}
