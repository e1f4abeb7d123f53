use super::mock_test_prelude::*;

const BURST: usize = 20_000;
const RETAINED: usize = 4_000;
const REQUESTS: usize = 20;

/// Each request keeps some objects alive until the next one, so survivors of minor collections
/// pile up in the old generation and die there. Once the old generation is over its limit the
/// host turns the controller's minor collection into a major one, which is counted as major.
#[test]
pub fn oob_counts_escalated_major() {
    with_simulated_host(SimulatedHeap::default(), || {
        let oob = create_installed_oob::<SimulatedHost>();
        simulated_heap(|h| h.collect(CollectionKind::Major, true));
        oob_manager::clear(oob).unwrap();
        let (minor_before, major_before) =
            simulated_heap(|h| (h.minor_gc_count, h.major_gc_count));

        let mut collected_after = vec![];
        for request in 1..=REQUESTS {
            simulated_heap(|h| {
                h.release(RETAINED);
                h.allocate(BURST, RETAINED);
            });
            if oob_manager::run(oob).unwrap() {
                collected_after.push(request);
            }
        }

        assert_eq!(collected_after, vec![4, 8, 12, 16, 20]);
        assert_eq!(oob_manager::stat(oob, "major_count"), Ok(1));
        assert_eq!(oob_manager::stat(oob, "minor_count"), Ok(4));
        assert_eq!(oob_manager::stat(oob, "sweep_count"), Ok(0));
        assert_eq!(oob_manager::stat(oob, "count"), Ok(5));
        simulated_heap(|h| {
            assert_eq!(h.autonomous_gc_count, 0);
            assert_eq!(h.minor_gc_count - minor_before, 4);
            assert_eq!(h.major_gc_count - major_before, 1);
        });
    })
}
