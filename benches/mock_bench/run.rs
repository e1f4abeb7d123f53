use criterion::black_box;
use criterion::Criterion;

use oobgc::host::HeapStats;
use oobgc::oob_manager;
use oobgc::util::test_util::fixtures::*;
use oobgc::util::test_util::mock_host::*;
use oobgc::util::test_util::mock_method::*;

// The common case: the application calls run() after every request and nothing is due.
pub fn bench(c: &mut Criterion) {
    write_mockhost(|mock| {
        *mock = MockHost {
            heap_stats: MockMethod::new_value(HeapStats {
                total_allocated_objects: 1_000,
                ..HeapStats::default()
            }),
            ..MockHost::default()
        }
    });
    let oob = create_installed_oob::<MockHost>();
    fire_gc_cycle(
        HeapStats::default(),
        HeapStats {
            heap_swept_slots: 1_000_000,
            ..HeapStats::default()
        },
    );

    c.bench_function("run nothing due", |b| {
        b.iter(|| oob_manager::run(black_box(oob)))
    });
    c.bench_function("decide nothing due", |b| b.iter(|| black_box(oob).decide()));
}
