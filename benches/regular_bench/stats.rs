use criterion::black_box;
use criterion::Criterion;

use oobgc::{OOBStats, StatKey, WorkKind};

pub fn bench(c: &mut Criterion) {
    let stats = OOBStats::new();
    stats.inc(WorkKind::Minor);
    stats.inc(WorkKind::Sweep);

    c.bench_function("stats inc", |b| {
        b.iter(|| stats.inc(black_box(WorkKind::Minor)))
    });
    c.bench_function("stats count", |b| {
        b.iter(|| stats.value_of(black_box(StatKey::Count)))
    });
    c.bench_function("stat key parse", |b| {
        b.iter(|| StatKey::parse(black_box(":sweep_count")))
    });
}
