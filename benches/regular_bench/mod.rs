pub mod stats;

pub use criterion::Criterion;

pub fn bench(c: &mut Criterion) {
    stats::bench(c);
}
