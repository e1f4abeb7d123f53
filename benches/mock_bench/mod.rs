pub mod run;

pub use criterion::Criterion;

pub fn bench(c: &mut Criterion) {
    run::bench(c);
}
