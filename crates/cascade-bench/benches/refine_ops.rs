//! Criterion benchmarks for refiner construction, schedule creation and
//! ghost-fill lookup.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use cascade_bench::{field_lookup, field_names, NoopScheduleCompiler};
use cascade_core::VecFieldDescriptor;
use cascade_refine::{make_ghost_refiner, LinearTimeInterpolate, RefinerPool};
use cascade_test_utils::{MockHierarchy, NamedRefineOperator};

fn ghost_pool(fields: &[String]) -> RefinerPool {
    let lookup = field_lookup(fields);
    let mut pool = RefinerPool::new(Arc::new(NoopScheduleCompiler));
    for f in fields {
        let refiner = make_ghost_refiner(
            &VecFieldDescriptor::new(format!("{f}_ghost")),
            &VecFieldDescriptor::new(f),
            &VecFieldDescriptor::new(format!("{f}_old")),
            &lookup,
            Arc::new(NamedRefineOperator::new("conservative")),
            Arc::new(LinearTimeInterpolate),
        );
        pool.add(refiner, f.as_str());
    }
    pool
}

fn bench_make_ghost_refiners(c: &mut Criterion) {
    let fields = field_names(16);

    c.bench_function("make_ghost_refiners_16", |b| {
        b.iter(|| {
            let pool = ghost_pool(&fields);
            black_box(pool.len());
        });
    });
}

fn bench_create_ghost_schedules(c: &mut Criterion) {
    let fields = field_names(16);
    let hierarchy = MockHierarchy::uniform(4, 2, 8);
    let mut pool = ghost_pool(&fields);

    c.bench_function("create_ghost_schedules_16x4", |b| {
        b.iter(|| {
            for level in 0..4 {
                pool.create_ghost_schedules(&hierarchy, level).unwrap();
            }
        });
    });
}

fn bench_fill_lookup(c: &mut Criterion) {
    let fields = field_names(16);
    let hierarchy = MockHierarchy::uniform(4, 2, 8);
    let mut pool = ghost_pool(&fields);
    for level in 0..4 {
        pool.create_ghost_schedules(&hierarchy, level).unwrap();
    }
    let last = VecFieldDescriptor::new("F15");

    c.bench_function("fill_ghosts_lookup", |b| {
        b.iter(|| {
            pool.fill_vec_field_ghosts(black_box(&last), 3, 0.5).unwrap();
        });
    });
}

criterion_group!(
    benches,
    bench_make_ghost_refiners,
    bench_create_ghost_schedules,
    bench_fill_lookup
);
criterion_main!(benches);
