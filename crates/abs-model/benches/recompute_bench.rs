//! Benchmarks for the recompute path.
//!
//! Run with: `cargo bench --package abs-model --bench recompute_bench`
//!
//! Every slider tick goes through `set_concentration`, which stages and
//! publishes up to eight cells. These benches keep that cost visible, with
//! and without a realistic number of listeners attached.

use std::hint::black_box;
use std::rc::Rc;

use abs_model::{AbsConfig, AqueousSolution, SolutionKind, SolutionRegistry, bar_reading};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

fn slider_sweep() -> Vec<f64> {
    (0..200).map(|i| 10f64.powf(-3.0 + 3.0 * f64::from(i) / 199.0)).collect()
}

fn bench_set_concentration(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_concentration");
    let sweep = slider_sweep();
    for kind in SolutionKind::ALL {
        let solution = AqueousSolution::new(kind, Rc::new(AbsConfig::default()));
        group.bench_with_input(BenchmarkId::from_parameter(kind), &sweep, |b, sweep| {
            b.iter(|| {
                for &value in sweep {
                    solution.set_concentration(black_box(value)).ok();
                }
            });
        });
    }
    group.finish();
}

fn bench_with_listeners(c: &mut Criterion) {
    let sweep = slider_sweep();
    let registry = SolutionRegistry::custom_solution(Rc::new(AbsConfig::default()));
    let solution = registry.active_solution();
    let _subs: Vec<_> = [solution.solute(), solution.product(), solution.h3o(), solution.oh()]
        .into_iter()
        .map(|cell| {
            cell.subscribe(|value, _| {
                black_box(bar_reading(*value, 100.0));
            })
        })
        .collect();

    c.bench_function("registry_sweep_with_bars", |b| {
        b.iter(|| {
            for &value in &sweep {
                registry.set_concentration(black_box(value)).ok();
            }
        });
    });
}

criterion_group!(benches, bench_set_concentration, bench_with_listeners);
criterion_main!(benches);
