use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use ixa_lattice::fractal::{estimate_dimension, DEFAULT_BOX_SIZES};
use ixa_lattice::{EpidemicAutomaton, ParametersBuilder};

static GRID_SIZE: usize = 100;
static SEED: u64 = 123;
static INITIAL_INFECTED: usize = 50;

fn seeded_automaton() -> EpidemicAutomaton {
    let parameters = ParametersBuilder::default()
        .grid_size(GRID_SIZE)
        .random_seed(SEED)
        .build()
        .expect("benchmark parameters are valid");
    let mut automaton = EpidemicAutomaton::new(&parameters).expect("failed to build automaton");
    automaton
        .initialize_random_infection(INITIAL_INFECTED)
        .expect("failed to seed infection");
    // Let the outbreak grow so steps have work to do.
    for _ in 0..10 {
        automaton.step();
    }
    automaton
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("step 100x100", |bencher| {
        bencher.iter_batched(
            seeded_automaton,
            |mut automaton| {
                automaton.step();
                automaton
            },
            BatchSize::LargeInput,
        );
    });

    let grid = seeded_automaton().snapshot();
    c.bench_function("box counting 100x100", |bencher| {
        bencher.iter(|| estimate_dimension(black_box(&grid), &DEFAULT_BOX_SIZES));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
