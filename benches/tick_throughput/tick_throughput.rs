use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use epigrid::prelude::*;

static SEED: u64 = 123;
static MAX_TICKS: usize = 100;

fn parameters(num_agents: usize, social_distance: usize) -> Parameters {
    Parameters {
        num_agents,
        num_traveling_agents: num_agents / 20,
        num_medic_agents: num_agents / 20,
        width: 50,
        height: 50,
        start_infection_rate: 0.05,
        social_distance,
        ..Parameters::default()
    }
}

fn build(parameters: Parameters) -> Context {
    let mut context = Context::new();
    context.init_random(SEED);
    context
        .init_simulation(parameters)
        .expect("benchmark parameters are valid");
    context
}

fn run(mut context: Context) -> Context {
    context.run_simulation(MAX_TICKS);
    context
}

pub fn criterion_benchmark(c: &mut Criterion) {
    c.bench_function("1000 agents, random movement", |bencher| {
        bencher.iter_batched(|| build(parameters(1000, 0)), run, BatchSize::LargeInput)
    });
    c.bench_function("1000 agents, social distance 3", |bencher| {
        bencher.iter_batched(|| build(parameters(1000, 3)), run, BatchSize::LargeInput)
    });
    c.bench_function("setup 1000 agents", |bencher| {
        bencher.iter_with_large_drop(|| build(parameters(1000, 0)))
    });
}

criterion_group!(tick_benches, criterion_benchmark);
criterion_main!(tick_benches);
