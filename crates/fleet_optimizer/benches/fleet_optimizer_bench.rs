use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use fleet_optimizer::{
    builders::{energy_model::EnergyModel, routing_model::RoutingModel},
    problem::generator::{GeneratorParams, generate_instance},
    solver::{
        branch_and_bound::BranchAndBound,
        engine::SolverEngine,
        solve_params::{SolveParams, Termination, Threads},
    },
};

fn model_construction_benchmark(c: &mut Criterion) {
    let instance = generate_instance(&GeneratorParams {
        num_customers: 6,
        num_vehicles: 2,
        num_periods: 2,
        seed: 7,
        with_energy: true,
        ..GeneratorParams::default()
    })
    .unwrap();

    c.bench_function("build routing model (single thread)", |b| {
        b.iter(|| RoutingModel::build(black_box(&instance), &Threads::Single))
    });

    c.bench_function("build routing model (rayon)", |b| {
        b.iter(|| RoutingModel::build(black_box(&instance), &Threads::Auto))
    });

    c.bench_function("build energy model", |b| {
        b.iter(|| EnergyModel::build(black_box(&instance), &Threads::Single))
    });
}

fn root_relaxation_benchmark(c: &mut Criterion) {
    let instance = generate_instance(&GeneratorParams {
        num_customers: 6,
        num_vehicles: 2,
        num_periods: 2,
        seed: 7,
        ..GeneratorParams::default()
    })
    .unwrap();
    let routing = RoutingModel::build(&instance, &Threads::Single);
    let params = SolveParams::with_terminations(vec![Termination::Nodes(1)]);

    c.bench_function("routing root node", |b| {
        b.iter(|| BranchAndBound.solve(black_box(routing.model()), &params))
    });
}

criterion_group!(
    benches,
    model_construction_benchmark,
    root_relaxation_benchmark
);
criterion_main!(benches);
