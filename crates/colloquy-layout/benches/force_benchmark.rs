//! Benchmarks for layout engines
//!
//! Run with: cargo bench -p colloquy-layout

use std::collections::BTreeMap;

use colloquy_core::{Argument, ArgumentId, ArgumentKind};
use colloquy_layout::{ArgumentGraph, ConsensusLayoutEngine, ForceConfig, ForceSimulation};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// A fan of claims, each backed by three supporting arguments
fn generate_arguments(claims: usize) -> (Vec<ArgumentId>, BTreeMap<ArgumentId, Argument>) {
    let mut primary = Vec::new();
    let mut arguments = BTreeMap::new();
    for i in 0..claims {
        let mut claim = Argument::new(&format!("claim-{}", i), ArgumentKind::Claim, "Claim");
        for j in 0..3 {
            let id = format!("support-{}-{}", i, j);
            claim = claim.supporting(&id);
            arguments.insert(id.clone(), Argument::new(&id, ArgumentKind::Supporting, "Support"));
        }
        primary.push(claim.id.clone());
        arguments.insert(claim.id.clone(), claim);
    }
    (primary, arguments)
}

fn bench_convergence(c: &mut Criterion) {
    let mut group = c.benchmark_group("ForceSimulation::run_to_convergence");

    for claims in [2, 5, 10, 25].iter() {
        let (primary, arguments) = generate_arguments(*claims);
        let graph = ArgumentGraph::for_stage(&primary, &arguments);
        group.bench_with_input(BenchmarkId::from_parameter(claims), &graph, |b, graph| {
            b.iter(|| {
                let mut sim = ForceSimulation::new(black_box(graph), ForceConfig::default());
                black_box(sim.run_to_convergence())
            })
        });
    }
    group.finish();
}

fn bench_single_tick(c: &mut Criterion) {
    let (primary, arguments) = generate_arguments(10);
    let graph = ArgumentGraph::for_stage(&primary, &arguments);
    let mut sim = ForceSimulation::new(&graph, ForceConfig::default());

    c.bench_function("ForceSimulation::tick", |b| {
        b.iter(|| {
            // Keep the simulation hot so every iteration does real work
            sim.pin("claim-0", 400.0, 300.0);
            black_box(sim.tick())
        })
    });
}

fn bench_consensus(c: &mut Criterion) {
    let (_, arguments) = generate_arguments(50);
    let experts: Vec<String> = ["technologist", "ethicist", "economist", "legal"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let arguments: Vec<Argument> = arguments
        .into_values()
        .enumerate()
        .map(|(i, a)| {
            a.with_agreement(if i % 2 == 0 { 0.9 } else { 0.1 })
                .endorsed_by(&["technologist", "ethicist"])
        })
        .collect();
    let engine = ConsensusLayoutEngine::default();

    c.bench_function("ConsensusLayoutEngine::layout", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(42);
            black_box(engine.layout_with_rng(&experts, &arguments, &mut rng))
        })
    });
}

criterion_group!(benches, bench_convergence, bench_single_tick, bench_consensus);
criterion_main!(benches);
