use criterion::{criterion_group, criterion_main, Criterion};
use heurigen::evolution::{seeds, Model, Solution};
use heurigen::config::ModelParams;
use heurigen::heuristics::{
    baseline_cost, CgmrvTssHeuristic, MaxDegreeHeuristic, TipDecompHeuristic, TssHeuristic,
};
use heurigen::network::generators::{ChungLu, ErdosRenyi, GraphGenerator};
use heurigen::network::Graph;
use std::hint::black_box;

fn setup_graphs() -> (Graph, Graph) {
    let mut rng = fastrand::Rng::with_seed(42);
    let er = ErdosRenyi::new(1000, 0.01).sample(&mut rng);
    let cl = ChungLu::new(1000, 5, 100, -2.0)
        .expect("valid parameters")
        .sample(&mut rng);
    (er, cl)
}

fn criterion_benchmark(c: &mut Criterion) {
    let (er, cl) = setup_graphs();
    let evolved = Solution::from_tree(seeds::evolved_heuristic()).expect("valid seed");
    let degree = Solution::from_tree(seeds::degree_heuristic()).expect("valid seed");

    c.bench_function("evaluate_on evolved (ER 1k)", |b| {
        b.iter(|| evolved.evaluate_on(black_box(&er)))
    });
    c.bench_function("evaluate_on evolved (Chung-Lu 1k)", |b| {
        b.iter(|| evolved.evaluate_on(black_box(&cl)))
    });
    c.bench_function("evaluate_on degree (ER 1k)", |b| {
        b.iter(|| degree.evaluate_on(black_box(&er)))
    });

    c.bench_function("MDG (ER 1k)", |b| {
        b.iter(|| MaxDegreeHeuristic.find_target_set(black_box(&er)))
    });
    c.bench_function("TIP_DECOMP (ER 1k)", |b| {
        b.iter(|| TipDecompHeuristic.find_target_set(black_box(&er)))
    });
    c.bench_function("C-TSS (ER 1k)", |b| {
        b.iter(|| CgmrvTssHeuristic.find_target_set(black_box(&er)))
    });
    c.bench_function("baseline_cost (ER 1k)", |b| {
        b.iter(|| baseline_cost(black_box(&er)))
    });

    let model = Model::new(&ModelParams::default()).expect("valid parameters");
    let mut rng = fastrand::Rng::with_seed(7);
    c.bench_function("sample + compile", |b| {
        b.iter(|| Solution::from_tree(model.sample(&mut rng, None)))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
