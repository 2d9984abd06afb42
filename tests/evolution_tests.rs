use heurigen::config::{FitnessParams, ModelParams};
use heurigen::evolution::checkpoint::{read_checkpoint, write_checkpoint};
use heurigen::evolution::{
    seeds, Admission, Checkpoint, CheckpointStore, DerivationNode, EvaluationContext, Model,
    Population, SearchConfiguration, Searcher, Solution, Symbol, MIN_CAPACITY,
};
use heurigen::heuristics::{MaxDegreeHeuristic, TssHeuristic};
use heurigen::network::generators::{ErdosRenyi, GraphGenerator};
use heurigen::network::Graph;
use proptest::prelude::*;
use rstest::rstest;
use std::collections::BTreeSet;
use std::sync::Arc;

fn solution(tree: DerivationNode) -> Arc<Solution> {
    Arc::new(Solution::from_tree(tree).unwrap())
}

fn seeded_population() -> Population {
    let mut population = Population::new(8);
    for (i, seed) in seeds::seed_solutions().unwrap().into_iter().enumerate() {
        population.try_add(seed, vec![i], i as f64);
    }
    population
}

fn idle_context<'a>(
    graph: &'a Graph,
    active: &'a [usize],
) -> EvaluationContext<'a> {
    EvaluationContext {
        active_neighbor_counts: active,
        degrees: graph.degrees(),
        thresholds: graph.thresholds(),
        neighbors: graph.adjacency(),
        inactive_neighbors: graph.adjacency(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_sampled_programs_are_valid(
        seed in any::<u64>(),
        max_depth in 2usize..8,
        mixture in 0.0..=1.0f64,
        with_population in any::<bool>(),
    ) {
        let params = ModelParams {
            max_depth,
            tournament_size: 3,
            mixture_weight_for_rules: mixture,
        };
        let mut model = Model::new(&params).unwrap();
        let population = seeded_population();
        for s in population.solutions() {
            model.solution_accepted(s);
        }

        let mut rng = fastrand::Rng::with_seed(seed);
        for _ in 0..20 {
            let tree = model.sample(&mut rng, with_population.then_some(&population));
            prop_assert!(Model::is_valid_program(&tree));
            let compiled = Solution::from_tree(tree);
            prop_assert!(compiled.is_ok(), "{:?}", compiled.err());
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_sampled_grafts_survive_checkpoint_round_trip(seed in any::<u64>()) {
        let params = ModelParams {
            max_depth: 6,
            tournament_size: 2,
            mixture_weight_for_rules: 0.0,
        };
        let model = Model::new(&params).unwrap();
        let population = seeded_population();
        let mut rng = fastrand::Rng::with_seed(seed);

        let mut solutions = population.snapshot();
        for _ in 0..10 {
            let tree = model.sample(&mut rng, Some(&population));
            solutions.push(Arc::new(Solution::from_tree(tree).unwrap()));
        }
        let checkpoint = Checkpoint { iteration: 7, solutions };

        let mut buffer = Vec::new();
        write_checkpoint(&mut buffer, &checkpoint).unwrap();
        let restored = read_checkpoint(buffer.as_slice()).unwrap();
        prop_assert_eq!(restored.solutions.len(), checkpoint.solutions.len());
        for (before, after) in checkpoint.solutions.iter().zip(&restored.solutions) {
            prop_assert_eq!(before.root().as_ref(), after.root().as_ref());
            prop_assert_eq!(before.to_string(), after.to_string());
        }
    }
}

#[test]
fn test_degree_program_matches_max_degree() {
    let graph = Graph::from_edges(4, [(0, 1), (0, 2), (0, 3)]);
    let degree = solution(seeds::degree_heuristic());

    let active = vec![0; 4];
    let ctx = idle_context(&graph, &active);
    assert_eq!(degree.score(0, &ctx), 3.0);
    assert!((1..4).all(|v| degree.score(v, &ctx) < degree.score(0, &ctx)));

    let evolved = degree.find_target_set(&graph);
    assert_eq!(evolved, BTreeSet::from([0]));
    assert_eq!(evolved, MaxDegreeHeuristic.find_target_set(&graph));
}

#[test]
fn test_evolved_program_scores() {
    let graph = Graph::from_edges(3, [(0, 1), (1, 2)]);
    let active = vec![0; 3];
    let ctx = idle_context(&graph, &active);
    let evolved = solution(seeds::evolved_heuristic());
    // deficit 1 plus one ratio of 1 per inactive neighbor.
    assert_eq!(evolved.score(1, &ctx), 3.0);
    // deficit 1 plus neighbor 1's ratio 2 / 1.
    assert_eq!(evolved.score(0, &ctx), 3.0);
}

#[test]
fn test_target_sets_activate_the_graph() {
    let mut rng = fastrand::Rng::with_seed(21);
    let graph = ErdosRenyi::new(120, 0.04).sample(&mut rng);
    for seed in seeds::seed_solutions().unwrap() {
        let target_set = seed.find_target_set(&graph);
        assert!(graph.is_target_set(target_set.iter().copied()), "{}", seed);
    }
    let evolved = solution(seeds::evolved_heuristic());
    assert!(graph.is_target_set(evolved.find_target_set(&graph)));
}

#[test]
fn test_isolated_nodes_are_seeded_first() {
    let graph = Graph::from_edges(4, [(0, 1)]);
    let target_set = solution(seeds::threshold_heuristic()).find_target_set(&graph);
    assert!(target_set.contains(&2) && target_set.contains(&3));
    assert_eq!(target_set.len(), 3);
}

#[rstest]
#[case::higher_fitness_replaces(2.0, true)]
#[case::equal_fitness_longer_program_rejected(1.0, false)]
#[case::lower_fitness_rejected(0.5, false)]
fn test_duplicate_cost_vector_competes_with_occupant(#[case] fitness: f64, #[case] replaces: bool) {
    let mut population = Population::new(MIN_CAPACITY);
    let occupant = solution(seeds::degree_heuristic());
    assert!(matches!(
        population.try_add(occupant.clone(), vec![4, 4], 1.0),
        Admission::Inserted
    ));
    assert!(matches!(
        population.try_add(solution(seeds::threshold_heuristic()), vec![5, 5], 3.0),
        Admission::Inserted
    ));

    let candidate = solution(seeds::evolved_heuristic());
    assert!(candidate.program_length() > occupant.program_length());
    match population.try_add(candidate.clone(), vec![4, 4], fitness) {
        Admission::Replaced { ejected, cost_vector, fitness: old } => {
            assert!(replaces);
            assert!(Arc::ptr_eq(&ejected, &occupant));
            assert_eq!(cost_vector, vec![4, 4]);
            assert_eq!(old, 1.0);
        }
        Admission::Rejected => assert!(!replaces),
        Admission::Inserted => panic!("duplicate cost vector took a new slot"),
    }
    assert_eq!(population.len(), 2);
    let holder = if replaces { &candidate } else { &occupant };
    assert!(population.solutions().iter().any(|s| Arc::ptr_eq(s, holder)));
}

#[test]
fn test_full_population_evicts_worst() {
    let mut population = Population::new(MIN_CAPACITY);
    let weak = solution(seeds::degree_heuristic());
    population.try_add(weak.clone(), vec![0], 0.5);
    for i in 1..MIN_CAPACITY {
        population.try_add(solution(seeds::threshold_heuristic()), vec![i], 2.0);
    }
    assert_eq!(population.len(), MIN_CAPACITY);

    let admission = population.try_add(solution(seeds::deficit_heuristic()), vec![100], 1.0);
    match admission {
        Admission::Replaced { ejected, .. } => assert!(Arc::ptr_eq(&ejected, &weak)),
        other => panic!("expected a replacement, got {:?}", other),
    }
    assert!(!population
        .try_add(solution(seeds::degree_heuristic()), vec![101], 0.1)
        .is_accepted());
    assert_eq!(population.len(), MIN_CAPACITY);
    assert_eq!(population.best().map(|(_, f)| f), Some(2.0));
    assert_eq!(population.average_fitness(), 1.875);
}

#[rstest]
#[case(0, MIN_CAPACITY)]
#[case(2, MIN_CAPACITY)]
#[case(64, 64)]
fn test_population_capacity_has_a_floor(#[case] requested: usize, #[case] expected: usize) {
    assert_eq!(Population::new(requested).capacity(), expected);
}

#[test]
fn test_reinforcement_is_reversible() {
    let mut model = Model::new(&ModelParams::default()).unwrap();
    let degree = solution(seeds::degree_heuristic());
    model.solution_accepted(&degree);
    assert_eq!(model.rule_weights()[0][2], 1.0);
    assert_eq!(model.rule_weights()[1][30], 1.0);
    model.solution_ejected(&degree);
    assert!(model.rule_weights().iter().flatten().all(|&w| w == 0.0));
}

fn grafted_checkpoint() -> Checkpoint {
    let donor = solution(seeds::evolved_heuristic());
    let host = DerivationNode::expand(
        Symbol::Expression,
        4,
        vec![
            DerivationNode::expand(
                Symbol::BinaryOperation,
                17,
                vec![DerivationNode::terminal(Symbol::Multiply)],
            ),
            DerivationNode::expand(
                Symbol::Expression,
                0,
                vec![DerivationNode::graft(54, donor.root().clone())],
            ),
            seeds::degree_heuristic(),
        ],
    );
    let host = solution(host);
    assert!(host
        .nodes()
        .iter()
        .any(|node| node.symbol == Symbol::SamplePopulation));
    let mut solutions = seeds::seed_solutions().unwrap();
    solutions.push(donor);
    solutions.push(host);
    Checkpoint {
        iteration: 42,
        solutions,
    }
}

#[test]
fn test_checkpoint_round_trip_preserves_trees_and_rendering() {
    let checkpoint = grafted_checkpoint();
    let mut buffer = Vec::new();
    write_checkpoint(&mut buffer, &checkpoint).unwrap();
    let restored = read_checkpoint(buffer.as_slice()).unwrap();

    assert_eq!(restored.iteration, 42);
    assert_eq!(restored.solutions.len(), checkpoint.solutions.len());
    for (before, after) in checkpoint.solutions.iter().zip(&restored.solutions) {
        assert_eq!(before.nodes(), after.nodes());
        assert_eq!(before.root().as_ref(), after.root().as_ref());
        assert_eq!(before.to_string(), after.to_string());
        assert_eq!(before.program_length(), after.program_length());
    }
}

#[test]
fn test_checkpoint_store_replaces_atomically() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("run")).unwrap();
    assert!(store.load().unwrap().is_none());

    store.save(&Checkpoint::seed().unwrap()).unwrap();
    store.save(&grafted_checkpoint()).unwrap();
    let loaded = store.load().unwrap().unwrap();
    assert_eq!(loaded.iteration, 42);

    let files: Vec<_> = std::fs::read_dir(dir.path().join("run")).unwrap().collect();
    assert_eq!(files.len(), 1);

    assert!(store.delete().unwrap());
    assert!(!store.delete().unwrap());
}

#[test]
fn test_corrupt_checkpoint_is_rejected() {
    let json = r#"{"iteration": 1, "solutions": [[{"symbol": -1, "rule": 40, "children": 1},
        {"symbol": 24, "rule": -1, "children": 0}]]}"#;
    assert!(read_checkpoint(json.as_bytes()).is_err());
}

#[test]
fn test_search_segment_emits_periodic_checkpoints() {
    let mut rng = fastrand::Rng::with_seed(99);
    let graphs: Vec<Graph> = [0.05, 0.1]
        .iter()
        .map(|&p| ErdosRenyi::new(60, p).sample(&mut rng))
        .collect();
    let baseline = heurigen::benchmark::baseline_costs(&graphs);

    let params = ModelParams {
        max_depth: 4,
        ..ModelParams::default()
    };
    let mut searcher = Searcher::new(
        Model::new(&params).unwrap(),
        graphs,
        baseline,
        6,
        FitnessParams::default(),
    )
    .unwrap();

    let seeds = seeds::seed_solutions().unwrap();
    let config = SearchConfiguration {
        solutions: &seeds,
        starting_iteration: 1,
        ending_iteration: 20,
        checkpoint_period: 5,
    };
    let mut seen = Vec::new();
    let mut callback = |population: &Population, checkpoint: &Checkpoint| {
        assert!(population.len() <= 6);
        seen.push(checkpoint.iteration);
    };
    let last = searcher.start(&mut rng, &config, &mut callback).unwrap();

    assert_eq!(seen, vec![5, 10, 15, 20, 20]);
    assert_eq!(last.iteration, 20);
    assert!(!last.solutions.is_empty());
    let distinct: BTreeSet<&Vec<usize>> = searcher.population().cost_vectors().iter().collect();
    assert_eq!(distinct.len(), searcher.population().len());
}

#[test]
fn test_searcher_requires_matching_baseline() {
    let graphs = vec![Graph::from_edges(2, [(0, 1)])];
    let model = Model::new(&ModelParams::default()).unwrap();
    assert!(Searcher::new(model.clone(), graphs.clone(), vec![], 4, FitnessParams::default()).is_err());
    assert!(Searcher::new(model, vec![], vec![], 4, FitnessParams::default()).is_err());
}
