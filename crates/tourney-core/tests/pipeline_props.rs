use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tourney_core::{
    ChainExecution, EventKind, EventPayload, LogEntry, PipelineRunner, PipelineSettings,
    ScoreEvaluator,
};
use tourney_graph::VersionGraph;
use tourney_test_utils::{
    node_values, parent_positions, power_config, roster_with_silent_planner, scored_node,
    without_timestamps,
};

fn run(variants: u32, seed: u64, execution: ChainExecution) -> tourney_core::PipelineOutcome {
    PipelineRunner::new(power_config(variants, seed), seed)
        .with_settings(PipelineSettings::default().with_chain_execution(execution))
        .run()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_same_seed_same_run(seed in any::<u64>(), variants in 1u32..7) {
        let first = run(variants, seed, ChainExecution::Sequential);
        let second = run(variants, seed, ChainExecution::Sequential);
        prop_assert_eq!(without_timestamps(&first.graph), without_timestamps(&second.graph));
    }

    #[test]
    fn prop_pipeline_graph_is_acyclic(seed in any::<u64>(), variants in 1u32..9) {
        let outcome = run(variants, seed, ChainExecution::Sequential);
        let graph = &outcome.graph;
        prop_assert!(graph.is_acyclic());
        prop_assert_eq!(graph.roots().len(), 1);
        prop_assert_eq!(graph.edge_count(), graph.len() - 1);
        prop_assert_eq!(graph.len(), 1 + (variants as usize).min(3) + 2 * variants as usize);
    }

    #[test]
    fn prop_parallel_matches_sequential(seed in any::<u64>(), variants in 1u32..7) {
        let sequential = run(variants, seed, ChainExecution::Sequential);
        let parallel = run(variants, seed, ChainExecution::Parallel);

        prop_assert_eq!(node_values(&sequential.graph), node_values(&parallel.graph));
        prop_assert_eq!(parent_positions(&sequential.graph), parent_positions(&parallel.graph));
        prop_assert!(parallel.graph.is_acyclic());
    }

    #[test]
    fn prop_leaderboard_sorted_and_complete(seed in any::<u64>(), variants in 1u32..6) {
        let outcome = run(variants, seed, ChainExecution::Sequential);
        let board = ScoreEvaluator::new().evaluate(&outcome.graph);
        prop_assert_eq!(board.len(), outcome.graph.len());
        for pair in board.windows(2) {
            prop_assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn prop_events_never_precede_their_node(seed in any::<u64>(), variants in 1u32..5) {
        // Every log refers to a node contained in the next snapshot.
        let outcome = run(variants, seed, ChainExecution::Parallel);
        let mut pending: Vec<String> = Vec::new();
        for event in &outcome.events {
            match event {
                EventPayload::Log(LogEntry { version_id: Some(id), .. }) => pending.push(id.clone()),
                EventPayload::GraphUpdate(snapshot) => {
                    for id in pending.drain(..) {
                        prop_assert!(snapshot.node(&id).is_some(), "{} missing", id);
                    }
                }
                _ => {}
            }
        }
        prop_assert!(pending.is_empty());
    }
}

#[test]
fn stronger_node_ranks_first() {
    let mut graph = VersionGraph::new();
    graph.add_node(scored_node("weak", 0.4, 0.5, 600.0)).unwrap();
    graph.add_node(scored_node("strong", 0.9, 0.95, 200.0)).unwrap();

    let board = ScoreEvaluator::new().evaluate(&graph);
    assert_eq!(board[0].node_id, "strong");
    assert_eq!(board[1].node_id, "weak");
}

#[test]
fn snapshots_follow_each_variant() {
    let outcome = run(3, 10, ChainExecution::Sequential);
    let snapshots: Vec<usize> = outcome
        .events
        .iter()
        .filter_map(|e| match e {
            EventPayload::GraphUpdate(s) => Some(s.nodes.len()),
            _ => None,
        })
        .collect();
    // plan; + 3 architects; + coder and docs per variant
    assert_eq!(snapshots, vec![1, 4, 6, 8, 10]);
    assert_eq!(outcome.events.last().map(EventPayload::kind), Some(EventKind::Metric));
}

#[test]
fn empty_plan_leaves_architectures_parentless() {
    let runner = PipelineRunner::new(power_config(2, 13), 13);
    let agents = roster_with_silent_planner(runner.config(), runner.seed(), runner.settings());
    let outcome = runner.run_with(agents, None).unwrap();
    let graph = &outcome.graph;

    // 2 architects, 2 coders, 2 docs; no plan node
    assert_eq!(graph.len(), 6);
    assert!(!graph.nodes().iter().any(|n| n.id().starts_with("plan-")));
    let roots: Vec<&str> = graph.roots().iter().map(|n| n.id()).collect();
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|id| id.starts_with("arch-")));
    assert!(graph
        .nodes()
        .iter()
        .filter(|n| n.id().starts_with("arch-"))
        .all(|n| n.parent_id().is_none()));
    assert_eq!(graph.edge_count(), 4);
    assert!(graph.is_acyclic());

    let Some(EventPayload::GraphUpdate(first)) = outcome.events.first() else {
        panic!("first event is not a snapshot");
    };
    assert!(first.nodes.is_empty());
}
