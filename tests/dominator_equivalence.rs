//! Algorithmic equivalence property (spec §8): for any graph producible by
//! the build interface, Lengauer-Tarjan and the Parallel Level-Based
//! algorithm must agree on every `idom` entry. Exercised by random-graph
//! fuzzing rather than a fixed handful of cases, per spec's "hundreds of
//! nodes, a few thousand edges, random root set".

#![cfg(feature = "parallel")]

use heapgraph::cancel::CancellationToken;
use heapgraph::classes::NO_SUPERCLASS;
use heapgraph::config::DominatorAlgorithmThresholds;
use heapgraph::dominators::{compute_lt, compute_plb};
use heapgraph::ids::ClassId;
use heapgraph::roots::RootKind;
use heapgraph::{ObjectId, ReferenceGraph};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn build_random_graph(node_count: usize, edge_count: usize, root_count: usize, seed: u64) -> ReferenceGraph {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut g = ReferenceGraph::new();
    g.add_class(ClassId(1), "C", NO_SUPERCLASS, vec![], vec![]).unwrap();
    for id in 1..=node_count as u64 {
        g.add_object(ObjectId(id), ClassId(1), 1).unwrap();
    }
    for i in 0..edge_count {
        let from = rng.gen_range(1..=node_count as u64);
        let to = rng.gen_range(1..=node_count as u64);
        g.add_edge(ObjectId(from), ObjectId(to), &format!("e{i}")).unwrap();
    }
    let mut chosen_roots = std::collections::HashSet::new();
    while chosen_roots.len() < root_count.min(node_count) {
        chosen_roots.insert(rng.gen_range(1..=node_count as u64));
    }
    for root in chosen_roots {
        g.add_gc_root(ObjectId(root), RootKind::StickyClass, None, None).unwrap();
    }
    g.finalize().unwrap();
    g
}

#[test]
fn lt_and_plb_agree_on_random_graphs() {
    let cancel = CancellationToken::new();
    let thresholds = DominatorAlgorithmThresholds::default();

    for seed in 0..20u64 {
        let node_count = 50 + (seed as usize) * 15;
        let edge_count = node_count * 4;
        let root_count = 1 + (seed as usize % 5);
        let g = build_random_graph(node_count, edge_count, root_count, seed);

        let mut lt = compute_lt(&g, &cancel).unwrap();
        let mut plb = compute_plb(&g, thresholds, &cancel).unwrap();
        lt.sort_by_key(|(i, _)| i.index());
        plb.sort_by_key(|(i, _)| i.index());

        assert_eq!(lt, plb, "LT and PLB disagreed for seed {seed}");
    }
}

#[test]
fn lt_and_plb_agree_with_no_roots() {
    let cancel = CancellationToken::new();
    let g = build_random_graph(30, 60, 0, 42);
    let mut lt = compute_lt(&g, &cancel).unwrap();
    let mut plb = compute_plb(&g, DominatorAlgorithmThresholds::default(), &cancel).unwrap();
    lt.sort_by_key(|(i, _)| i.index());
    plb.sort_by_key(|(i, _)| i.index());
    assert_eq!(lt, plb);
}
