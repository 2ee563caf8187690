//! Scenario, property and precondition tests for the max-flow engine.
//!
//! Random instances use integral weights, so flows and cut costs are exact and
//! compared with `==`.

use super::types::{EdgeId, Parent};
use super::*;
use crate::instance::Instance;
use crate::rand::{
    draw_dense, draw_lattice, draw_perturbation, Connectivity, DenseCfg, LatticeCfg, PerturbCfg,
    ReplayToken,
};
use proptest::prelude::*;

use super::Terminal::{Background as B, Foreground as F};

fn solve(inst: &Instance) -> (f32, Vec<Terminal>) {
    let mut g = inst.build();
    let flow = g.compute_maximum_flow(false, None);
    (flow, g.labels())
}

fn pair_sums(g: &GraphCut) -> Vec<f32> {
    g.edge_residuals().iter().map(|&(f, r)| f + r).collect()
}

/// Five nodes in a row, source pull at both 0 and 2, sink pull at 4.
fn chain5() -> Instance {
    let mut inst = Instance::new(5);
    inst.add_terminal(0, 10.0, 0.0);
    inst.add_terminal(2, 5.0, 0.0);
    inst.add_terminal(4, 0.0, 10.0);
    for i in 0..4 {
        inst.add_edge(i, i + 1, 1.0, 1.0);
    }
    inst
}

#[test]
fn scenario_disconnected_pulls() {
    let mut g = GraphCut::new(2, 0);
    g.set_terminal_weights(0, 5.0, 0.0);
    g.set_terminal_weights(1, 0.0, 5.0);
    assert_eq!(g.compute_maximum_flow(false, None), 0.0);
    assert_eq!(g.terminal(0), F);
    assert_eq!(g.terminal(1), B);
    assert_eq!(g.stats().augmentations, 0);
}

#[test]
fn scenario_edge_is_the_bottleneck() {
    let mut g = GraphCut::new(2, 1);
    g.set_edge_weight(0, 1, 3.0);
    g.set_terminal_weights(0, 10.0, 0.0);
    g.set_terminal_weights(1, 0.0, 10.0);
    assert_eq!(g.compute_maximum_flow(false, None), 3.0);
    assert_eq!(g.terminal(0), F);
    assert_eq!(g.terminal(1), B);
    assert_eq!(g.edge_residuals(), vec![(0.0, 6.0)]);
    assert_eq!(g.residual_capacity(0), 7.0);
    assert_eq!(g.residual_capacity(1), -7.0);
}

#[test]
fn scenario_flip_in_chain_with_reuse() {
    let mut inst = chain5();
    let mut g = inst.build();
    let mut changed = Vec::new();
    assert_eq!(g.compute_maximum_flow(false, Some(&mut changed)), 1.0);
    assert_eq!(g.terminal(0), F);
    assert_eq!(g.terminal(2), F);
    assert_eq!(g.terminal(4), B);

    g.set_terminal_weights(2, 0.0, 20.0);
    inst.add_terminal(2, 0.0, 20.0);
    g.mark_node(2);
    let flow = g.compute_maximum_flow(true, Some(&mut changed));

    assert!(g.stats().reused);
    assert!(changed.contains(&2), "changed = {changed:?}");
    assert_eq!(g.terminal(2), B);
    assert_eq!(g.terminal(0), F);
    assert_eq!(g.terminal(4), B);
    assert_eq!(flow, 6.0);
    assert_eq!(f64::from(flow), inst.brute_force_min_cut());

    // reuse solves keep reporting nodes changed since the last fresh solve
    assert_eq!(g.compute_maximum_flow(true, Some(&mut changed)), 6.0);
    assert_eq!(g.stats().growth_steps, 0);
    assert!(changed.contains(&2), "changed = {changed:?}");

    g.compute_maximum_flow(false, Some(&mut changed));
    assert!(!changed.contains(&2), "changed = {changed:?}");
}

#[test]
fn reuse_orphans_seed_whose_pull_cancels() {
    let mut inst = chain5();
    let mut g = inst.build();
    assert_eq!(g.compute_maximum_flow(false, None), 1.0);
    // the unit pushed 2 -> 3 -> 4 left node 2 with a residual pull of 4;
    // node 1 hangs off it
    assert_eq!(g.residual_capacity(2), 4.0);
    assert_eq!(g.nodes[2].parent, Parent::Terminal);

    g.set_terminal_weights(2, 0.0, 4.0);
    inst.add_terminal(2, 0.0, 4.0);
    assert_eq!(g.residual_capacity(2), 0.0);
    g.mark_node(2);
    let flow = g.compute_maximum_flow(true, None);

    let (fresh_flow, fresh_labels) = solve(&inst);
    assert_eq!(flow, 5.0);
    assert_eq!(flow, fresh_flow);
    // 2 is freed, its child 1 re-attaches to 0, then 2 regrows from 1
    assert_eq!(g.stats().orphans_freed, 1);
    assert_eq!(g.stats().orphans_adopted, 1);
    assert_eq!(g.nodes[2].parent, Parent::Edge(EdgeId(3)));
    assert_eq!(g.terminal(2), F);
    assert_eq!(g.labels(), fresh_labels);
}

#[test]
fn reuse_leaves_free_seed_without_pull_alone() {
    let mut g = chain5().build();
    assert_eq!(g.compute_maximum_flow(false, None), 1.0);
    assert!(g.nodes[3].parent.is_free());

    g.mark_node(3);
    assert_eq!(g.compute_maximum_flow(true, None), 1.0);
    assert!(g.nodes[3].parent.is_free());
    assert_eq!(g.stats().growth_steps, 0);
    assert_eq!(g.stats().orphans_adopted + g.stats().orphans_freed, 0);
    assert_eq!(g.terminal(3), B);
}

#[test]
fn reuse_does_not_orphan_marked_neighbours() {
    let mut inst = chain5();
    let mut g = inst.build();
    assert_eq!(g.compute_maximum_flow(false, None), 1.0);
    // growth from root 2 took node 1 over from root 0
    assert_eq!(g.nodes[1].parent, Parent::Edge(EdgeId(2)));
    assert_eq!(g.edges[2].head, 2);

    for node in [2, 1] {
        g.set_terminal_weights(node, 0.0, 20.0);
        inst.add_terminal(node, 0.0, 20.0);
        g.mark_node(node);
    }
    let flow = g.compute_maximum_flow(true, None);

    let (fresh_flow, fresh_labels) = solve(&inst);
    assert_eq!(flow, 6.0);
    assert_eq!(flow, fresh_flow);
    assert_eq!(g.nodes[1].parent, Parent::Terminal);
    assert_eq!(g.nodes[2].parent, Parent::Terminal);
    assert_eq!(g.stats().orphans_adopted + g.stats().orphans_freed, 0);
    assert_eq!(g.labels(), vec![F, B, B, B, B]);
    assert_eq!(g.labels(), fresh_labels);
}

#[test]
fn time_counter_wraps_across_reuse_solves() {
    let mut g = chain5().build();
    assert_eq!(g.compute_maximum_flow(false, None), 1.0);
    g.time = u32::MAX;
    for node in [2, 1] {
        g.set_terminal_weights(node, 0.0, 20.0);
        g.mark_node(node);
    }
    assert_eq!(g.compute_maximum_flow(true, None), 6.0);
    assert!(g.time < 16, "time = {}", g.time);
    assert_eq!(g.labels(), vec![F, B, B, B, B]);
}

#[test]
fn terminal_weights_fold_into_flow() {
    let mut g = GraphCut::new(1, 0);
    g.set_terminal_weights(0, 3.0, 5.0);
    assert_eq!(g.total_flow(), 3.0);
    assert_eq!(g.residual_capacity(0), -2.0);
    g.set_terminal_weights(0, 4.0, 1.0);
    assert_eq!(g.total_flow(), 6.0);
    assert_eq!(g.residual_capacity(0), 1.0);
    assert_eq!(g.compute_maximum_flow(false, None), 6.0);
    assert_eq!(g.terminal(0), F);
}

#[test]
fn never_attached_nodes_are_background() {
    let mut g = GraphCut::new(3, 1);
    g.set_edge_weight(1, 2, 4.0);
    assert_eq!(g.terminal(0), B);
    g.compute_maximum_flow(false, None);
    assert_eq!(g.labels(), vec![B, B, B]);
}

#[test]
fn adjacency_lists_scan_newest_first() {
    let mut g = GraphCut::new(3, 2);
    g.set_edge_weight(0, 1, 1.0);
    g.set_edge_weight(0, 2, 1.0);
    assert_eq!(g.nodes[0].first, Some(EdgeId(2)));
    assert_eq!(g.edges[2].next, Some(EdgeId(0)));
    assert_eq!(g.edges[0].next, None);
    assert_eq!(g.edges[2].head, 2);
    assert_eq!(g.edges[3].head, 0);
    assert_eq!(EdgeId(3).sister(), EdgeId(2));
}

#[test]
fn growth_attaches_free_nodes_through_reverse_arcs() {
    // 0 (source) - 1 (free), no sink: 1 joins the source tree
    let mut g = GraphCut::new(2, 1);
    g.set_terminal_weights(0, 2.0, 0.0);
    g.set_edge_weight(0, 1, 1.0);
    let mut changed = Vec::new();
    g.compute_maximum_flow(false, Some(&mut changed));
    assert_eq!(g.nodes[1].parent, Parent::Edge(EdgeId(1)));
    assert_eq!(g.nodes[1].distance, 2);
    assert_eq!(g.terminal(1), F);
    assert_eq!(changed, vec![1]);
}

#[test]
fn mark_node_queues_once() {
    let mut g = GraphCut::new(2, 0);
    g.mark_node(1);
    g.mark_node(1);
    assert_eq!(g.queues[1].len(), 1);
    assert!(g.nodes[1].marked);
}

#[test]
fn reuse_is_ignored_on_first_solve() {
    let mut g = chain5().build();
    assert_eq!(g.compute_maximum_flow(true, None), 1.0);
    assert!(!g.stats().reused);
    assert_eq!(g.solves(), 1);
}

#[test]
fn reuse_without_marks_does_no_work() {
    let inst = draw_lattice(LatticeCfg::default(), ReplayToken::new(11, 0)).unwrap();
    let mut g = inst.build();
    let mut fresh_changed = Vec::new();
    let flow = g.compute_maximum_flow(false, Some(&mut fresh_changed));
    let labels = g.labels();
    let mut changed = vec![usize::MAX];
    assert_eq!(g.compute_maximum_flow(true, Some(&mut changed)), flow);
    assert_eq!(g.stats().augmentations, 0);
    assert_eq!(g.stats().growth_steps, 0);
    assert_eq!(changed, fresh_changed);
    assert_eq!(g.labels(), labels);
}

#[test]
fn lattice_solves_match_cut_cost() {
    for connectivity in [Connectivity::Four, Connectivity::Eight] {
        let cfg = LatticeCfg {
            width: 12,
            height: 9,
            connectivity,
            ..LatticeCfg::default()
        };
        let inst = draw_lattice(cfg, ReplayToken::new(2, 5)).unwrap();
        let (flow, labels) = solve(&inst);
        assert_eq!(f64::from(flow), inst.cut_cost(&labels));
    }
}

#[test]
#[should_panic(expected = "at least one node")]
fn zero_nodes_rejected() {
    GraphCut::new(0, 4);
}

#[test]
#[should_panic(expected = "self loop")]
fn self_loop_rejected() {
    GraphCut::new(2, 1).set_edge_weight(1, 1, 1.0);
}

#[test]
#[should_panic(expected = "negative edge weight")]
fn negative_weight_rejected() {
    GraphCut::new(2, 1).set_edge_weights(0, 1, 1.0, -0.5);
}

#[test]
#[should_panic(expected = "edge budget")]
fn edge_budget_enforced() {
    let mut g = GraphCut::new(3, 1);
    g.set_edge_weight(0, 1, 1.0);
    g.set_edge_weight(1, 2, 1.0);
}

#[test]
#[should_panic(expected = "out of range")]
fn node_ids_checked() {
    GraphCut::new(2, 0).set_terminal_weights(2, 1.0, 0.0);
}

fn small_dense(nodes: usize, directed: bool) -> DenseCfg {
    DenseCfg {
        nodes,
        directed,
        ..DenseCfg::default()
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn matches_brute_force(seed in any::<u64>(), nodes in 1usize..=12, directed in any::<bool>()) {
        let inst = draw_dense(small_dense(nodes, directed), ReplayToken::new(seed, 0)).unwrap();
        let (flow, labels) = solve(&inst);
        prop_assert_eq!(f64::from(flow), inst.brute_force_min_cut());
        prop_assert_eq!(inst.cut_cost(&labels), f64::from(flow));
    }

    #[test]
    fn capacity_is_conserved(seed in any::<u64>(), nodes in 2usize..=30) {
        let cfg = DenseCfg { edge_prob: 0.3, ..small_dense(nodes, true) };
        let inst = draw_dense(cfg, ReplayToken::new(seed, 1)).unwrap();
        let mut g = inst.build();
        let before = pair_sums(&g);
        g.compute_maximum_flow(false, None);
        prop_assert_eq!(pair_sums(&g), before.clone());
        prop_assert!(g.edge_residuals().iter().all(|&(f, r)| f >= 0.0 && r >= 0.0));
        g.compute_maximum_flow(false, None);
        prop_assert_eq!(pair_sums(&g), before);
    }

    #[test]
    fn second_solve_is_idle(seed in any::<u64>(), width in 2usize..10, height in 2usize..10) {
        let cfg = LatticeCfg { width, height, ..LatticeCfg::default() };
        let mut g = draw_lattice(cfg, ReplayToken::new(seed, 2)).unwrap().build();
        let first = g.compute_maximum_flow(false, None);
        let labels = g.labels();
        let second = g.compute_maximum_flow(false, None);
        prop_assert_eq!(first, second);
        prop_assert_eq!(g.stats().augmentations, 0);
        prop_assert_eq!(g.labels(), labels);
    }

    #[test]
    fn reuse_matches_fresh_solve(seed in any::<u64>(), touched in 1usize..6, rounds in 1usize..4) {
        let cfg = LatticeCfg { width: 7, height: 6, connectivity: Connectivity::Eight, ..LatticeCfg::default() };
        let mut inst = draw_lattice(cfg, ReplayToken::new(seed, 3)).unwrap();
        let pcfg = PerturbCfg { touched, ..PerturbCfg::default() };
        let mut g = inst.build_with_spare(touched * rounds);
        g.compute_maximum_flow(false, None);

        let mut tok = ReplayToken::new(seed, 100);
        let mut changed = Vec::new();
        for _ in 0..rounds {
            let p = draw_perturbation(&inst, pcfg, tok).unwrap();
            tok = tok.next();
            p.apply_to_instance(&mut inst);
            p.apply_to_graph(&mut g);

            let before = g.labels();
            let flow = g.compute_maximum_flow(true, Some(&mut changed));
            let (fresh_flow, fresh_labels) = solve(&inst);
            prop_assert_eq!(flow, fresh_flow);
            prop_assert_eq!(g.labels(), fresh_labels);
            for (i, (old, new)) in before.iter().zip(g.labels()).enumerate() {
                if *old != new {
                    prop_assert!(changed.contains(&i), "node {} flipped but not reported", i);
                }
            }
        }
    }

    #[test]
    fn edge_orientation_and_relabelling_are_symmetric(seed in any::<u64>(), nodes in 2usize..=12) {
        let inst = draw_dense(small_dense(nodes, false), ReplayToken::new(seed, 4)).unwrap();
        let (flow, labels) = solve(&inst);

        let mut swapped = inst.clone();
        for e in &mut swapped.edges {
            std::mem::swap(&mut e.a, &mut e.b);
        }
        let (swapped_flow, swapped_labels) = solve(&swapped);
        prop_assert_eq!(flow, swapped_flow);
        prop_assert_eq!(&labels, &swapped_labels);

        // reverse node ids
        let n = inst.num_nodes();
        let mut relabelled = Instance::new(n);
        for (i, &(s, t)) in inst.terminals.iter().enumerate() {
            relabelled.add_terminal(n - 1 - i, s, t);
        }
        for e in &inst.edges {
            relabelled.add_edge(n - 1 - e.a, n - 1 - e.b, e.weight_ab, e.weight_ba);
        }
        let (relabelled_flow, relabelled_labels) = solve(&relabelled);
        prop_assert_eq!(flow, relabelled_flow);
        for i in 0..n {
            prop_assert_eq!(labels[i], relabelled_labels[n - 1 - i]);
        }
    }
}
