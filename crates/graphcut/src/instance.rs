//! In-memory weight model of a labelling problem.
//!
//! An `Instance` records accumulated terminal pulls and directed edge pairs
//! independently of any solver state. It can build a fresh [`GraphCut`],
//! evaluate the cut cost of a labelling, and enumerate all labellings of a
//! small instance as a reference for the solver.

use crate::cfg::BRUTE_FORCE_MAX_NODES;
use crate::maxflow::{GraphCut, Terminal};

/// Pair of directed arcs between two distinct nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedEdge {
    pub a: usize,
    pub b: usize,
    pub weight_ab: f32,
    pub weight_ba: f32,
}

/// Terminal pulls and edges of a two-label problem.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instance {
    /// `(source, sink)` affinity per node, summed over all additions.
    pub terminals: Vec<(f32, f32)>,
    pub edges: Vec<WeightedEdge>,
}

impl Instance {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            terminals: vec![(0.0, 0.0); num_nodes],
            edges: Vec::new(),
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.terminals.len()
    }

    /// Accumulate terminal affinities of `node`.
    pub fn add_terminal(&mut self, node: usize, source: f32, sink: f32) {
        let t = &mut self.terminals[node];
        t.0 += source;
        t.1 += sink;
    }

    /// Append a directed edge pair.
    pub fn add_edge(&mut self, a: usize, b: usize, weight_ab: f32, weight_ba: f32) {
        self.edges.push(WeightedEdge {
            a,
            b,
            weight_ab,
            weight_ba,
        });
    }

    /// Fresh graph holding exactly these weights.
    pub fn build(&self) -> GraphCut {
        self.build_with_spare(0)
    }

    /// Fresh graph with room for `spare` further edges.
    pub fn build_with_spare(&self, spare: usize) -> GraphCut {
        let mut g = GraphCut::new(self.num_nodes(), self.edges.len() + spare);
        for (i, &(source, sink)) in self.terminals.iter().enumerate() {
            if source != 0.0 || sink != 0.0 {
                g.set_terminal_weights(i, source, sink);
            }
        }
        for e in &self.edges {
            g.set_edge_weights(e.a, e.b, e.weight_ab, e.weight_ba);
        }
        g
    }

    /// Cost of `labels`: foreground nodes pay their sink pull, background nodes
    /// their source pull, and every arc from foreground into background is cut.
    pub fn cut_cost(&self, labels: &[Terminal]) -> f64 {
        assert_eq!(labels.len(), self.num_nodes(), "one label per node");
        let terminal: f64 = self
            .terminals
            .iter()
            .zip(labels)
            .map(|(&(source, sink), &l)| match l {
                Terminal::Foreground => f64::from(sink),
                Terminal::Background => f64::from(source),
            })
            .sum();
        let pairwise: f64 = self
            .edges
            .iter()
            .map(|e| match (labels[e.a], labels[e.b]) {
                (Terminal::Foreground, Terminal::Background) => f64::from(e.weight_ab),
                (Terminal::Background, Terminal::Foreground) => f64::from(e.weight_ba),
                _ => 0.0,
            })
            .sum();
        terminal + pairwise
    }

    /// Minimum cut cost over all `2^n` labellings.
    pub fn brute_force_min_cut(&self) -> f64 {
        let n = self.num_nodes();
        assert!(
            n <= BRUTE_FORCE_MAX_NODES,
            "brute force limited to {BRUTE_FORCE_MAX_NODES} nodes, got {n}"
        );
        let mut labels = vec![Terminal::Background; n];
        (0u32..1 << n)
            .map(|mask| {
                for (i, l) in labels.iter_mut().enumerate() {
                    *l = if mask >> i & 1 == 1 {
                        Terminal::Foreground
                    } else {
                        Terminal::Background
                    };
                }
                self.cut_cost(&labels)
            })
            .fold(f64::INFINITY, f64::min)
    }
}
