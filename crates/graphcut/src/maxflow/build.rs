//! Graph construction, seeding, and result queries.

use std::collections::VecDeque;

use super::types::{Edge, EdgeId, Node, Parent, SolveStats, Terminal};

/// Two-terminal max-flow / min-cut engine (Boykov–Kolmogorov search trees).
///
/// Nodes are fixed at construction; arc pairs are appended by
/// [`set_edge_weight`](Self::set_edge_weight) up to the budget declared in
/// [`new`](Self::new) and are never removed. Solving mutates residual
/// capacities and tree state only, so weights may be added between solves and
/// the next solve can reuse the previous search trees.
///
/// Precondition violations (bad ids, exhausted edge budget, self loops,
/// negative directed weights) panic.
#[derive(Clone, Debug)]
pub struct GraphCut {
    pub(super) nodes: Vec<Node>,
    pub(super) edges: Vec<Edge>,
    pub(super) max_edges: usize,
    pub(super) total_flow: f32,
    pub(super) solves: u32,
    /// `queues[0]` is drained first; `queues[1]` collects newly activated
    /// nodes and doubles as the `mark_node` seed queue between solves.
    pub(super) queues: [VecDeque<usize>; 2],
    pub(super) orphans: VecDeque<usize>,
    pub(super) time: u32,
    pub(super) stats: SolveStats,
}

impl GraphCut {
    /// Allocate `num_nodes` free nodes and room for `num_edges` undirected
    /// edges (each stored as a pair of directed arcs).
    pub fn new(num_nodes: usize, num_edges: usize) -> Self {
        assert!(num_nodes > 0, "graph needs at least one node");
        Self {
            nodes: vec![Node::default(); num_nodes],
            edges: Vec::with_capacity(2 * num_edges),
            max_edges: num_edges,
            total_flow: 0.0,
            solves: 0,
            queues: [VecDeque::new(), VecDeque::new()],
            orphans: VecDeque::new(),
            time: 0,
            stats: SolveStats::default(),
        }
    }

    /// Add affinities of `node` to the source (foreground) and sink (background).
    ///
    /// Repeated calls accumulate. The part both pulls share is already cut on
    /// either side, so it goes straight into the total flow and only the
    /// difference is kept as the node's terminal residual.
    pub fn set_terminal_weights(&mut self, node: usize, source: f32, sink: f32) {
        self.check_node(node);
        let (mut source, mut sink) = (source, sink);
        let delta = self.nodes[node].residual;
        if delta > 0.0 {
            source += delta;
        } else {
            sink -= delta;
        }
        self.total_flow += source.min(sink);
        self.nodes[node].residual = source - sink;
    }

    /// Add an undirected edge of capacity `weight` between `a` and `b`.
    pub fn set_edge_weight(&mut self, a: usize, b: usize, weight: f32) {
        self.set_edge_weights(a, b, weight, weight);
    }

    /// Add a pair of directed arcs `a → b` and `b → a` with independent capacities.
    pub fn set_edge_weights(&mut self, a: usize, b: usize, weight_ab: f32, weight_ba: f32) {
        self.check_node(a);
        self.check_node(b);
        assert!(a != b, "self loop on node {a}");
        assert!(
            weight_ab >= 0.0 && weight_ba >= 0.0,
            "negative edge weight between {a} and {b}: {weight_ab}, {weight_ba}"
        );
        assert!(
            self.num_edges_added() < self.max_edges,
            "edge budget of {} exhausted",
            self.max_edges
        );

        let forward = EdgeId(self.edges.len());
        let reverse = forward.sister();
        self.edges.push(Edge {
            head: b,
            next: self.nodes[a].first,
            residual: weight_ab,
        });
        self.edges.push(Edge {
            head: a,
            next: self.nodes[b].first,
            residual: weight_ba,
        });
        self.nodes[a].first = Some(forward);
        self.nodes[b].first = Some(reverse);
    }

    /// Seed `node` for the next solve with `reuse_trees = true`.
    ///
    /// Mark every node whose terminal weights or adjacent edges changed since
    /// the previous solve.
    pub fn mark_node(&mut self, node: usize) {
        self.check_node(node);
        self.set_node_active(node);
        self.nodes[node].marked = true;
    }

    /// Segment of `node` after the last solve. Free nodes report `Background`.
    pub fn terminal(&self, node: usize) -> Terminal {
        self.check_node(node);
        let n = &self.nodes[node];
        if !n.parent.is_free() && !n.in_sink {
            Terminal::Foreground
        } else {
            Terminal::Background
        }
    }

    /// Segments of all nodes, in id order.
    pub fn labels(&self) -> Vec<Terminal> {
        (0..self.nodes.len()).map(|i| self.terminal(i)).collect()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Declared edge budget.
    pub fn num_edges(&self) -> usize {
        self.max_edges
    }

    /// Edges added so far.
    pub fn num_edges_added(&self) -> usize {
        self.edges.len() / 2
    }

    /// Flow accumulated so far, including terminal pulls cancelled on insertion.
    pub fn total_flow(&self) -> f32 {
        self.total_flow
    }

    /// Counters of the most recent solve.
    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Number of completed solves.
    pub fn solves(&self) -> u32 {
        self.solves
    }

    /// Signed terminal residual of `node`.
    #[cfg(test)]
    pub(crate) fn residual_capacity(&self, node: usize) -> f32 {
        self.nodes[node].residual
    }

    /// Residual capacities of every arc pair, `(forward, reverse)` in creation order.
    #[cfg(test)]
    pub(crate) fn edge_residuals(&self) -> Vec<(f32, f32)> {
        self.edges
            .chunks_exact(2)
            .map(|pair| (pair[0].residual, pair[1].residual))
            .collect()
    }

    /// Queue `node` for growth unless it is already queued or being grown.
    pub(super) fn set_node_active(&mut self, node: usize) {
        let n = &mut self.nodes[node];
        if !n.active {
            n.active = true;
            self.queues[1].push_back(node);
        }
    }

    pub(super) fn add_orphan_front(&mut self, node: usize) {
        self.nodes[node].parent = Parent::Orphan;
        self.orphans.push_front(node);
    }

    pub(super) fn add_orphan_back(&mut self, node: usize) {
        self.nodes[node].parent = Parent::Orphan;
        self.orphans.push_back(node);
    }

    #[inline]
    fn check_node(&self, node: usize) {
        assert!(
            node < self.nodes.len(),
            "node id {node} out of range (graph has {} nodes)",
            self.nodes.len()
        );
    }
}
