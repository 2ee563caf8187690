//! Augmentation along a found path and adoption of the orphans it leaves behind.

use super::build::GraphCut;
use super::types::{EdgeId, Parent};

impl GraphCut {
    /// Parent arc of a node on an augmenting path, or `None` at the tree root.
    #[inline]
    fn step_to_root(&self, node: usize) -> Option<EdgeId> {
        match self.nodes[node].parent {
            Parent::Edge(e) => Some(e),
            Parent::Terminal => None,
            p => unreachable!("node {node} on an augmenting path has parent {p:?}"),
        }
    }

    /// Push the bottleneck flow along source root → `middle` → sink root.
    ///
    /// `middle` points from the source tree into the sink tree. Every arc or
    /// root that becomes saturated turns its node into an orphan, queued at the
    /// front.
    pub(super) fn augment(&mut self, middle: EdgeId) {
        let source_side = self.edges[middle.sister().0].head;
        let sink_side = self.edges[middle.0].head;

        // bottleneck
        let mut bottleneck = self.edges[middle.0].residual;
        let mut node = source_side;
        while let Some(e) = self.step_to_root(node) {
            bottleneck = bottleneck.min(self.edges[e.sister().0].residual);
            node = self.edges[e.0].head;
        }
        bottleneck = bottleneck.min(self.nodes[node].residual);
        let mut node = sink_side;
        while let Some(e) = self.step_to_root(node) {
            bottleneck = bottleneck.min(self.edges[e.0].residual);
            node = self.edges[e.0].head;
        }
        bottleneck = bottleneck.min(-self.nodes[node].residual);

        // source tree
        self.edges[middle.sister().0].residual += bottleneck;
        self.edges[middle.0].residual -= bottleneck;
        let mut node = source_side;
        while let Some(e) = self.step_to_root(node) {
            self.edges[e.0].residual += bottleneck;
            self.edges[e.sister().0].residual -= bottleneck;
            if self.edges[e.sister().0].residual == 0.0 {
                self.add_orphan_front(node);
            }
            node = self.edges[e.0].head;
        }
        self.nodes[node].residual -= bottleneck;
        if self.nodes[node].residual == 0.0 {
            self.add_orphan_front(node);
        }

        // sink tree
        let mut node = sink_side;
        while let Some(e) = self.step_to_root(node) {
            self.edges[e.sister().0].residual += bottleneck;
            self.edges[e.0].residual -= bottleneck;
            if self.edges[e.0].residual == 0.0 {
                self.add_orphan_front(node);
            }
            node = self.edges[e.0].head;
        }
        self.nodes[node].residual += bottleneck;
        if self.nodes[node].residual == 0.0 {
            self.add_orphan_front(node);
        }

        self.total_flow += bottleneck;
        self.stats.augmentations += 1;
        tracing::trace!(bottleneck, source_side, sink_side, "augment");
    }

    /// Process the orphan queue until it is empty.
    pub(super) fn adopt_orphans(&mut self) {
        while let Some(orphan) = self.orphans.pop_front() {
            self.process_orphan(orphan);
        }
    }

    /// Hops from `start` to its tree root, or `None` if the chain ends at an orphan.
    ///
    /// Uses distances already stamped with the current time where possible and
    /// stamps a root when one is reached.
    fn distance_to_root(&mut self, start: usize) -> Option<u32> {
        let mut node = start;
        let mut distance = 0;
        loop {
            let n = self.nodes[node];
            if n.timestamp == self.time {
                return Some(distance + n.distance);
            }
            distance += 1;
            match n.parent {
                Parent::Terminal => {
                    self.nodes[node].timestamp = self.time;
                    self.nodes[node].distance = 1;
                    return Some(distance);
                }
                Parent::Edge(e) => node = self.edges[e.0].head,
                Parent::Orphan | Parent::Free => return None,
            }
        }
    }

    /// Cache exact distances along the chain from `start` up to the first stamped node.
    fn stamp_path(&mut self, start: usize, mut distance: u32) {
        let mut node = start;
        while self.nodes[node].timestamp != self.time {
            self.nodes[node].timestamp = self.time;
            self.nodes[node].distance = distance;
            distance -= 1;
            let Parent::Edge(e) = self.nodes[node].parent else {
                break;
            };
            node = self.edges[e.0].head;
        }
    }

    /// Try to reattach `orphan` to its own tree through the closest valid neighbour.
    ///
    /// Failing that, the orphan becomes free, its children become orphans, and
    /// same-tree neighbours with a live arc into it are reactivated.
    fn process_orphan(&mut self, orphan: usize) {
        let in_sink = self.nodes[orphan].in_sink;
        // capacity of the arc a neighbour would use to feed `orphan` within its tree
        let feeding = |g: &Self, e: EdgeId| {
            if in_sink {
                g.edges[e.0].residual
            } else {
                g.edges[e.sister().0].residual
            }
        };

        let mut best: Option<(EdgeId, u32)> = None;
        let mut next = self.nodes[orphan].first;
        while let Some(e) = next {
            next = self.edges[e.0].next;
            if feeding(self, e) == 0.0 {
                continue;
            }
            let head = self.edges[e.0].head;
            let candidate = self.nodes[head];
            if candidate.in_sink != in_sink || candidate.parent.is_free() {
                continue;
            }
            if let Some(distance) = self.distance_to_root(head) {
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((e, distance));
                }
                self.stamp_path(head, distance);
            }
        }

        if let Some((e, distance)) = best {
            let node = &mut self.nodes[orphan];
            node.parent = Parent::Edge(e);
            node.timestamp = self.time;
            node.distance = distance + 1;
            self.stats.orphans_adopted += 1;
            return;
        }

        self.nodes[orphan].parent = Parent::Free;
        self.nodes[orphan].changed = true;
        self.stats.orphans_freed += 1;

        let mut next = self.nodes[orphan].first;
        while let Some(e) = next {
            next = self.edges[e.0].next;
            let head = self.edges[e.0].head;
            let neighbor = self.nodes[head];
            if neighbor.in_sink != in_sink || neighbor.parent.is_free() {
                continue;
            }
            if feeding(self, e) != 0.0 {
                self.set_node_active(head);
            }
            if let Parent::Edge(pe) = neighbor.parent {
                if self.edges[pe.0].head == orphan {
                    self.add_orphan_back(head);
                }
            }
        }
    }
}
