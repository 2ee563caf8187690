//! Main loop: tree growth, and the fresh / reused initialisation of both forests.

use super::build::GraphCut;
use super::types::{EdgeId, Parent, SolveStats};

impl GraphCut {
    /// Run max-flow to completion and return the total flow (the min-cut value).
    ///
    /// With `reuse_trees`, the search trees of the previous solve are kept and
    /// only nodes seeded with [`mark_node`](Self::mark_node) are re-examined;
    /// the flag is ignored on the first solve. If `changed` is given, it is
    /// overwritten with the ids of nodes whose segment may have changed since
    /// the last solve without tree reuse.
    pub fn compute_maximum_flow(
        &mut self,
        reuse_trees: bool,
        changed: Option<&mut Vec<usize>>,
    ) -> f32 {
        let reuse_trees = reuse_trees && self.solves > 0;
        self.stats = SolveStats {
            reused: reuse_trees,
            ..SolveStats::default()
        };
        if reuse_trees {
            self.reuse_trees_init();
        } else {
            self.init();
        }

        let mut current: Option<usize> = None;
        loop {
            let mut sticky = current.take();
            if let Some(i) = sticky {
                self.nodes[i].active = false;
                if self.nodes[i].parent.is_free() {
                    sticky = None;
                }
            }
            let Some(i) = sticky.or_else(|| self.next_active()) else {
                break;
            };

            let connecting = self.grow(i);
            self.time = self.time.wrapping_add(1);
            self.stats.growth_steps += 1;

            if let Some(middle) = connecting {
                // keep growing from `i` once the path is pushed
                self.nodes[i].active = true;
                current = Some(i);
                self.augment(middle);
                self.adopt_orphans();
            }
        }

        self.solves += 1;
        if let Some(out) = changed {
            out.clear();
            out.extend(
                self.nodes
                    .iter()
                    .enumerate()
                    .filter(|(_, n)| n.changed)
                    .map(|(i, _)| i),
            );
        }
        tracing::debug!(
            flow = self.total_flow,
            reused = self.stats.reused,
            growth_steps = self.stats.growth_steps,
            augmentations = self.stats.augmentations,
            orphans_adopted = self.stats.orphans_adopted,
            orphans_freed = self.stats.orphans_freed,
            "maxflow finished"
        );
        self.total_flow
    }

    /// Pop the next node that is still in a tree, rotating the queues as they drain.
    fn next_active(&mut self) -> Option<usize> {
        loop {
            let node = match self.queues[0].pop_front() {
                Some(node) => node,
                None => {
                    self.queues.swap(0, 1);
                    self.queues[0].pop_front()?
                }
            };
            self.nodes[node].active = false;
            if !self.nodes[node].parent.is_free() {
                return Some(node);
            }
        }
    }

    /// Grow the tree of `node` across its residual arcs.
    ///
    /// Returns the arc joining the two trees, oriented from the source side to
    /// the sink side, if one is found.
    fn grow(&mut self, node: usize) -> Option<EdgeId> {
        let in_sink = self.nodes[node].in_sink;
        let timestamp = self.nodes[node].timestamp;
        let distance = self.nodes[node].distance;

        let mut next = self.nodes[node].first;
        while let Some(e) = next {
            let edge = self.edges[e.0];
            next = edge.next;
            // source trees grow along arcs, sink trees against them
            let capacity = if in_sink {
                self.edges[e.sister().0].residual
            } else {
                edge.residual
            };
            if capacity == 0.0 {
                continue;
            }

            let head = &mut self.nodes[edge.head];
            if head.parent.is_free() {
                head.in_sink = in_sink;
                head.parent = Parent::Edge(e.sister());
                head.timestamp = timestamp;
                head.distance = distance + 1;
                head.changed = true;
                self.set_node_active(edge.head);
            } else if head.in_sink != in_sink {
                return Some(if in_sink { e.sister() } else { e });
            } else if head.timestamp <= timestamp && head.distance > distance {
                // same tree, strictly shorter route through `node`
                head.parent = Parent::Edge(e.sister());
                head.timestamp = timestamp;
                head.distance = distance + 1;
            }
        }
        None
    }

    /// Fresh start: every node with a terminal pull becomes a root of its tree.
    fn init(&mut self) {
        self.queues[0].clear();
        self.queues[1].clear();
        self.orphans.clear();
        self.time = 0;

        for i in 0..self.nodes.len() {
            let node = &mut self.nodes[i];
            node.active = false;
            node.marked = false;
            node.changed = false;
            node.timestamp = self.time;
            if node.residual == 0.0 {
                node.parent = Parent::Free;
                continue;
            }
            node.in_sink = node.residual < 0.0;
            node.parent = Parent::Terminal;
            node.distance = 1;
            self.set_node_active(i);
        }
    }

    /// Keep the previous forests and repair them around the seeded nodes.
    fn reuse_trees_init(&mut self) {
        let seeds = std::mem::take(&mut self.queues[1]);
        self.queues[0].clear();
        self.orphans.clear();
        self.time = self.time.wrapping_add(1);

        for i in seeds {
            self.nodes[i].active = false;
            self.nodes[i].marked = false;
            self.set_node_active(i);

            let residual = self.nodes[i].residual;
            if residual == 0.0 {
                if !self.nodes[i].parent.is_free() {
                    self.add_orphan_back(i);
                }
                continue;
            }

            let to_sink = residual < 0.0;
            if self.nodes[i].parent.is_free() || self.nodes[i].in_sink != to_sink {
                self.nodes[i].in_sink = to_sink;
                let mut next = self.nodes[i].first;
                while let Some(e) = next {
                    let edge = self.edges[e.0];
                    next = edge.next;
                    let neighbor = self.nodes[edge.head];
                    if neighbor.marked {
                        continue;
                    }
                    if neighbor.parent == Parent::Edge(e.sister()) {
                        // its support through `i` is gone
                        self.add_orphan_back(edge.head);
                    }
                    // arc capacity seen from the neighbour's tree towards `i`
                    let capacity = if to_sink {
                        self.edges[e.sister().0].residual
                    } else {
                        edge.residual
                    };
                    if !self.nodes[edge.head].parent.is_free()
                        && self.nodes[edge.head].in_sink != to_sink
                        && capacity > 0.0
                    {
                        self.set_node_active(edge.head);
                    }
                }
                self.nodes[i].changed = true;
            }

            let node = &mut self.nodes[i];
            node.parent = Parent::Terminal;
            node.timestamp = self.time;
            node.distance = 1;
        }

        self.adopt_orphans();
    }
}
