//! Data types for the residual graph and search-tree state.
//!
//! Kept small and explicit so `build`, `solve` and `adopt` read as plain index
//! arithmetic over two arrays.

/// Index of a directed arc in `GraphCut::edges`.
///
/// Arcs are allocated in pairs, so the reverse arc of `e` is always `e ^ 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct EdgeId(pub usize);

impl EdgeId {
    #[inline]
    pub(crate) fn sister(self) -> Self {
        Self(self.0 ^ 1)
    }
}

/// Segment a node is assigned to after a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Terminal {
    /// Connected to the source.
    Foreground,
    /// Connected to the sink, or left free.
    Background,
}

/// Link from a node towards the root of its search tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Parent {
    /// Not part of either tree.
    Free,
    /// Tree root, attached directly to the source or sink.
    Terminal,
    /// Lost its parent during augmentation; waiting for adoption.
    Orphan,
    /// Interior node; the arc points from this node to its parent.
    Edge(EdgeId),
}

impl Parent {
    #[inline]
    pub(crate) fn is_free(self) -> bool {
        matches!(self, Parent::Free)
    }
}

/// Directed arc with its residual capacity.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Edge {
    pub head: usize,
    /// Next outgoing arc of the same origin node.
    pub next: Option<EdgeId>,
    pub residual: f32,
}

/// Per-node search state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Node {
    /// Head of the outgoing adjacency list (most recently added arc first).
    pub first: Option<EdgeId>,
    pub parent: Parent,
    /// Queued as active, or currently being grown by the main loop.
    pub active: bool,
    /// Tree membership; only meaningful while `parent` is not `Free`.
    pub in_sink: bool,
    /// Seeded via `mark_node` and not yet consumed by tree reuse.
    pub marked: bool,
    pub changed: bool,
    /// Solve time at which `distance` was last known to be exact.
    pub timestamp: u32,
    /// Hops to the tree root (a root has distance 1).
    pub distance: u32,
    /// Signed terminal residual: positive pulls towards the source, negative towards the sink.
    pub residual: f32,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            first: None,
            parent: Parent::Free,
            active: false,
            in_sink: false,
            marked: false,
            changed: false,
            timestamp: 0,
            distance: 0,
            residual: 0.0,
        }
    }
}

/// Counters describing the most recent `compute_maximum_flow` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SolveStats {
    /// Whether the previous search trees were reused.
    pub reused: bool,
    /// Main-loop iterations (one tree growth step each).
    pub growth_steps: u64,
    /// Augmenting paths pushed.
    pub augmentations: u64,
    /// Orphans that found a new parent in their own tree.
    pub orphans_adopted: u64,
    /// Orphans that became free nodes.
    pub orphans_freed: u64,
}
