//! Boykov–Kolmogorov max-flow / min-cut with reusable search trees.
//!
//! Purpose
//! - Split a set of elements into foreground (source) and background (sink)
//!   minimising terminal affinities plus the weights of cut edges.
//! - Re-solve cheaply after a bounded set of weight changes by keeping the
//!   previous search trees and repairing them around marked nodes.
//!
//! Model
//! - Two forests grow from the virtual source and sink over residual arcs.
//!   When they touch, flow is pushed along the joining path (augmentation);
//!   saturated arcs leave orphans, which are re-attached to their own tree or
//!   released (adoption). Growth, augmentation and adoption repeat until no
//!   active node remains.
//! - Scan order is deterministic: two FIFO active queues, adjacency lists in
//!   reverse insertion order, first connection wins.
//!
//! References
//! - Y. Boykov, V. Kolmogorov, "An Experimental Comparison of Min-Cut/Max-Flow
//!   Algorithms for Energy Minimization in Vision", PAMI 2004.
//! - P. Kohli, P. Torr, "Efficiently Solving Dynamic Markov Random Fields
//!   using Graph Cuts", ICCV 2005 (tree reuse).
//!
//! Layout
//! - `types.rs` (records and tags), `build.rs` (construction and queries),
//!   `solve.rs` (main loop, growth, initialisation) and `adopt.rs`
//!   (augmentation and orphan adoption).

mod adopt;
mod build;
mod solve;
mod types;

pub use build::GraphCut;
pub use types::{SolveStats, Terminal};

#[cfg(test)]
mod tests;
