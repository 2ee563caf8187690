//! Curated surface for downstream code.
//!
//! Everything a caller needs to build a graph, solve it, re-solve after
//! changes, and read the segmentation back.

// Engine
pub use crate::maxflow::{GraphCut, SolveStats, Terminal};
// Reference model and checks
pub use crate::cfg::{flows_agree, BRUTE_FORCE_MAX_NODES, FLOW_REL_TOL};
pub use crate::instance::{Instance, WeightedEdge};
// Random instances
pub use crate::rand::{
    draw_dense, draw_lattice, draw_perturbation, Connectivity, DenseCfg, GeneratorError,
    LatticeCfg, Perturbation, PerturbCfg, ReplayToken,
};
