//! Two-terminal graph cuts for binary labelling.
//!
//! The engine lives in [`maxflow`]; [`instance`] and [`rand`] provide an
//! in-memory weight model, a brute-force reference and reproducible random
//! instances used by tests, benches and the `cli` runner.

pub mod api;
pub mod cfg;
pub mod instance;
pub mod maxflow;
pub mod rand;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use maxflow::{GraphCut, SolveStats, Terminal};

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::instance::Instance;
    pub use crate::maxflow::{GraphCut, SolveStats, Terminal};
    pub use crate::rand::{
        draw_dense, draw_lattice, draw_perturbation, Connectivity, DenseCfg, LatticeCfg,
        Perturbation, PerturbCfg, ReplayToken,
    };
}
