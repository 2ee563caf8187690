//! Numeric defaults shared by the reference checks.
//!
//! The engine compares residuals against exact zero and needs no tolerance;
//! these constants only govern comparisons between independent solves.

/// Largest instance `Instance::brute_force_min_cut` will enumerate.
pub const BRUTE_FORCE_MAX_NODES: usize = 20;

/// Relative tolerance when comparing flows computed along different paths.
pub const FLOW_REL_TOL: f64 = 1e-4;

/// Whether two flow values agree within `FLOW_REL_TOL` (absolute near zero).
pub fn flows_agree(a: f64, b: f64) -> bool {
    (a - b).abs() <= FLOW_REL_TOL * a.abs().max(b.abs()).max(1.0)
}
