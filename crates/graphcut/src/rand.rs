//! Random labelling instances (lattices, dense graphs, perturbations) with replay tokens.
//!
//! Purpose
//! - Provide small, deterministic instance streams for property tests, benches
//!   and the `cli` runner. Every draw is reproducible from `(seed, index)`.
//!
//! Model
//! - Lattice: `width × height` nodes in row-major order, 4- or 8-neighbour
//!   edges, independent terminal pulls per node. Some nodes get no pull at all
//!   so free nodes occur.
//! - Dense: every unordered pair becomes an edge with probability `edge_prob`,
//!   optionally with different weights per direction.
//! - Perturbation: extra terminal pulls and parallel edges on a bounded node
//!   subset. Weights are only ever added, matching the append-only graph.
//! - With `integral` set, weights are whole numbers so float sums stay exact.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt;

use crate::instance::Instance;
use crate::maxflow::GraphCut;

/// Error type shared by all generators.
#[derive(Debug)]
pub enum GeneratorError {
    InvalidParams { reason: String },
}

impl GeneratorError {
    fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParams {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParams { reason } => write!(f, "invalid generator params: {reason}"),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    /// Token for the `index`-th draw of the stream `seed`.
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    /// Next token of the same stream.
    pub fn next(self) -> Self {
        Self {
            seed: self.seed,
            index: self.index.wrapping_add(1),
        }
    }

    #[inline]
    fn to_std_rng(self) -> StdRng {
        // SplitMix64-style mixing, cheap and stable.
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        let k = mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15)));
        StdRng::seed_from_u64(k)
    }
}

/// Neighbourhood of a lattice node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Connectivity {
    Four,
    Eight,
}

/// Lattice sampler configuration.
#[derive(Clone, Copy, Debug)]
pub struct LatticeCfg {
    pub width: usize,
    pub height: usize,
    pub connectivity: Connectivity,
    /// Terminal pulls are drawn from `[0, terminal_max]`.
    pub terminal_max: f32,
    /// Edge weights are drawn from `[0, edge_max]`.
    pub edge_max: f32,
    /// Probability that a node gets no terminal pull. Clamped to [0, 1].
    pub free_prob: f64,
    pub integral: bool,
}

impl Default for LatticeCfg {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
            connectivity: Connectivity::Four,
            terminal_max: 20.0,
            edge_max: 10.0,
            free_prob: 0.2,
            integral: true,
        }
    }
}

impl LatticeCfg {
    fn validate(&self) -> Result<(), GeneratorError> {
        if self.width == 0 || self.height == 0 {
            return Err(GeneratorError::invalid(
                "lattice needs a positive width and height",
            ));
        }
        check_weight("terminal_max", self.terminal_max)?;
        check_weight("edge_max", self.edge_max)
    }

    /// Number of undirected edges the lattice holds.
    pub fn edge_count(&self) -> usize {
        let (w, h) = (self.width, self.height);
        let axis = (w - 1) * h + w * (h - 1);
        match self.connectivity {
            Connectivity::Four => axis,
            Connectivity::Eight => axis + 2 * (w - 1) * (h - 1),
        }
    }
}

/// Dense random graph configuration.
#[derive(Clone, Copy, Debug)]
pub struct DenseCfg {
    pub nodes: usize,
    /// Probability that an unordered pair is joined. Clamped to [0, 1].
    pub edge_prob: f64,
    /// Draw the two directions independently instead of one symmetric weight.
    pub directed: bool,
    pub terminal_max: f32,
    pub edge_max: f32,
    pub free_prob: f64,
    pub integral: bool,
}

impl Default for DenseCfg {
    fn default() -> Self {
        Self {
            nodes: 8,
            edge_prob: 0.4,
            directed: true,
            terminal_max: 10.0,
            edge_max: 6.0,
            free_prob: 0.2,
            integral: true,
        }
    }
}

impl DenseCfg {
    fn validate(&self) -> Result<(), GeneratorError> {
        if self.nodes == 0 {
            return Err(GeneratorError::invalid("need at least one node"));
        }
        check_weight("terminal_max", self.terminal_max)?;
        check_weight("edge_max", self.edge_max)
    }
}

/// Perturbation configuration.
#[derive(Clone, Copy, Debug)]
pub struct PerturbCfg {
    /// Distinct nodes touched per perturbation (capped by the node count).
    pub touched: usize,
    /// Extra terminal pulls are drawn from `[0, terminal_max]`.
    pub terminal_max: f32,
    /// Probability that a touched node also gains a parallel edge to another node.
    pub edge_prob: f64,
    pub edge_max: f32,
    pub integral: bool,
}

impl Default for PerturbCfg {
    fn default() -> Self {
        Self {
            touched: 4,
            terminal_max: 30.0,
            edge_prob: 0.3,
            edge_max: 8.0,
            integral: true,
        }
    }
}

impl PerturbCfg {
    fn validate(&self) -> Result<(), GeneratorError> {
        check_weight("terminal_max", self.terminal_max)?;
        check_weight("edge_max", self.edge_max)
    }
}

/// Weight additions on a bounded node subset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Perturbation {
    /// `(node, extra source, extra sink)`.
    pub terminals: Vec<(usize, f32, f32)>,
    /// `(a, b, weight_ab, weight_ba)` for new parallel edges.
    pub edges: Vec<(usize, usize, f32, f32)>,
}

impl Perturbation {
    /// Every node whose weights change, sorted and deduplicated.
    pub fn touched_nodes(&self) -> Vec<usize> {
        let mut nodes: Vec<usize> = self
            .terminals
            .iter()
            .map(|&(i, _, _)| i)
            .chain(self.edges.iter().flat_map(|&(a, b, _, _)| [a, b]))
            .collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    pub fn apply_to_instance(&self, inst: &mut Instance) {
        for &(i, source, sink) in &self.terminals {
            inst.add_terminal(i, source, sink);
        }
        for &(a, b, wab, wba) in &self.edges {
            inst.add_edge(a, b, wab, wba);
        }
    }

    /// Add the weights to a live graph and mark every touched node for tree reuse.
    ///
    /// The graph needs `self.edges.len()` spare edges in its budget.
    pub fn apply_to_graph(&self, g: &mut GraphCut) {
        for &(i, source, sink) in &self.terminals {
            g.set_terminal_weights(i, source, sink);
        }
        for &(a, b, wab, wba) in &self.edges {
            g.set_edge_weights(a, b, wab, wba);
        }
        for i in self.touched_nodes() {
            g.mark_node(i);
        }
    }
}

/// Draw a lattice instance.
pub fn draw_lattice(cfg: LatticeCfg, tok: ReplayToken) -> Result<Instance, GeneratorError> {
    cfg.validate()?;
    let mut rng = tok.to_std_rng();
    let (w, h) = (cfg.width, cfg.height);
    let mut inst = Instance::new(w * h);
    for i in 0..w * h {
        let pull = draw_pull(&mut rng, cfg.free_prob, cfg.terminal_max, cfg.integral);
        if let Some((source, sink)) = pull {
            inst.add_terminal(i, source, sink);
        }
    }
    let id = |x: usize, y: usize| y * w + x;
    for y in 0..h {
        for x in 0..w {
            let mut neighbours = Vec::with_capacity(4);
            if x + 1 < w {
                neighbours.push(id(x + 1, y));
            }
            if y + 1 < h {
                neighbours.push(id(x, y + 1));
            }
            if cfg.connectivity == Connectivity::Eight && y + 1 < h {
                if x + 1 < w {
                    neighbours.push(id(x + 1, y + 1));
                }
                if x > 0 {
                    neighbours.push(id(x - 1, y + 1));
                }
            }
            for n in neighbours {
                let weight = draw_weight(&mut rng, cfg.edge_max, cfg.integral);
                inst.add_edge(id(x, y), n, weight, weight);
            }
        }
    }
    Ok(inst)
}

/// Draw a dense random instance.
pub fn draw_dense(cfg: DenseCfg, tok: ReplayToken) -> Result<Instance, GeneratorError> {
    cfg.validate()?;
    let mut rng = tok.to_std_rng();
    let p = cfg.edge_prob.clamp(0.0, 1.0);
    let mut inst = Instance::new(cfg.nodes);
    for i in 0..cfg.nodes {
        let pull = draw_pull(&mut rng, cfg.free_prob, cfg.terminal_max, cfg.integral);
        if let Some((source, sink)) = pull {
            inst.add_terminal(i, source, sink);
        }
    }
    for a in 0..cfg.nodes {
        for b in a + 1..cfg.nodes {
            if !rng.gen_bool(p) {
                continue;
            }
            let wab = draw_weight(&mut rng, cfg.edge_max, cfg.integral);
            let wba = if cfg.directed {
                draw_weight(&mut rng, cfg.edge_max, cfg.integral)
            } else {
                wab
            };
            inst.add_edge(a, b, wab, wba);
        }
    }
    Ok(inst)
}

/// Draw a perturbation of `inst` touching at most `cfg.touched` distinct nodes.
pub fn draw_perturbation(
    inst: &Instance,
    cfg: PerturbCfg,
    tok: ReplayToken,
) -> Result<Perturbation, GeneratorError> {
    cfg.validate()?;
    let n = inst.num_nodes();
    let mut rng = tok.to_std_rng();
    let picked = rand::seq::index::sample(&mut rng, n, cfg.touched.min(n)).into_vec();
    let mut out = Perturbation::default();
    for &i in &picked {
        let source = draw_weight(&mut rng, cfg.terminal_max, cfg.integral);
        let sink = draw_weight(&mut rng, cfg.terminal_max, cfg.integral);
        out.terminals.push((i, source, sink));
    }
    // partners come from the touched set so the touched count stays bounded
    if picked.len() >= 2 {
        for (k, &a) in picked.iter().enumerate() {
            if !rng.gen_bool(cfg.edge_prob.clamp(0.0, 1.0)) {
                continue;
            }
            let mut j = rng.gen_range(0..picked.len() - 1);
            if j >= k {
                j += 1;
            }
            let wab = draw_weight(&mut rng, cfg.edge_max, cfg.integral);
            let wba = draw_weight(&mut rng, cfg.edge_max, cfg.integral);
            out.edges.push((a, picked[j], wab, wba));
        }
    }
    Ok(out)
}

fn check_weight(name: &str, value: f32) -> Result<(), GeneratorError> {
    if !value.is_finite() || value < 0.0 {
        return Err(GeneratorError::invalid(format!(
            "{name} must be finite and >= 0, got {value}"
        )));
    }
    Ok(())
}

fn draw_weight<R: Rng>(rng: &mut R, max: f32, integral: bool) -> f32 {
    if integral {
        rng.gen_range(0..=max as u32) as f32
    } else {
        rng.gen::<f32>() * max
    }
}

fn draw_pull<R: Rng>(rng: &mut R, free_prob: f64, max: f32, integral: bool) -> Option<(f32, f32)> {
    if rng.gen_bool(free_prob.clamp(0.0, 1.0)) {
        return None;
    }
    Some((draw_weight(rng, max, integral), draw_weight(rng, max, integral)))
}
