use anyhow::{bail, ensure, Result};
use clap::{Parser, Subcommand, ValueEnum};
use graphcut::cfg::{flows_agree, BRUTE_FORCE_MAX_NODES};
use graphcut::instance::Instance;
use graphcut::rand::{
    draw_dense, draw_lattice, draw_perturbation, Connectivity, DenseCfg, LatticeCfg, PerturbCfg,
    ReplayToken,
};
use graphcut::{SolveStats, Terminal};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::fmt::SubscriberBuilder;

mod provenance;

#[derive(Parser)]
#[command(name = "cli")]
#[command(about = "Graph-cut experiment runner")]
struct Cmd {
    /// Optional run tag; propagated to outputs and logs
    #[arg(long)]
    tag: Option<String>,

    #[command(subcommand)]
    action: Action,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Family {
    /// `size × size` lattice
    Lattice,
    /// `size` nodes, random pairs joined
    Dense,
}

#[derive(Subcommand)]
enum Action {
    /// Draw one random instance, solve it, and write a JSON summary
    Solve {
        #[arg(long, value_enum, default_value_t = Family::Lattice)]
        family: Family,
        #[arg(long, default_value_t = 64)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Use 8-neighbour lattices
        #[arg(long)]
        eight: bool,
        /// Check the flow against brute force (small instances only)
        #[arg(long)]
        verify: bool,
        #[arg(long)]
        out: String,
    },
    /// Solve a lattice, then perturb it repeatedly and re-solve with tree reuse
    Reuse {
        #[arg(long, default_value_t = 128)]
        size: usize,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 5)]
        rounds: usize,
        /// Nodes touched per perturbation
        #[arg(long, default_value_t = 8)]
        touched: usize,
        #[arg(long)]
        out: String,
    },
    /// Print a small provenance JSON block
    Report,
}

#[derive(Serialize)]
struct SolveSummary {
    family: String,
    nodes: usize,
    edges: usize,
    flow: f32,
    foreground: usize,
    elapsed_ms: f64,
    augmentations: u64,
    growth_steps: u64,
    orphans_adopted: u64,
    orphans_freed: u64,
    brute_force: Option<f64>,
    tag: Option<String>,
}

#[derive(Serialize)]
struct ReuseRound {
    round: usize,
    touched: usize,
    flow: f32,
    fresh_flow: f32,
    changed: usize,
    flipped: usize,
    reuse_ms: f64,
    fresh_ms: f64,
    augmentations: u64,
}

#[derive(Serialize)]
struct ReuseSummary {
    size: usize,
    seed: u64,
    initial_flow: f32,
    rounds: Vec<ReuseRound>,
    tag: Option<String>,
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Solve {
            family,
            size,
            seed,
            eight,
            verify,
            out,
        } => solve(family, size, seed, eight, verify, out, cmd.tag),
        Action::Reuse {
            size,
            seed,
            rounds,
            touched,
            out,
        } => reuse(size, seed, rounds, touched, out, cmd.tag),
        Action::Report => report(cmd.tag),
    }
}

fn connectivity(eight: bool) -> Connectivity {
    if eight {
        Connectivity::Eight
    } else {
        Connectivity::Four
    }
}

fn draw(family: Family, size: usize, seed: u64, eight: bool) -> Result<Instance> {
    let tok = ReplayToken::new(seed, 0);
    let inst = match family {
        Family::Lattice => draw_lattice(
            LatticeCfg {
                width: size,
                height: size,
                connectivity: connectivity(eight),
                ..LatticeCfg::default()
            },
            tok,
        )?,
        Family::Dense => draw_dense(
            DenseCfg {
                nodes: size,
                ..DenseCfg::default()
            },
            tok,
        )?,
    };
    Ok(inst)
}

fn solve(
    family: Family,
    size: usize,
    seed: u64,
    eight: bool,
    verify: bool,
    out: String,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(?family, size, seed, eight, verify, out = %out, tag = ?tag, "solve");
    let inst = draw(family, size, seed, eight)?;
    let nodes = inst.num_nodes();
    if verify && nodes > BRUTE_FORCE_MAX_NODES {
        bail!("--verify needs at most {BRUTE_FORCE_MAX_NODES} nodes, instance has {nodes}");
    }

    let mut g = inst.build();
    let start = Instant::now();
    let flow = g.compute_maximum_flow(false, None);
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;
    let labels = g.labels();
    let foreground = labels.iter().filter(|&&l| l == Terminal::Foreground).count();
    tracing::info!(flow, foreground, elapsed_ms, "solved");

    let brute_force = if verify {
        let best = inst.brute_force_min_cut();
        ensure!(
            flows_agree(f64::from(flow), best),
            "max-flow {flow} disagrees with brute-force minimum {best}"
        );
        Some(best)
    } else {
        None
    };

    let SolveStats {
        augmentations,
        growth_steps,
        orphans_adopted,
        orphans_freed,
        ..
    } = g.stats();
    let summary = SolveSummary {
        family: format!("{family:?}").to_lowercase(),
        nodes,
        edges: inst.edges.len(),
        flow,
        foreground,
        elapsed_ms,
        augmentations,
        growth_steps,
        orphans_adopted,
        orphans_freed,
        brute_force,
        tag: tag.clone(),
    };
    let out_path = Path::new(&out);
    provenance::write_summary(out_path, &summary)?;
    provenance::write_sidecar(
        out_path,
        provenance::Payload::new(
            "solve",
            json!({
                "family": summary.family,
                "size": size,
                "seed": seed,
                "eight": eight,
                "verify": verify,
                "tag": tag
            }),
        ),
    )?;
    Ok(())
}

fn reuse(
    size: usize,
    seed: u64,
    rounds: usize,
    touched: usize,
    out: String,
    tag: Option<String>,
) -> Result<()> {
    tracing::info!(size, seed, rounds, touched, out = %out, tag = ?tag, "reuse");
    let mut inst = draw(Family::Lattice, size, seed, false)?;
    let pcfg = PerturbCfg {
        touched,
        ..PerturbCfg::default()
    };
    let mut live = inst.build_with_spare(touched * rounds);
    let initial_flow = live.compute_maximum_flow(false, None);

    let mut tok = ReplayToken::new(seed, 1);
    let mut changed = Vec::new();
    let mut rows = Vec::with_capacity(rounds);
    for round in 0..rounds {
        let p = draw_perturbation(&inst, pcfg, tok)?;
        tok = tok.next();
        p.apply_to_instance(&mut inst);
        p.apply_to_graph(&mut live);

        let before = live.labels();
        let start = Instant::now();
        let flow = live.compute_maximum_flow(true, Some(&mut changed));
        let reuse_ms = start.elapsed().as_secs_f64() * 1e3;
        let flipped = before
            .iter()
            .zip(live.labels())
            .filter(|(old, new)| **old != *new)
            .count();

        let start = Instant::now();
        let fresh_flow = inst.build().compute_maximum_flow(false, None);
        let fresh_ms = start.elapsed().as_secs_f64() * 1e3;
        ensure!(
            flows_agree(f64::from(flow), f64::from(fresh_flow)),
            "round {round}: reused flow {flow} disagrees with fresh flow {fresh_flow}"
        );

        let augmentations = live.stats().augmentations;
        tracing::info!(
            round,
            flow,
            reuse_ms,
            fresh_ms,
            changed = changed.len(),
            flipped,
            augmentations,
            "round"
        );
        rows.push(ReuseRound {
            round,
            touched: p.touched_nodes().len(),
            flow,
            fresh_flow,
            changed: changed.len(),
            flipped,
            reuse_ms,
            fresh_ms,
            augmentations,
        });
    }

    let summary = ReuseSummary {
        size,
        seed,
        initial_flow,
        rounds: rows,
        tag: tag.clone(),
    };
    let out_path = Path::new(&out);
    provenance::write_summary(out_path, &summary)?;
    provenance::write_sidecar(
        out_path,
        provenance::Payload::new(
            "reuse",
            json!({
                "size": size,
                "seed": seed,
                "rounds": rounds,
                "touched": touched,
                "tag": tag
            }),
        ),
    )?;
    Ok(())
}

fn report(tag: Option<String>) -> Result<()> {
    let obj = json!({
        "code_rev": provenance::current_git_rev(),
        "graphcut_version": graphcut::VERSION,
        "tag": tag,
        "params": {},
        "outputs": []
    });
    println!("{}", serde_json::to_string_pretty(&obj)?);
    Ok(())
}
