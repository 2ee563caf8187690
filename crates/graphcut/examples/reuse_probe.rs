//! Timing probe: re-solving a perturbed lattice with and without tree reuse.
//!
//! Purpose
//! - Give a quick, reproducible data point for how much tree reuse saves
//!   after a handful of local weight changes on a 256² lattice.
//! - Cross-check both paths against each other on every round.

use std::time::Instant;

use graphcut::cfg::flows_agree;
use graphcut::rand::{draw_lattice, draw_perturbation, LatticeCfg, PerturbCfg, ReplayToken};

fn main() {
    let cfg = LatticeCfg {
        width: 256,
        height: 256,
        ..LatticeCfg::default()
    };
    let pcfg = PerturbCfg {
        touched: 32,
        ..PerturbCfg::default()
    };
    let rounds = 8;

    let mut inst = draw_lattice(cfg, ReplayToken::new(2024, 0)).expect("lattice params are valid");
    let mut live = inst.build_with_spare(pcfg.touched * rounds);
    let start = Instant::now();
    let flow0 = live.compute_maximum_flow(false, None);
    println!(
        "initial solve: flow={flow0} in {:.2} ms",
        start.elapsed().as_secs_f64() * 1e3
    );

    let mut tok = ReplayToken::new(2024, 1);
    for round in 0..rounds {
        let p = draw_perturbation(&inst, pcfg, tok).expect("perturbation params are valid");
        tok = tok.next();
        p.apply_to_instance(&mut inst);
        p.apply_to_graph(&mut live);

        let t_reuse = Instant::now();
        let reused = live.compute_maximum_flow(true, None);
        let reuse_ms = t_reuse.elapsed().as_secs_f64() * 1e3;

        let t_fresh = Instant::now();
        let fresh = inst.build().compute_maximum_flow(false, None);
        let fresh_ms = t_fresh.elapsed().as_secs_f64() * 1e3;

        assert!(
            flows_agree(f64::from(reused), f64::from(fresh)),
            "round {round}: reuse {reused} vs fresh {fresh}"
        );
        let stats = live.stats();
        println!(
            "round {round}: flow={reused} reuse={reuse_ms:.2} ms ({} augmentations) fresh={fresh_ms:.2} ms",
            stats.augmentations
        );
    }
}
