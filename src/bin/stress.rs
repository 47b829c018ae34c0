//! Stress run for the simulation core.
//!
//! Drives many seeds through long runs with HFT interleaved and reports:
//! - invariant violations
//! - ticks per second
//! - digest per seed (same seed must give same digest)
//!
//! Usage: cargo run --release --bin stress

use std::time::Instant;

use marketsim::config::Config;
use marketsim::runner::Simulation;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn main() {
    let seeds = env_u64("STRESS_SEEDS", 16);
    let ticks = env_u64("STRESS_TICKS", 5_000);
    let base = Config {
        simulation_speed_ms: 100,
        hft_interval_ms: 250,
        checkpoint_every: 0,
        ..Config::from_env()
    };

    eprintln!(
        "=== stress: {} seeds x {} ticks, {} companies ===",
        seeds,
        ticks,
        base.company_names.len()
    );

    let started = Instant::now();
    let mut total_violations = 0u64;
    let mut total_actions = 0usize;
    let mut mismatches = 0u64;

    for seed in 0..seeds {
        let cfg = Config {
            seed,
            ..base.clone()
        };

        let run_start = Instant::now();
        let mut sim = Simulation::new(&cfg, 0);
        sim.run_ticks(ticks);
        let elapsed = run_start.elapsed();

        // determinism: a second run from the same seed lands on the same digest
        let mut again = Simulation::new(&cfg, 0);
        again.run_ticks(ticks);
        let digest = sim.state().digest();
        if again.state().digest() != digest {
            mismatches += 1;
        }

        total_violations += sim.violations();
        total_actions += sim.journal().len();

        let secs = elapsed.as_secs_f64().max(1e-9);
        println!(
            "seed={:<4} time={} actions={} news={} hft_logs={} violations={} ticks/s={:.0} digest={}",
            seed,
            sim.state().time,
            sim.journal().len(),
            sim.state().next_news_id - 1,
            sim.state().next_trade_id - 1,
            sim.violations(),
            sim.state().time as f64 / secs,
            &digest[..16],
        );
    }

    println!(
        "total: actions={} violations={} digest_mismatches={} elapsed={:.2}s",
        total_actions,
        total_violations,
        mismatches,
        started.elapsed().as_secs_f64()
    );

    if total_violations > 0 || mismatches > 0 {
        std::process::exit(1);
    }
}
