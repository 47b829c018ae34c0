//! Replay an action journal (JSON lines on stdin) and print the final digest.
//!
//! Usage: SEED=42 cargo run --bin replay < journal.jsonl

use std::io;

use anyhow::Result;
use serde_json::json;

use marketsim::config::Config;
use marketsim::engine::reducer::ReducerConfig;
use marketsim::runner::{read_journal, replay};
use marketsim::view::MarketOverview;

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let journal = read_journal(io::stdin().lock())?;

    for (line, err) in &journal.bad_lines {
        eprintln!("bad action json at line {}: {}", line, err);
    }

    let outcome = replay(cfg.seed, journal.actions, &ReducerConfig::default());

    for (i, v) in &outcome.violations {
        eprintln!("invariant violation at action {}: {}", i, v);
    }

    let overview = MarketOverview::from_state(&outcome.state);
    let summary = json!({
        "digest": outcome.state.digest(),
        "applied": outcome.applied,
        "time": outcome.state.time,
        "companies": outcome.state.companies.len(),
        "news": outcome.state.news_events.len(),
        "hft_logs": outcome.state.hft_logs.len(),
        "composite": overview.composite,
        "violations": outcome.violations.len(),
        "bad_lines": journal.bad_lines.len(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    if !outcome.violations.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}
