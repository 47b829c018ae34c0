//! Smoke tests: end-to-end scenarios through the public action protocol.
//!
//! Every test drives `reduce` (or the `Simulation` runner) exactly the way a
//! front end would, then inspects the resulting state.

use std::fs::File;
use std::io::BufReader;

use rand::rngs::StdRng;
use rand::SeedableRng;

use marketsim::config::Config;
use marketsim::engine::events::Action;
use marketsim::engine::reducer::{reduce, ReducerConfig};
use marketsim::engine::registry::blank_company;
use marketsim::engine::state::{
    AppState, CompanyId, Region, RegionBook, RegionData, Sector, ViewMode, HFT_LOG_CAPACITY,
    HISTORY_CAPACITY, NEWS_CAPACITY,
};
use marketsim::runner::{read_journal, replay, Simulation};
use marketsim::view::MarketOverview;

fn sim_config(companies: usize, seed: u64) -> Config {
    Config {
        seed,
        company_names: (0..companies).map(|i| format!("Smoke {}", i)).collect(),
        simulation_speed_ms: 100,
        hft_interval_ms: 300,
        checkpoint_every: 0,
        ..Config::default()
    }
}

/// Model with every stochastic term switched off.
fn quiet_config() -> ReducerConfig {
    ReducerConfig {
        region_risk_step: 0.0,
        region_growth_step: 0.0,
        news_probability: 0.0,
        sentiment_jitter: 0.0,
        volatility_shock: 0.0,
        ..ReducerConfig::default()
    }
}

fn init_single(index: f64, regions: RegionBook) -> AppState {
    let mut c = blank_company(0, "Solo Industries", Region::Europe, Sector::Finance, index);
    c.sentiment = 0.0;
    c.volatility = 0.0;
    c.debt_ratio = 0.0;
    c.esg_score = 60.0;
    c.meme_factor = 0.0;
    let mut rng = StdRng::seed_from_u64(0);
    reduce(
        &AppState::new(),
        Action::Init {
            companies: vec![c],
            regions,
        },
        &mut rng,
        &ReducerConfig::default(),
    )
}

// ---------------------------------------------------------------------------
// S01: Bounds hold over a long run with HFT interleaved
// ---------------------------------------------------------------------------
#[test]
fn s01_bounds_hold_over_long_run() {
    let mut sim = Simulation::new(&sim_config(12, 7), 0);
    sim.run_ticks(2_000);
    let state = sim.state();
    let cfg = sim.reducer_config();

    assert_eq!(state.time, 2_000);
    assert_eq!(sim.violations(), 0);
    for c in state.companies.values() {
        assert!(c.index >= cfg.index_floor && c.index <= cfg.index_ceiling, "{} at {}", c.name, c.index);
        assert!(c.trade_history.iter().all(|p| p.price >= 800.0 && p.price <= 1800.0));
    }
    for (region, d) in state.regions.iter() {
        assert!((0.0..=1.0).contains(&d.risk), "{} risk {}", region, d.risk);
        assert!((-0.1..=0.1).contains(&d.economic_growth), "{} growth {}", region, d.economic_growth);
    }
}

// ---------------------------------------------------------------------------
// S02: Capacities
// ---------------------------------------------------------------------------
#[test]
fn s02_capacities_hold() {
    let mut sim = Simulation::new(&sim_config(8, 11), 0);
    sim.run_ticks(500);
    let state = sim.state();

    assert!(state.news_events.len() <= NEWS_CAPACITY);
    assert!(state.hft_logs.len() <= HFT_LOG_CAPACITY);
    for c in state.companies.values() {
        assert_eq!(c.trade_history.len(), HISTORY_CAPACITY);
    }
}

// ---------------------------------------------------------------------------
// S03: Same seed, same state
// ---------------------------------------------------------------------------
#[test]
fn s03_same_seed_same_digest() {
    let run = |seed| {
        let mut sim = Simulation::new(&sim_config(10, seed), 5_000);
        sim.run_ticks(300);
        sim.state().digest()
    };
    assert_eq!(run(99), run(99));
    assert_ne!(run(99), run(100));
}

// ---------------------------------------------------------------------------
// S04: Control surface idempotence
// ---------------------------------------------------------------------------
#[test]
fn s04_control_actions_idempotent() {
    let mut sim = Simulation::new(&sim_config(5, 1), 0);
    let once = sim.dispatch(Action::SelectCompany { id: Some(CompanyId(3)) }).clone();
    let twice = sim.dispatch(Action::SelectCompany { id: Some(CompanyId(3)) }).clone();
    assert_eq!(once, twice);
    assert_eq!(twice.control.selected_company, Some(CompanyId(3)));

    let state = sim.dispatch(Action::ChangeView { view: ViewMode::Sector });
    assert_eq!(state.control.view, ViewMode::Sector);
    assert_eq!(state.control.selected_company, None);

    // reset holds even with nothing selected
    let state = sim.dispatch(Action::ChangeView { view: ViewMode::Company });
    assert_eq!(state.control.selected_company, None);
}

// ---------------------------------------------------------------------------
// S05: time counts ticks only
// ---------------------------------------------------------------------------
#[test]
fn s05_time_counts_ticks_only() {
    let mut sim = Simulation::new(&sim_config(4, 3), 0);
    let mut expected = sim.state().time;
    for i in 0..60u64 {
        if i % 3 == 0 {
            sim.dispatch(Action::HftBurst { ts: i });
        } else {
            sim.dispatch(Action::TickUpdate { ts: i });
            expected += 1;
        }
        assert_eq!(sim.state().time, expected);
    }
    assert_eq!(sim.violations(), 0);
}

// ---------------------------------------------------------------------------
// S06: Drift composition with noise off
// ---------------------------------------------------------------------------
#[test]
fn s06_drift_composition_region_risk_only() {
    let mut regions = RegionBook::default();
    regions.set(
        Region::Europe,
        RegionData {
            risk: 0.2,
            economic_growth: 0.0,
        },
    );
    let state = init_single(1000.0, regions);

    let mut rng = StdRng::seed_from_u64(5);
    let next = reduce(&state, Action::TickUpdate { ts: 1 }, &mut rng, &quiet_config());
    let c = &next.companies[&CompanyId(0)];

    assert!((c.index - 1000.0 * 0.9996).abs() < 1e-9, "index {}", c.index);
    assert_eq!(c.trade_history.newest().map(|p| p.price), Some(c.index));
    assert_eq!(next.time, state.time + 1);
}

// ---------------------------------------------------------------------------
// S07: Out-of-range index is redrawn inside the bound, not pinned
// ---------------------------------------------------------------------------
#[test]
fn s07_bound_redraw_from_above() {
    let mut regions = RegionBook::default();
    // growth lift of 1.0 doubles the index for one tick: 1000 -> 2000
    regions.set(
        Region::Europe,
        RegionData {
            risk: 0.0,
            economic_growth: 0.1,
        },
    );
    let state = init_single(1000.0, regions);
    let cfg = ReducerConfig {
        growth_lift: 10.0,
        debt_drag: 0.0,
        ..quiet_config()
    };

    for seed in 0..50 {
        let mut rng = StdRng::seed_from_u64(seed);
        let next = reduce(&state, Action::TickUpdate { ts: 1 }, &mut rng, &cfg);
        let idx = next.companies[&CompanyId(0)].index;
        assert!((1750.0..1800.0).contains(&idx), "seed {} gave {}", seed, idx);
    }
}

// ---------------------------------------------------------------------------
// S08: HFT log keeps the newest 100 trades
// ---------------------------------------------------------------------------
#[test]
fn s08_hft_log_cap_keeps_newest() {
    let cfg = ReducerConfig {
        hft_probability: 1.0,
        ..ReducerConfig::default()
    };
    let mut sim = Simulation::with_reducer_config(&sim_config(7, 21), cfg, 0);
    for round in 0..5u64 {
        sim.dispatch(Action::HftBurst { ts: 10_000 * (round + 1) });
    }
    let state = sim.state();
    // 5 rounds x 7 companies x 5 trades
    assert_eq!(state.next_trade_id - 1, 175);
    assert_eq!(state.hft_logs.len(), HFT_LOG_CAPACITY);

    let ids: Vec<u64> = state.hft_logs.iter().map(|l| l.id).collect();
    assert_eq!(ids, (76..=175).rev().collect::<Vec<_>>());

    let stamps: Vec<u64> = state.hft_logs.iter().map(|l| l.timestamp).collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]), "not newest-first: {:?}", stamps);
    // rounds 3..=5 survive; every trade carries its round's dispatch time
    assert!(stamps.iter().all(|t| [30_000, 40_000, 50_000].contains(t)));
    assert_eq!(stamps.iter().filter(|t| **t == 50_000).count(), 35);
}

// ---------------------------------------------------------------------------
// S09: News log keeps the newest 10, newest first
// ---------------------------------------------------------------------------
#[test]
fn s09_news_cap_and_ordering() {
    let cfg = ReducerConfig {
        news_probability: 1.0,
        ..ReducerConfig::default()
    };
    let mut sim = Simulation::with_reducer_config(&sim_config(6, 8), cfg, 0);
    for t in 1..=15u64 {
        sim.dispatch(Action::TickUpdate { ts: t * 100 });
    }
    let state = sim.state();
    assert_eq!(state.news_events.len(), NEWS_CAPACITY);

    let ids: Vec<u64> = state.news_events.iter().map(|n| n.id).collect();
    assert_eq!(ids, (6..=15).rev().collect::<Vec<_>>());
    assert_eq!(state.news_events.latest().map(|n| n.timestamp), Some(1_500));
    assert!(state.news_events.iter().all(|n| n.impact.abs() <= 0.25));
}

// ---------------------------------------------------------------------------
// S10: Journal written to disk replays to the same state
// ---------------------------------------------------------------------------
#[test]
fn s10_journal_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("journal.jsonl");

    let mut sim = Simulation::new(&sim_config(9, 1234), 1_700_000_000_000);
    sim.advance_to(1_700_000_020_000);
    sim.dispatch(Action::SelectCompany { id: Some(CompanyId(4)) });
    sim.dispatch(Action::SetSimulationSpeed { ms: 50 });
    sim.advance_to(1_700_000_025_000);
    sim.write_journal(&path).unwrap();

    let journal = read_journal(BufReader::new(File::open(&path).unwrap())).unwrap();
    assert!(journal.bad_lines.is_empty());
    assert_eq!(journal.actions.len(), sim.journal().len());

    let outcome = replay(1234, journal.actions, sim.reducer_config());
    assert!(outcome.violations.is_empty());
    assert_eq!(outcome.state.digest(), sim.state().digest());
    assert_eq!(
        MarketOverview::from_state(&outcome.state),
        MarketOverview::from_state(sim.state())
    );
}

// ---------------------------------------------------------------------------
// S11: Empty population is inert
// ---------------------------------------------------------------------------
#[test]
fn s11_empty_population_is_inert() {
    let mut sim = Simulation::new(&sim_config(0, 2), 0);
    let before = sim.state().clone();
    sim.dispatch(Action::TickUpdate { ts: 100 });
    sim.dispatch(Action::HftBurst { ts: 200 });
    assert_eq!(sim.state(), &before);
    assert_eq!(sim.violations(), 0);
}

// ---------------------------------------------------------------------------
// S12: Trade history stays time-ordered across HFT rounds and ticks
// ---------------------------------------------------------------------------
#[test]
fn s12_history_time_ordered_across_bursts() {
    let mut sim = Simulation::new(&sim_config(300, 17), 0);
    sim.advance_to(1_000);
    let last_dispatch = sim.journal().iter().filter_map(|a| a.timestamp()).max();

    for c in sim.state().companies.values() {
        let times: Vec<u64> = c.trade_history.iter().map(|p| p.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]), "{} history out of order: {:?}", c.name, times);
    }
    let newest_trade = sim.state().hft_logs.iter().map(|l| l.timestamp).max();
    assert!(newest_trade.is_some());
    assert!(newest_trade <= last_dispatch);

    // tick right after a burst at the same instant
    let before = sim.state().clone();
    sim.dispatch(Action::HftBurst { ts: 1_050 });
    sim.dispatch(Action::TickUpdate { ts: 1_050 });
    for (id, c) in &sim.state().companies {
        let times: Vec<u64> = c.trade_history.iter().map(|p| p.time).collect();
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(c.trade_history.newest().map(|p| p.time), Some(1_050));
        assert!(before.companies[id].trade_history.newest().map(|p| p.time) <= Some(1_050));
    }
}

// ---------------------------------------------------------------------------
// S13: Extreme timestamps from a journal are applied, not rejected
// ---------------------------------------------------------------------------
#[test]
fn s13_max_timestamp_actions_are_total() {
    let cfg = ReducerConfig {
        hft_probability: 1.0,
        ..ReducerConfig::default()
    };
    let mut sim = Simulation::with_reducer_config(&sim_config(4, 5), cfg, 0);
    let action: Action = serde_json::from_str(r#"{"type":"HFT_BURST","ts":18446744073709551615}"#).unwrap();
    sim.dispatch(action);
    sim.dispatch(Action::TickUpdate { ts: u64::MAX });

    assert_eq!(sim.violations(), 0);
    assert_eq!(sim.state().hft_logs.len(), 20);
    assert!(sim.state().hft_logs.iter().all(|l| l.timestamp == u64::MAX));
}
