//! Simulation driver: owns the state, the RNG and the two cadences.
//!
//! ```text
//! advance_to(now) ──► due TICK_UPDATE / HFT_BURST in time order
//!                         │
//!                         ▼
//!                  dispatch(action) ──► reduce ──► verify ──► log ──► journal
//! ```

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

use crate::config::Config;
use crate::engine::events::{Action, Timestamp};
use crate::engine::reducer::{reduce, ReducerConfig};
use crate::engine::registry;
use crate::engine::state::AppState;
use crate::logging::{self, obj, v_str, Domain, Level, ProfileScope};
use crate::verify::invariants::{assert_state_invariants, assert_transition, InvariantViolation};

/// RNG for the entity registry.
pub fn registry_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// RNG threaded through the reducer. Separate from the registry stream so a
/// journal (which carries the INIT payload) replays from the seed alone.
pub fn engine_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed.rotate_left(32) ^ 0x9E37_79B9_7F4A_7C15)
}

pub struct Simulation {
    state: AppState,
    rng: StdRng,
    cfg: ReducerConfig,
    journal: Vec<Action>,
    next_tick_at: Option<Timestamp>,
    next_hft_at: Option<Timestamp>,
    hft_interval_ms: u64,
    checkpoint_every: u64,
    violations: u64,
}

impl Simulation {
    pub fn new(config: &Config, start_ts: Timestamp) -> Self {
        Self::with_reducer_config(config, ReducerConfig::default(), start_ts)
    }

    /// Build the population, dispatch INIT and apply the configured speed.
    pub fn with_reducer_config(config: &Config, cfg: ReducerConfig, start_ts: Timestamp) -> Self {
        let (companies, regions) =
            registry::initialize(&config.company_names, start_ts, &mut registry_rng(config.seed));

        let mut sim = Self {
            state: AppState::new(),
            rng: engine_rng(config.seed),
            cfg,
            journal: Vec::new(),
            next_tick_at: None,
            next_hft_at: None,
            hft_interval_ms: config.hft_interval_ms,
            checkpoint_every: config.checkpoint_every,
            violations: 0,
        };

        sim.dispatch(Action::Init {
            companies: companies.into_values().collect(),
            regions,
        });
        sim.dispatch(Action::SetSimulationSpeed {
            ms: config.simulation_speed_ms,
        });
        sim.next_tick_at = start_ts.checked_add(sim.tick_period());
        sim.next_hft_at = start_ts
            .checked_add(config.hft_interval_ms)
            .filter(|_| config.hft_interval_ms > 0);
        sim
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn reducer_config(&self) -> &ReducerConfig {
        &self.cfg
    }

    pub fn journal(&self) -> &[Action] {
        &self.journal
    }

    /// Number of invariant violations observed so far.
    pub fn violations(&self) -> u64 {
        self.violations
    }

    fn tick_period(&self) -> u64 {
        self.state.control.simulation_speed.max(1)
    }

    /// Apply one action, check invariants, log what happened.
    pub fn dispatch(&mut self, action: Action) -> &AppState {
        let next = {
            let _p = ProfileScope::with_context("dispatch", &[("action", v_str(action.kind()))]);
            reduce(&self.state, action.clone(), &mut self.rng, &self.cfg)
        };

        if let Err(v) = self.check(&next, &action) {
            self.violations += 1;
            logging::log_invariant_violation(action.kind(), &v.msg);
        }
        self.report(&next, &action);

        self.journal.push(action);
        self.state = next;
        &self.state
    }

    fn check(&self, next: &AppState, action: &Action) -> Result<(), InvariantViolation> {
        assert_state_invariants(next, &self.cfg)?;
        assert_transition(&self.state, next, action)
    }

    fn report(&self, next: &AppState, action: &Action) {
        let prev = &self.state;
        match action {
            Action::Init { .. } => logging::log(
                Level::Info,
                Domain::System,
                "init",
                obj(&[
                    ("companies", json!(next.companies.len())),
                    ("selected", json!(next.control.selected_company)),
                ]),
            ),
            Action::TickUpdate { .. } => {
                if next.next_news_id > prev.next_news_id {
                    if let Some(event) = next.news_events.latest() {
                        logging::log_news(event);
                    }
                }
                logging::log_tick_summary(next);
                if self.checkpoint_every > 0
                    && next.time > prev.time
                    && next.time % self.checkpoint_every == 0
                {
                    logging::log_region_snapshot(next);
                    logging::log_checkpoint(next, self.journal.len() + 1);
                }
            }
            Action::HftBurst { ts } => {
                let trades = next.next_trade_id - prev.next_trade_id;
                if trades > 0 {
                    let touched = next
                        .companies
                        .iter()
                        .filter(|(id, c)| prev.companies.get(*id) != Some(*c))
                        .count();
                    logging::log_hft_burst(*ts, trades, touched, next.hft_logs.len());
                }
            }
            Action::ChangeView { view } => logging::log_control(action.kind(), json!({ "view": view })),
            Action::SelectCompany { id } => logging::log_control(action.kind(), json!({ "id": id })),
            Action::SetSimulationSpeed { ms } => logging::log_control(action.kind(), json!({ "ms": ms })),
            Action::Unknown => logging::log(
                Level::Warn,
                Domain::System,
                "unknown_action",
                obj(&[("msg", v_str("ignored unrecognized action"))]),
            ),
        }
    }

    /// Dispatch every tick and HFT round due at or before `now`, in time
    /// order (a tick goes first when both fall on the same instant).
    /// A cadence whose next slot would pass `Timestamp::MAX` stops.
    /// Returns the number of actions dispatched.
    pub fn advance_to(&mut self, now: Timestamp) -> usize {
        let mut dispatched = 0;
        loop {
            let tick = self.next_tick_at.filter(|t| *t <= now);
            let hft = self.next_hft_at.filter(|t| *t <= now);
            let take_tick = match (tick, hft) {
                (None, None) => break,
                (Some(t), Some(h)) => t <= h,
                (Some(_), None) => true,
                (None, Some(_)) => false,
            };

            if let (true, Some(ts)) = (take_tick, tick) {
                self.dispatch(Action::TickUpdate { ts });
                self.next_tick_at = ts.checked_add(self.tick_period());
            } else if let Some(ts) = hft {
                self.dispatch(Action::HftBurst { ts });
                self.next_hft_at = ts.checked_add(self.hft_interval_ms);
            }
            dispatched += 1;
        }
        dispatched
    }

    /// Run exactly `n` ticks, with HFT rounds interleaved on their cadence.
    pub fn run_ticks(&mut self, n: u64) {
        let target = self.state.time.saturating_add(n);
        while self.state.time < target {
            let before = self.state.time;
            let Some(horizon) = self.next_tick_at else {
                break;
            };
            self.advance_to(horizon);
            if self.state.time == before {
                // no companies: ticks are no-ops and time never moves
                break;
            }
        }
    }

    pub fn write_journal(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).with_context(|| format!("create journal {}", path.display()))?;
        let mut w = BufWriter::new(file);
        for action in &self.journal {
            serde_json::to_writer(&mut w, action)?;
            writeln!(w)?;
        }
        w.flush()?;
        Ok(())
    }
}

/// Parsed journal plus the lines that could not be decoded.
#[derive(Debug)]
pub struct Journal {
    pub actions: Vec<Action>,
    pub bad_lines: Vec<(usize, String)>,
}

/// Read a JSON-lines action journal. Blank lines are skipped; malformed
/// lines are collected, not fatal.
pub fn read_journal(reader: impl BufRead) -> Result<Journal> {
    let mut actions = Vec::new();
    let mut bad_lines = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read journal line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Action>(&line) {
            Ok(a) => actions.push(a),
            Err(err) => bad_lines.push((i + 1, err.to_string())),
        }
    }
    Ok(Journal { actions, bad_lines })
}

/// Result of replaying a journal from an empty state.
#[derive(Debug)]
pub struct ReplayOutcome {
    pub state: AppState,
    pub applied: usize,
    pub violations: Vec<(usize, InvariantViolation)>,
}

/// Re-run `actions` with the engine RNG for `seed`. With the seed that
/// produced the journal this reproduces the original final state.
pub fn replay(
    seed: u64,
    actions: impl IntoIterator<Item = Action>,
    cfg: &ReducerConfig,
) -> ReplayOutcome {
    let mut rng = engine_rng(seed);
    let mut state = AppState::new();
    let mut violations = Vec::new();
    let mut applied = 0;

    for (i, action) in actions.into_iter().enumerate() {
        let next = reduce(&state, action.clone(), &mut rng, cfg);
        if let Err(v) = assert_state_invariants(&next, cfg)
            .and_then(|_| assert_transition(&state, &next, &action))
        {
            violations.push((i, v));
        }
        state = next;
        applied += 1;
    }

    ReplayOutcome {
        state,
        applied,
        violations,
    }
}
