use anyhow::Result;
use chrono::Utc;
use serde_json::json;
use tokio::time::{interval_at, Duration, Instant};

use marketsim::config::Config;
use marketsim::engine::events::Action;
use marketsim::logging::{self, obj, v_str, Domain, Level};
use marketsim::runner::Simulation;
use marketsim::view::MarketOverview;

fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let start_ts = if cfg.start_ts_ms > 0 { cfg.start_ts_ms } else { now_ms() };
    // logical clock anchored at start_ts
    let wall_origin = now_ms();
    let clock = move || start_ts.saturating_add(now_ms().saturating_sub(wall_origin));

    let mut sim = Simulation::new(&cfg, start_ts);

    logging::log(
        Level::Info,
        Domain::System,
        "start",
        obj(&[
            ("run_id", v_str(&logging::run_id())),
            ("seed", json!(cfg.seed)),
            ("companies", json!(sim.state().companies.len())),
            ("speed_ms", json!(sim.state().control.simulation_speed)),
            ("hft_interval_ms", json!(cfg.hft_interval_ms)),
            ("ticks", json!(cfg.ticks)),
        ]),
    );

    let tick_period = Duration::from_millis(sim.state().control.simulation_speed.max(1));
    let hft_enabled = cfg.hft_interval_ms > 0;
    let hft_period = Duration::from_millis(cfg.hft_interval_ms.max(1));
    let mut tick_timer = interval_at(Instant::now() + tick_period, tick_period);
    let mut hft_timer = interval_at(Instant::now() + hft_period, hft_period);

    let stop_at = (cfg.ticks > 0).then(|| sim.state().time + cfg.ticks);

    loop {
        tokio::select! {
            _ = tick_timer.tick() => {
                let before = sim.state().time;
                sim.dispatch(Action::TickUpdate { ts: clock() });
                if sim.state().time == before {
                    logging::log(
                        Level::Warn,
                        Domain::System,
                        "idle",
                        obj(&[("msg", v_str("no companies registered; nothing to simulate"))]),
                    );
                    break;
                }
                if stop_at.is_some_and(|t| sim.state().time >= t) {
                    break;
                }
            }
            _ = hft_timer.tick(), if hft_enabled => {
                sim.dispatch(Action::HftBurst { ts: clock() });
            }
            _ = tokio::signal::ctrl_c() => {
                logging::log(Level::Info, Domain::System, "interrupt", obj(&[]));
                break;
            }
        }
    }

    logging::log_checkpoint(sim.state(), sim.journal().len());
    logging::log(
        Level::Info,
        Domain::System,
        "stop",
        obj(&[
            ("time", json!(sim.state().time)),
            ("actions", json!(sim.journal().len())),
            ("violations", json!(sim.violations())),
        ]),
    );

    println!("{}", serde_json::to_string(&MarketOverview::from_state(sim.state()))?);

    if let Some(path) = &cfg.journal_path {
        sim.write_journal(path)?;
        logging::log(Level::Info, Domain::System, "journal_written", obj(&[("path", v_str(path))]));
    }

    logging::flush();
    Ok(())
}
