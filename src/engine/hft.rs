//! High-frequency burst subsystem.
//!
//! Each company independently has a chance to receive a burst of rapid
//! micro-trades. The trade side is read off the realized price move, not
//! chosen up front.

use rand::Rng;

use super::dynamics::{bound_index, jitter};
use super::events::{Timestamp, TradeSide};
use super::reducer::ReducerConfig;
use super::state::{AppState, Company, HftLog, LastTrade};

pub const ALGO_TAGS: &[&str] = &["MM-CORE", "STAT-ARB", "MOMENTUM-7", "ICEBERG", "LATENCY-ARB"];

/// Run one burst round over every company and return the resulting state.
///
/// Every trade in the round carries the dispatch time `ts`; the trade id
/// orders trades within the round.
pub fn run_burst<R: Rng + ?Sized>(
    state: &AppState,
    ts: Timestamp,
    rng: &mut R,
    cfg: &ReducerConfig,
) -> AppState {
    let mut next = state.clone();
    let probability = cfg.hft_probability.clamp(0.0, 1.0);

    for company in state.companies.values() {
        if !rng.gen_bool(probability) {
            continue;
        }

        let algo = ALGO_TAGS[rng.gen_range(0..ALGO_TAGS.len())];
        let mut updated = company.clone();
        let trades = burst_company(&mut updated, algo, ts, next.next_trade_id, rng, cfg);

        next.next_trade_id += trades.len() as u64;
        for trade in trades {
            next.hft_logs.prepend(trade);
        }
        next.companies.insert(updated.id, updated);
    }

    next
}

/// Apply one burst to `company` in place and return its trades, oldest first.
pub fn burst_company<R: Rng + ?Sized>(
    company: &mut Company,
    algo: &str,
    ts: Timestamp,
    first_id: u64,
    rng: &mut R,
    cfg: &ReducerConfig,
) -> Vec<HftLog> {
    let mut trades = Vec::with_capacity(cfg.burst_len);
    let mut price = company.index;
    let (vmin, vmax) = (cfg.volume_min.min(cfg.volume_max), cfg.volume_max.max(cfg.volume_min));

    for k in 0..cfg.burst_len {
        let volume: u32 = rng.gen_range(vmin..=vmax);
        let shock = jitter(rng, 0.5) * cfg.hft_step * (volume as f64 / cfg.volume_ref);

        let realized = bound_index(price * (1.0 + shock), rng, cfg);
        trades.push(HftLog {
            id: first_id.saturating_add(k as u64),
            company_id: company.id,
            company_name: company.name.clone(),
            side: TradeSide::from_price_delta(realized - price),
            price: realized,
            volume,
            timestamp: ts,
            algo: algo.to_string(),
        });

        company.record(realized, ts);
        company.last_trade = LastTrade {
            price: realized,
            size: volume,
            time: ts,
        };
        price = realized;
    }

    company.index = price;
    trades
}
