//! Entity registry: builds the company population and the region book once,
//! before the first INIT dispatch.

use std::collections::BTreeMap;

use rand::Rng;

use super::events::Timestamp;
use super::state::{
    Company, CompanyId, LastTrade, Region, RegionBook, RegionData, Sector, TradePoint,
    DEFAULT_SIMULATION_SPEED_MS, HISTORY_CAPACITY,
};
use super::ring::RingBuffer;

/// Create one company per name plus initial regional conditions.
///
/// Region and sector are assigned round-robin by position in `names`. The
/// history is pre-filled with `HISTORY_CAPACITY` points around the opening
/// index, one default tick apart and ending at `now`.
pub fn initialize<R: Rng + ?Sized>(
    names: &[String],
    now: Timestamp,
    rng: &mut R,
) -> (BTreeMap<CompanyId, Company>, RegionBook) {
    let mut companies = BTreeMap::new();
    for (i, name) in names.iter().enumerate() {
        let company = spawn_company(i as u32, name, now, rng);
        companies.insert(company.id, company);
    }
    (companies, initial_regions(rng))
}

fn spawn_company<R: Rng + ?Sized>(
    i: u32,
    name: &str,
    now: Timestamp,
    rng: &mut R,
) -> Company {
    let region = Region::ALL[i as usize % Region::ALL.len()];
    let sector = Sector::ALL[i as usize % Sector::ALL.len()];
    let index: f64 = rng.gen_range(1000.0..1500.0);

    let geopolitical_exposure = Region::ALL
        .into_iter()
        .filter(|r| *r != region)
        .map(|r| (r, rng.gen_range(0.0..=1.0)))
        .collect();

    let mut trade_history = RingBuffer::new(HISTORY_CAPACITY);
    for k in 0..HISTORY_CAPACITY {
        let age = (HISTORY_CAPACITY - 1 - k) as u64 * DEFAULT_SIMULATION_SPEED_MS;
        trade_history.push(TradePoint {
            price: index * (1.0 + rng.gen_range(-0.01..0.01)),
            time: now.saturating_sub(age),
        });
    }

    let skew: f64 = rng.gen();
    let volatility = 0.1 + 1.9 * skew * skew;
    let sentiment = rng.gen_range(-1.0..=1.0);
    let ai_confidence = rng.gen_range(0.0..=1.0);
    let quantum_risk = rng.gen_range(0.0..=1.0f64).powi(2);
    let dao_influence = rng.gen_range(0.0..=1.0);
    let esg_score = rng.gen_range(0.0..=100.0);
    let debt_ratio = rng.gen_range(0.0..=1.0);
    let meme_factor = rng.gen_range(0.0..=1.0f64).powi(3);
    let size = rng.gen_range(100..=1100);

    Company {
        id: CompanyId(i),
        name: name.to_string(),
        region,
        sector,
        index,
        volatility,
        sentiment,
        ai_confidence,
        quantum_risk,
        dao_influence,
        esg_score,
        debt_ratio,
        meme_factor,
        geopolitical_exposure,
        last_trade: LastTrade {
            price: index,
            size,
            time: now,
        },
        trade_history,
    }
}

fn initial_regions<R: Rng + ?Sized>(rng: &mut R) -> RegionBook {
    let mut book = RegionBook::default();
    for region in Region::ALL {
        book.set(
            region,
            RegionData {
                risk: rng.gen_range(0.0..=0.3),
                economic_growth: rng.gen_range(-0.4..=0.1) * 0.01,
            },
        );
    }
    book
}

/// Deterministic company with mid-range attributes and a flat, full history.
///
/// Used to build hand-crafted scenarios without going through the RNG.
pub fn blank_company(id: u32, name: &str, region: Region, sector: Sector, index: f64) -> Company {
    let geopolitical_exposure = Region::ALL
        .into_iter()
        .filter(|r| *r != region)
        .map(|r| (r, 0.5))
        .collect();

    let mut trade_history = RingBuffer::new(HISTORY_CAPACITY);
    for k in 0..HISTORY_CAPACITY {
        trade_history.push(TradePoint {
            price: index,
            time: k as u64,
        });
    }

    Company {
        id: CompanyId(id),
        name: name.to_string(),
        region,
        sector,
        index,
        volatility: 1.0,
        sentiment: 0.0,
        ai_confidence: 0.5,
        quantum_risk: 0.5,
        dao_influence: 0.5,
        esg_score: 60.0,
        debt_ratio: 0.5,
        meme_factor: 0.0,
        geopolitical_exposure,
        last_trade: LastTrade {
            price: index,
            size: 0,
            time: 0,
        },
        trade_history,
    }
}
