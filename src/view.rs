//! Read model for the rendering layer.
//!
//! Derived, display-oriented figures computed from an [`AppState`]. Nothing
//! here feeds back into the simulation.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::state::{AppState, Company, CompanyId, Region, Sector};

const MOVERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompanyQuote {
    pub id: CompanyId,
    pub name: String,
    pub region: Region,
    pub sector: Sector,
    pub index: f64,
    /// Percent move against the oldest point in the history window
    pub change_pct: f64,
}

impl CompanyQuote {
    pub fn from_company(c: &Company) -> Self {
        let base = c.trade_history.oldest().map(|p| p.price).unwrap_or(c.index);
        let change_pct = if base > 0.0 {
            (c.index / base - 1.0) * 100.0
        } else {
            0.0
        };
        Self {
            id: c.id,
            name: c.name.clone(),
            region: c.region,
            sector: c.sector,
            index: c.index,
            change_pct,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GroupStats {
    pub companies: usize,
    pub avg_index: f64,
    pub avg_change_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionRisk {
    pub region: Region,
    pub risk: f64,
    pub economic_growth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    pub time: u64,
    pub composite: f64,
    pub gainers: Vec<CompanyQuote>,
    pub losers: Vec<CompanyQuote>,
    pub by_sector: BTreeMap<Sector, GroupStats>,
    pub by_region: BTreeMap<Region, GroupStats>,
    /// Highest risk first
    pub risk_ranking: Vec<RegionRisk>,
    pub selected: Option<CompanyQuote>,
}

impl MarketOverview {
    pub fn from_state(state: &AppState) -> Self {
        let quotes: Vec<CompanyQuote> = state.companies.values().map(CompanyQuote::from_company).collect();

        let composite = if quotes.is_empty() {
            0.0
        } else {
            quotes.iter().map(|q| q.index).sum::<f64>() / quotes.len() as f64
        };

        let mut ranked = quotes.clone();
        ranked.sort_by(|a, b| {
            b.change_pct
                .total_cmp(&a.change_pct)
                .then_with(|| a.id.cmp(&b.id))
        });
        let gainers: Vec<_> = ranked.iter().take(MOVERS).cloned().collect();
        let mut losers: Vec<_> = ranked.iter().rev().take(MOVERS).cloned().collect();
        losers.sort_by(|a, b| {
            a.change_pct
                .total_cmp(&b.change_pct)
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut risk_ranking: Vec<RegionRisk> = state
            .regions
            .iter()
            .map(|(region, d)| RegionRisk {
                region,
                risk: d.risk,
                economic_growth: d.economic_growth,
            })
            .collect();
        risk_ranking.sort_by(|a, b| b.risk.total_cmp(&a.risk).then_with(|| a.region.cmp(&b.region)));

        Self {
            time: state.time,
            composite,
            gainers,
            losers,
            by_sector: group_by(&quotes, |q| q.sector),
            by_region: group_by(&quotes, |q| q.region),
            risk_ranking,
            selected: state.selected().map(CompanyQuote::from_company),
        }
    }
}

fn group_by<K: Ord>(quotes: &[CompanyQuote], key: impl Fn(&CompanyQuote) -> K) -> BTreeMap<K, GroupStats> {
    let mut groups: BTreeMap<K, (usize, f64, f64)> = BTreeMap::new();
    for q in quotes {
        let g = groups.entry(key(q)).or_insert((0, 0.0, 0.0));
        g.0 += 1;
        g.1 += q.index;
        g.2 += q.change_pct;
    }
    groups
        .into_iter()
        .map(|(k, (n, idx, chg))| {
            (
                k,
                GroupStats {
                    companies: n,
                    avg_index: idx / n as f64,
                    avg_change_pct: chg / n as f64,
                },
            )
        })
        .collect()
}
