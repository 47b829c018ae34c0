//! Pure reducer: (State, Action, Rng) -> State
//!
//! This is the core of deterministic replay. Every transition builds a new
//! [`AppState`] from the previous one; the input is never modified. All
//! randomness comes from the injected generator, so a fixed seed and a fixed
//! action sequence always reproduce the same state.
//!
//! ## Tick order
//!
//! | Step | What                        | Reads                    |
//! |------|-----------------------------|--------------------------|
//! | 1    | Region random walk          | input regions            |
//! | 2    | News roll (≤ 1 event)       | id counter               |
//! | 3    | Per-company drift           | regions from 1, news from 2 |
//! | 4    | History append              | new index                |
//! | 5    | `time += 1`                 |                          |

use rand::Rng;

use super::dynamics::{bound_index, compute_drift, evolve_region, DriftNoise};
use super::events::{Action, Timestamp};
use super::hft::run_burst;
use super::news;
use super::state::{AppState, Company, CompanyId, RegionBook, ViewMode};

/// Numeric parameters of the model.
#[derive(Debug, Clone)]
pub struct ReducerConfig {
    // === Index bounds ===
    pub index_floor: f64,
    pub index_ceiling: f64,
    /// Max distance inside a violated bound for the redraw
    pub redraw_width: f64,

    // === Region random walk ===
    pub region_risk_step: f64,
    pub region_growth_step: f64,
    pub growth_bound: f64,

    // === News ===
    pub news_probability: f64,
    pub news_impact_max: f64,
    pub news_weight: f64,

    // === Drift weights ===
    pub sentiment_weight: f64,
    pub sentiment_jitter: f64,
    pub volatility_shock: f64,
    pub risk_drag: f64,
    pub growth_lift: f64,
    pub geo_drag: f64,
    pub esg_pivot: f64,
    pub esg_weight: f64,
    pub debt_drag: f64,
    pub meme_weight: f64,

    // === HFT bursts ===
    pub hft_probability: f64,
    pub burst_len: usize,
    pub volume_min: u32,
    pub volume_max: u32,
    /// Volume at which a trade moves price by the nominal step
    pub volume_ref: f64,
    pub hft_step: f64,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            index_floor: 800.0,
            index_ceiling: 1800.0,
            redraw_width: 50.0,

            region_risk_step: 0.005,
            region_growth_step: 0.00025,
            growth_bound: 0.1,

            news_probability: 0.05,
            news_impact_max: 0.25,
            news_weight: 0.01,

            sentiment_weight: 0.005,
            sentiment_jitter: 0.0005,
            volatility_shock: 0.05,
            risk_drag: 0.002,
            growth_lift: 0.1,
            geo_drag: 0.001,
            esg_pivot: 60.0,
            esg_weight: 0.005,
            debt_drag: 0.001,
            meme_weight: 0.2,

            hft_probability: 0.2,
            burst_len: 5,
            volume_min: 100,
            volume_max: 1100,
            volume_ref: 500.0,
            hft_step: 0.005,
        }
    }
}

/// Apply one action to `state` and return the next state.
pub fn reduce<R: Rng + ?Sized>(
    state: &AppState,
    action: Action,
    rng: &mut R,
    cfg: &ReducerConfig,
) -> AppState {
    match action {
        Action::Init { companies, regions } => init(state, companies, regions),
        Action::TickUpdate { ts } => tick(state, ts, rng, cfg),
        Action::HftBurst { ts } => run_burst(state, ts, rng, cfg),
        Action::ChangeView { view } => change_view(state, view),
        Action::SelectCompany { id } => select_company(state, id),
        Action::SetSimulationSpeed { ms } => {
            let mut next = state.clone();
            next.control.simulation_speed = ms;
            next
        }
        Action::Unknown => state.clone(),
    }
}

fn init(state: &AppState, companies: Vec<Company>, regions: RegionBook) -> AppState {
    let mut next = state.clone();
    next.companies = companies.into_iter().map(|c| (c.id, c)).collect();
    next.regions = regions;
    next.control.selected_company = next.companies.keys().next().copied();
    next
}

fn change_view(state: &AppState, view: ViewMode) -> AppState {
    let mut next = state.clone();
    next.control.view = view;
    next.control.selected_company = None;
    next
}

fn select_company(state: &AppState, id: Option<CompanyId>) -> AppState {
    let mut next = state.clone();
    next.control.selected_company = id;
    next
}

/// One simulation step. A state with no companies is returned unchanged.
pub fn tick<R: Rng + ?Sized>(
    state: &AppState,
    ts: Timestamp,
    rng: &mut R,
    cfg: &ReducerConfig,
) -> AppState {
    if state.companies.is_empty() {
        return state.clone();
    }

    let mut next = state.clone();

    // 1. regions
    for (region, data) in state.regions.iter() {
        next.regions.set(region, evolve_region(data, rng, cfg));
    }

    // 2. news
    if let Some(event) = news::generate(rng, state.next_news_id, ts, cfg) {
        next.next_news_id += 1;
        next.news_events.prepend(event);
    }

    // 3 + 4. drift and history, from the input company snapshot
    for (id, company) in &state.companies {
        let noise = DriftNoise::sample(rng, company, cfg);
        let drift = compute_drift(company, &next.regions, next.news_events.iter(), &noise, cfg);
        let index = bound_index(company.index * (1.0 + drift.total()), rng, cfg);

        if let Some(updated) = next.companies.get_mut(id) {
            updated.index = index;
            updated.record(index, ts);
        }
    }

    // 5. clock
    next.time += 1;
    next
}
