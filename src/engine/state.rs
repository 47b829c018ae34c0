//! Simulation state with a deterministic digest for replay validation.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::events::{Timestamp, TradeSide};
use super::ring::{FeedLog, RingBuffer};

pub const REGION_COUNT: usize = 6;
pub const HISTORY_CAPACITY: usize = 50;
pub const NEWS_CAPACITY: usize = 10;
pub const HFT_LOG_CAPACITY: usize = 100;
pub const DEFAULT_SIMULATION_SPEED_MS: u64 = 1000;

// =============================================================================
// Regions and sectors
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    NorthAmerica,
    Europe,
    Asia,
    LatinAmerica,
    MiddleEast,
    Africa,
}

impl Region {
    pub const ALL: [Region; REGION_COUNT] = [
        Region::NorthAmerica,
        Region::Europe,
        Region::Asia,
        Region::LatinAmerica,
        Region::MiddleEast,
        Region::Africa,
    ];

    /// Slot in a [`RegionBook`].
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Region::NorthAmerica => "North America",
            Region::Europe => "Europe",
            Region::Asia => "Asia",
            Region::LatinAmerica => "Latin America",
            Region::MiddleEast => "Middle East",
            Region::Africa => "Africa",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Finance,
    Energy,
    Healthcare,
    Industrials,
    Consumer,
    Telecom,
    Materials,
}

impl Sector {
    pub const ALL: [Sector; 8] = [
        Sector::Technology,
        Sector::Finance,
        Sector::Energy,
        Sector::Healthcare,
        Sector::Industrials,
        Sector::Consumer,
        Sector::Telecom,
        Sector::Materials,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Technology => "Technology",
            Sector::Finance => "Finance",
            Sector::Energy => "Energy",
            Sector::Healthcare => "Healthcare",
            Sector::Industrials => "Industrials",
            Sector::Consumer => "Consumer",
            Sector::Telecom => "Telecom",
            Sector::Materials => "Materials",
        }
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Macro state of one region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionData {
    /// 0.0 (calm) ..= 1.0 (crisis)
    pub risk: f64,
    /// -0.1 ..= 0.1 per-tick growth signal
    pub economic_growth: f64,
}

impl Default for RegionData {
    fn default() -> Self {
        Self {
            risk: 0.0,
            economic_growth: 0.0,
        }
    }
}

/// Exactly one [`RegionData`] per [`Region`], indexed by the enum.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegionBook {
    slots: [RegionData; REGION_COUNT],
}

impl RegionBook {
    pub fn new(slots: [RegionData; REGION_COUNT]) -> Self {
        Self { slots }
    }

    pub fn get(&self, region: Region) -> &RegionData {
        &self.slots[region.index()]
    }

    pub fn get_mut(&mut self, region: Region) -> &mut RegionData {
        &mut self.slots[region.index()]
    }

    pub fn set(&mut self, region: Region, data: RegionData) {
        self.slots[region.index()] = data;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Region, &RegionData)> {
        Region::ALL
            .into_iter()
            .map(move |r| (r, &self.slots[r.index()]))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

// =============================================================================
// Companies
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyId(pub u32);

impl fmt::Display for CompanyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// One point of a company's rolling price history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradePoint {
    pub price: f64,
    pub time: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastTrade {
    pub price: f64,
    pub size: u32,
    pub time: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub region: Region,
    pub sector: Sector,

    /// Price index, kept inside [800, 1800]
    pub index: f64,
    /// 0.1 ..= 2.0
    pub volatility: f64,
    /// -1.0 ..= 1.0
    pub sentiment: f64,
    pub ai_confidence: f64,
    pub quantum_risk: f64,
    pub dao_influence: f64,
    /// 0 ..= 100
    pub esg_score: f64,
    pub debt_ratio: f64,
    pub meme_factor: f64,

    /// Sensitivity to every other region's risk (own region excluded)
    pub geopolitical_exposure: BTreeMap<Region, f64>,

    pub last_trade: LastTrade,
    pub trade_history: RingBuffer<TradePoint>,
}

impl Company {
    pub fn exposure_to(&self, region: Region) -> f64 {
        self.geopolitical_exposure.get(&region).copied().unwrap_or(0.0)
    }

    /// Record a price print in the history ring.
    pub fn record(&mut self, price: f64, time: Timestamp) {
        self.trade_history.push(TradePoint { price, time });
    }
}

// =============================================================================
// Feeds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum NewsTarget {
    Sector(Sector),
    Region(Region),
}

impl NewsTarget {
    pub fn matches(&self, company: &Company) -> bool {
        match self {
            NewsTarget::Sector(s) => *s == company.sector,
            NewsTarget::Region(r) => *r == company.region,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NewsTarget::Sector(s) => s.as_str(),
            NewsTarget::Region(r) => r.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub id: u64,
    pub title: String,
    pub target: NewsTarget,
    /// -0.25 ..= 0.25
    pub impact: f64,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HftLog {
    pub id: u64,
    pub company_id: CompanyId,
    pub company_name: String,
    pub side: TradeSide,
    pub price: f64,
    pub volume: u32,
    pub timestamp: Timestamp,
    pub algo: String,
}

// =============================================================================
// Control surface
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Global,
    Regional,
    Sector,
    Company,
    Hft,
}

/// UI-facing fields. Not touched by the numeric core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlSurface {
    pub view: ViewMode,
    pub selected_company: Option<CompanyId>,
    /// Milliseconds per tick
    pub simulation_speed: u64,
}

impl Default for ControlSurface {
    fn default() -> Self {
        Self {
            view: ViewMode::Global,
            selected_company: None,
            simulation_speed: DEFAULT_SIMULATION_SPEED_MS,
        }
    }
}

// =============================================================================
// AppState
// =============================================================================

/// Complete simulation state. Transitions build a new value from an old one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    pub companies: BTreeMap<CompanyId, Company>,
    pub regions: RegionBook,
    pub news_events: FeedLog<NewsEvent>,
    pub hft_logs: FeedLog<HftLog>,

    /// Tick counter, +1 per TICK_UPDATE
    pub time: u64,

    pub control: ControlSurface,

    /// Next id minted for a news event / HFT trade
    pub next_news_id: u64,
    pub next_trade_id: u64,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            companies: BTreeMap::new(),
            regions: RegionBook::default(),
            news_events: FeedLog::new(NEWS_CAPACITY),
            hft_logs: FeedLog::new(HFT_LOG_CAPACITY),
            time: 0,
            control: ControlSurface::default(),
            next_news_id: 1,
            next_trade_id: 1,
        }
    }

    pub fn company(&self, id: CompanyId) -> Option<&Company> {
        self.companies.get(&id)
    }

    pub fn selected(&self) -> Option<&Company> {
        self.control.selected_company.and_then(|id| self.company(id))
    }

    /// SHA-256 over the canonical JSON form. Identical states give identical
    /// digests, which is what the replay and golden tests compare.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        hex::encode(Sha256::digest(&bytes))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
