//! Actions consumed by the reducer.
//!
//! The set is closed. Journal lines with an unrecognized `type` decode to
//! [`Action::Unknown`], which the reducer treats as a no-op.

use serde::{Deserialize, Serialize};

use super::state::{Company, CompanyId, RegionBook, ViewMode};

/// Milliseconds since the Unix epoch (or any monotonic origin the driver picks).
pub type Timestamp = u64;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Replace the entity population and select the first company.
    ///
    /// Companies travel as a list; the reducer keys them by id.
    Init {
        companies: Vec<Company>,
        regions: RegionBook,
    },
    /// One simulation step.
    TickUpdate { ts: Timestamp },
    /// One round of high-frequency micro-trades.
    HftBurst { ts: Timestamp },
    ChangeView { view: ViewMode },
    SelectCompany { id: Option<CompanyId> },
    SetSimulationSpeed { ms: u64 },
    #[serde(other)]
    Unknown,
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::Init { .. } => "INIT",
            Action::TickUpdate { .. } => "TICK_UPDATE",
            Action::HftBurst { .. } => "HFT_BURST",
            Action::ChangeView { .. } => "CHANGE_VIEW",
            Action::SelectCompany { .. } => "SELECT_COMPANY",
            Action::SetSimulationSpeed { .. } => "SET_SIMULATION_SPEED",
            Action::Unknown => "UNKNOWN",
        }
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        match self {
            Action::TickUpdate { ts } | Action::HftBurst { ts } => Some(*ts),
            _ => None,
        }
    }
}

/// Side of an HFT micro-trade, classified from the realized price move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    /// A falling print is a buy, a rising (or flat) one a sell.
    pub fn from_price_delta(delta: f64) -> Self {
        if delta < 0.0 {
            TradeSide::Buy
        } else {
            TradeSide::Sell
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeSide::Buy => "BUY",
            TradeSide::Sell => "SELL",
        }
    }
}
