//! Market simulation engine with deterministic replay semantics.
//!
//! Architecture:
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │    Driver    │────►│    Action    │────►│   Reducer    │
//! │  (timers)    │     │  (ordered)   │     │  (pure fn)   │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!        ▲                                         │
//!        │                                         ▼
//!        │             ┌──────────────┐     ┌──────────────┐
//!        └─────────────│  Read model  │◄────│   AppState   │
//!                      │   (view)     │     │  (digested)  │
//!                      └──────────────┘     └──────────────┘
//! ```
//!
//! The reducer composes region evolution, the news generator and the price
//! dynamics model on `TICK_UPDATE`, and runs the HFT burst subsystem on
//! `HFT_BURST`. Randomness is injected; nothing in here reads a clock.

pub mod dynamics;
pub mod events;
pub mod hft;
pub mod news;
pub mod reducer;
pub mod registry;
pub mod ring;
pub mod state;

pub use events::{Action, Timestamp, TradeSide};
pub use reducer::{reduce, ReducerConfig};
pub use state::{AppState, Company, CompanyId, Region, Sector, ViewMode};
