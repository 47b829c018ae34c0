use crate::engine::state::DEFAULT_SIMULATION_SPEED_MS;

pub const DEFAULT_COMPANY_NAMES: &[&str] = &[
    "Helix Dynamics",
    "Nordwind Capital",
    "Sakura Quantum",
    "Andes Lithium",
    "Oasis Petrochem",
    "Savanna Telecom",
    "Pinecrest Robotics",
    "Rhein Medical",
    "Lotus Consumer",
    "Pampas Agritech",
    "Falcon Grid",
    "Kilimanjaro Mining",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub seed: u64,
    pub company_names: Vec<String>,
    /// Milliseconds per tick
    pub simulation_speed_ms: u64,
    /// Milliseconds between HFT burst rounds
    pub hft_interval_ms: u64,
    /// Stop after this many ticks (0 = run until interrupted)
    pub ticks: u64,
    /// Ticks between digest checkpoints (0 = never)
    pub checkpoint_every: u64,
    /// Logical start time; 0 means take the wall clock
    pub start_ts_ms: u64,
    pub journal_path: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            seed: std::env::var("SEED").ok().and_then(|v| v.parse().ok()).unwrap_or(42),
            company_names: std::env::var("COMPANY_NAMES")
                .ok()
                .map(|v| parse_names(&v))
                .filter(|names| !names.is_empty())
                .unwrap_or_else(default_names),
            simulation_speed_ms: std::env::var("SIM_SPEED_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_SIMULATION_SPEED_MS),
            hft_interval_ms: std::env::var("HFT_INTERVAL_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(2500),
            ticks: std::env::var("TICKS").ok().and_then(|v| v.parse().ok()).unwrap_or(0),
            checkpoint_every: std::env::var("CHECKPOINT_EVERY").ok().and_then(|v| v.parse().ok()).unwrap_or(50),
            start_ts_ms: std::env::var("START_TS_MS").ok().and_then(|v| v.parse().ok()).unwrap_or(0),
            journal_path: std::env::var("JOURNAL_PATH").ok().filter(|v| !v.trim().is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: 42,
            company_names: default_names(),
            simulation_speed_ms: DEFAULT_SIMULATION_SPEED_MS,
            hft_interval_ms: 2500,
            ticks: 0,
            checkpoint_every: 50,
            start_ts_ms: 0,
            journal_path: None,
        }
    }
}

pub fn default_names() -> Vec<String> {
    DEFAULT_COMPANY_NAMES.iter().map(|s| s.to_string()).collect()
}

/// Comma-separated names, blanks dropped.
pub fn parse_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
