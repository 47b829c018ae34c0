//! Structured JSON-lines logging for the simulation driver.
//!
//! Design goals:
//! 1. Multi-level granularity (TRACE → FATAL)
//! 2. Domain categories for filtering (market, news, hft, ...)
//! 3. Periodic checkpoints carrying the state digest for replay audits
//!
//! The reducer never logs; the runner reports what each dispatch did.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::time::Instant;

use crate::engine::state::{AppState, NewsEvent};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        Self::parse(std::env::var("LOG_LEVEL").as_deref().unwrap_or("info"))
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "trace" => Level::Trace,
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warn" => Level::Warn,
            "error" => Level::Error,
            "fatal" => Level::Fatal,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Market,  // Price index moves, tick summaries
    News,    // Headlines
    Hft,     // Burst rounds
    Region,  // Macro state
    Control, // View / selection / speed changes
    System,  // Startup, shutdown
    Profile, // Timing
    Audit,   // Digests, invariant checks
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Market => "market",
            Domain::News => "news",
            Domain::Hft => "hft",
            Domain::Region => "region",
            Domain::Control => "control",
            Domain::System => "system",
            Domain::Profile => "profile",
            Domain::Audit => "audit",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    // Present only when LOG_DIR is set
    events: Option<Mutex<BufWriter<File>>>,
    trace: Option<Mutex<BufWriter<File>>>,
}

fn open_sink(path: PathBuf) -> Option<Mutex<BufWriter<File>>> {
    match File::create(&path) {
        Ok(f) => Some(Mutex::new(BufWriter::new(f))),
        Err(err) => {
            eprintln!("[log] failed to create {}: {}", path.display(), err);
            None
        }
    }
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));

        let Ok(base) = std::env::var("LOG_DIR") else {
            return RunContext {
                run_id,
                events: None,
                trace: None,
            };
        };

        let mut run_dir = PathBuf::from(base);
        run_dir.push(&run_id);
        if let Err(err) = create_dir_all(&run_dir) {
            eprintln!("[log] failed to create run dir: {}", err);
        }
        let _ = std::fs::write(
            run_dir.join("manifest.json"),
            json!({
                "run_id": run_id,
                "ts": ts_now(),
                "pid": process::id(),
                "log_dir": run_dir.to_string_lossy(),
            })
            .to_string(),
        );

        RunContext {
            events: open_sink(run_dir.join("events.jsonl")),
            trace: open_sink(run_dir.join("trace.jsonl")),
            run_id,
        }
    })
}

fn write_line(writer: &Option<Mutex<BufWriter<File>>>, line: &str) {
    if let Some(Ok(mut w)) = writer.as_ref().map(|m| m.lock()) {
        let _ = writeln!(w, "{}", line);
    }
}

/// Flush file sinks. Call before exit.
pub fn flush() {
    let ctx = ensure_run_context();
    for sink in [&ctx.events, &ctx.trace].into_iter().flatten() {
        if let Ok(mut w) = sink.lock() {
            let _ = w.flush();
        }
    }
}

pub fn run_id() -> String {
    ensure_run_context().run_id.clone()
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn emit_record(level: Level, component: &str, event: &str, mut fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let msg = fields.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(ctx.run_id.clone()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    entry.insert("data".to_string(), Value::Object(fields));

    let line = Value::Object(entry).to_string();
    match level {
        Level::Trace | Level::Debug => write_line(&ctx.trace, &line),
        _ => write_line(&ctx.events, &line),
    }
    println!("{}", line);
}

// =============================================================================
// Domain helpers
// =============================================================================

pub fn log_news(event: &NewsEvent) {
    log(
        Level::Info,
        Domain::News,
        "headline",
        obj(&[
            ("id", json!(event.id)),
            ("msg", v_str(&event.title)),
            ("target", json!(event.target)),
            ("impact", v_num(event.impact)),
            ("ts", json!(event.timestamp)),
        ]),
    );
}

pub fn log_hft_burst(ts: u64, trades: u64, companies: usize, log_len: usize) {
    log(
        Level::Debug,
        Domain::Hft,
        "burst",
        obj(&[
            ("ts", json!(ts)),
            ("trades", json!(trades)),
            ("companies", json!(companies)),
            ("log_len", json!(log_len)),
        ]),
    );
}

/// Per-tick market summary
pub fn log_tick_summary(state: &AppState) {
    let n = state.companies.len().max(1) as f64;
    let composite = state.companies.values().map(|c| c.index).sum::<f64>() / n;
    let (lo, hi) = state
        .companies
        .values()
        .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c.index), hi.max(c.index)));
    log(
        Level::Debug,
        Domain::Market,
        "tick",
        obj(&[
            ("time", json!(state.time)),
            ("composite", v_num(composite)),
            ("min_index", v_num(if lo == f64::MAX { 0.0 } else { lo })),
            ("max_index", v_num(if hi == f64::MIN { 0.0 } else { hi })),
            ("news", json!(state.news_events.len())),
        ]),
    );
}

pub fn log_region_snapshot(state: &AppState) {
    let regions: Map<String, Value> = state
        .regions
        .iter()
        .map(|(r, d)| {
            (
                r.as_str().to_string(),
                json!({"risk": d.risk, "growth": d.economic_growth}),
            )
        })
        .collect();
    log(
        Level::Debug,
        Domain::Region,
        "snapshot",
        obj(&[("time", json!(state.time)), ("regions", Value::Object(regions))]),
    );
}

/// Digest checkpoint for replay verification
pub fn log_checkpoint(state: &AppState, actions: usize) {
    log(
        Level::Info,
        Domain::Audit,
        "checkpoint",
        obj(&[
            ("time", json!(state.time)),
            ("actions", json!(actions)),
            ("state_hash", v_str(&state.digest())),
        ]),
    );
}

pub fn log_invariant_violation(action: &str, msg: &str) {
    log(
        Level::Error,
        Domain::Audit,
        "invariant_violation",
        obj(&[("action", v_str(action)), ("msg", v_str(msg))]),
    );
}

pub fn log_control(action: &str, detail: Value) {
    log(
        Level::Info,
        Domain::Control,
        "control",
        obj(&[("action", v_str(action)), ("detail", detail)]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Option<Map<String, Value>>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            context: None,
            started: Instant::now(),
        }
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: Some(obj(fields)),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = self.context.take().unwrap_or_default();
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================
