use std::fmt;

use crate::engine::events::Action;
use crate::engine::reducer::ReducerConfig;
use crate::engine::state::{AppState, Company, Region, HISTORY_CAPACITY};

#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    pub msg: String,
}

impl InvariantViolation {
    fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invariant violated: {}", self.msg)
    }
}

impl std::error::Error for InvariantViolation {}

pub fn assert_company_invariants(
    company: &Company,
    cfg: &ReducerConfig,
) -> Result<(), InvariantViolation> {
    let idx = company.index;
    if !(idx >= cfg.index_floor && idx <= cfg.index_ceiling) {
        return Err(InvariantViolation::new(format!(
            "{} index {} outside [{}, {}]",
            company.id, idx, cfg.index_floor, cfg.index_ceiling
        )));
    }
    if company.trade_history.capacity() != HISTORY_CAPACITY
        || company.trade_history.len() > HISTORY_CAPACITY
    {
        return Err(InvariantViolation::new(format!(
            "{} history len {} / cap {}",
            company.id,
            company.trade_history.len(),
            company.trade_history.capacity()
        )));
    }
    if company.geopolitical_exposure.contains_key(&company.region) {
        return Err(InvariantViolation::new(format!(
            "{} has exposure to its own region",
            company.id
        )));
    }
    for region in Region::ALL {
        if region == company.region {
            continue;
        }
        match company.geopolitical_exposure.get(&region) {
            Some(w) if (0.0..=1.0).contains(w) => {}
            Some(w) => {
                return Err(InvariantViolation::new(format!(
                    "{} exposure to {} is {}",
                    company.id, region, w
                )))
            }
            None => {
                return Err(InvariantViolation::new(format!(
                    "{} missing exposure to {}",
                    company.id, region
                )))
            }
        }
    }
    Ok(())
}

pub fn assert_state_invariants(
    state: &AppState,
    cfg: &ReducerConfig,
) -> Result<(), InvariantViolation> {
    for company in state.companies.values() {
        assert_company_invariants(company, cfg)?;
    }

    for (region, data) in state.regions.iter() {
        if !(0.0..=1.0).contains(&data.risk) {
            return Err(InvariantViolation::new(format!(
                "{} risk {} outside [0, 1]",
                region, data.risk
            )));
        }
        if !(-cfg.growth_bound..=cfg.growth_bound).contains(&data.economic_growth) {
            return Err(InvariantViolation::new(format!(
                "{} growth {} outside ±{}",
                region, data.economic_growth, cfg.growth_bound
            )));
        }
    }

    if state.news_events.len() > state.news_events.capacity() {
        return Err(InvariantViolation::new("news log over capacity"));
    }
    if state.hft_logs.len() > state.hft_logs.capacity() {
        return Err(InvariantViolation::new("hft log over capacity"));
    }

    // newest first: ids strictly decreasing front to back
    let news_ids: Vec<u64> = state.news_events.iter().map(|e| e.id).collect();
    if news_ids.windows(2).any(|w| w[0] <= w[1]) {
        return Err(InvariantViolation::new("news log not newest-first"));
    }
    let trade_ids: Vec<u64> = state.hft_logs.iter().map(|t| t.id).collect();
    if trade_ids.windows(2).any(|w| w[0] <= w[1]) {
        return Err(InvariantViolation::new("hft log not newest-first"));
    }
    if news_ids.first().is_some_and(|id| *id >= state.next_news_id)
        || trade_ids.first().is_some_and(|id| *id >= state.next_trade_id)
    {
        return Err(InvariantViolation::new("id counter behind issued ids"));
    }

    Ok(())
}

/// Checks that depend on the action that produced `next` from `prev`.
pub fn assert_transition(
    prev: &AppState,
    next: &AppState,
    action: &Action,
) -> Result<(), InvariantViolation> {
    match action {
        Action::TickUpdate { .. } => {
            let expected = if prev.companies.is_empty() {
                prev.time
            } else {
                prev.time + 1
            };
            if next.time != expected {
                return Err(InvariantViolation::new(format!(
                    "tick moved time {} -> {}",
                    prev.time, next.time
                )));
            }
        }
        _ => {
            if next.time != prev.time {
                return Err(InvariantViolation::new(format!(
                    "{} moved time {} -> {}",
                    action.kind(),
                    prev.time,
                    next.time
                )));
            }
        }
    }
    if next.companies.len() < prev.companies.len() && !matches!(action, Action::Init { .. }) {
        return Err(InvariantViolation::new("company removed outside INIT"));
    }
    Ok(())
}
