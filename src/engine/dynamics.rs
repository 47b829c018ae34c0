//! Price dynamics: per-tick drift composition, bound redraw, region evolution.
//!
//! Drift for one company is the sum of nine factor terms. The three noisy
//! terms are sampled into a [`DriftNoise`] first and composed afterwards, so
//! the composition itself is a plain function of its inputs.

use rand::Rng;
use serde::Serialize;

use super::reducer::ReducerConfig;
use super::state::{Company, NewsEvent, RegionBook, RegionData};

/// Uniform draw in `[-half, half)`; zero when the width is not positive.
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, half: f64) -> f64 {
    if !(half > 0.0) {
        return 0.0;
    }
    rng.gen_range(-half..half)
}

/// Random inputs to one company's drift.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriftNoise {
    /// Added to the sentiment term
    pub sentiment: f64,
    /// Raw shock, scaled by volatility during composition
    pub volatility: f64,
    /// Raw shock, scaled by meme factor during composition
    pub meme: f64,
}

impl DriftNoise {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn sample<R: Rng + ?Sized>(rng: &mut R, company: &Company, cfg: &ReducerConfig) -> Self {
        let sentiment = jitter(rng, cfg.sentiment_jitter);
        let volatility = jitter(rng, cfg.volatility_shock);
        let meme = if company.meme_factor > 0.0 {
            jitter(rng, 0.5)
        } else {
            0.0
        };
        Self {
            sentiment,
            volatility,
            meme,
        }
    }
}

/// Factor-by-factor decomposition of one tick's drift.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DriftBreakdown {
    pub sentiment: f64,
    pub volatility: f64,
    pub regional_risk: f64,
    pub regional_growth: f64,
    pub geopolitical: f64,
    pub news: f64,
    pub esg: f64,
    pub debt: f64,
    pub meme: f64,
}

impl DriftBreakdown {
    pub fn total(&self) -> f64 {
        self.sentiment
            + self.volatility
            + self.regional_risk
            + self.regional_growth
            + self.geopolitical
            + self.news
            + self.esg
            + self.debt
            + self.meme
    }
}

/// Compose the drift for `company` given the evolved regions and current news.
pub fn compute_drift<'a>(
    company: &Company,
    regions: &RegionBook,
    news: impl IntoIterator<Item = &'a NewsEvent>,
    noise: &DriftNoise,
    cfg: &ReducerConfig,
) -> DriftBreakdown {
    let home = regions.get(company.region);

    let geopolitical: f64 = regions
        .iter()
        .filter(|(r, _)| *r != company.region)
        .map(|(r, data)| -data.risk * company.exposure_to(r) * cfg.geo_drag)
        .sum();

    let news: f64 = news
        .into_iter()
        .filter(|ev| ev.target.matches(company))
        .map(|ev| ev.impact * cfg.news_weight)
        .sum();

    let meme = if company.meme_factor > 0.0 {
        noise.meme * company.meme_factor * cfg.meme_weight
    } else {
        0.0
    };

    DriftBreakdown {
        sentiment: company.sentiment * cfg.sentiment_weight + noise.sentiment,
        volatility: noise.volatility * company.volatility,
        regional_risk: -home.risk * cfg.risk_drag,
        regional_growth: home.economic_growth * cfg.growth_lift,
        geopolitical,
        news,
        esg: (company.esg_score - cfg.esg_pivot) / 1000.0 * cfg.esg_weight,
        debt: -company.debt_ratio * cfg.debt_drag,
        meme,
    }
}

/// Keep an index inside `[floor, ceiling]`.
///
/// Out-of-range values are redrawn a random distance (at most `redraw_width`)
/// inside the violated bound rather than pinned to it, so an index pushed
/// repeatedly against a bound does not stick there.
pub fn bound_index<R: Rng + ?Sized>(raw: f64, rng: &mut R, cfg: &ReducerConfig) -> f64 {
    let (floor, ceiling) = (cfg.index_floor, cfg.index_ceiling);
    if raw >= floor && raw <= ceiling {
        return raw;
    }
    let width = cfg.redraw_width.min(ceiling - floor);
    if !(width > 0.0) {
        return if raw > ceiling { ceiling } else { floor };
    }
    // (0, width] so the result never lands on the bound itself
    let offset = width - rng.gen_range(0.0..width);
    if raw > ceiling {
        ceiling - offset
    } else {
        // below floor, or NaN
        floor + offset
    }
}

/// One tick of random-walk for a region's macro state, hard clamped.
pub fn evolve_region<R: Rng + ?Sized>(
    data: &RegionData,
    rng: &mut R,
    cfg: &ReducerConfig,
) -> RegionData {
    let risk = data.risk + jitter(rng, cfg.region_risk_step);
    let growth = data.economic_growth + jitter(rng, cfg.region_growth_step);
    RegionData {
        risk: risk.clamp(0.0, 1.0),
        economic_growth: growth.clamp(-cfg.growth_bound, cfg.growth_bound),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::registry::blank_company;
    use crate::engine::state::{NewsTarget, Region, Sector};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn no_news() -> Vec<NewsEvent> {
        Vec::new()
    }

    fn neutral_company() -> Company {
        let mut c = blank_company(0, "Neutral Corp", Region::Europe, Sector::Finance, 1000.0);
        c.sentiment = 0.0;
        c.volatility = 0.0;
        c.debt_ratio = 0.0;
        c.esg_score = 60.0;
        c.meme_factor = 0.0;
        for w in c.geopolitical_exposure.values_mut() {
            *w = 0.0;
        }
        c
    }

    fn regions_with_home_risk(region: Region, risk: f64) -> RegionBook {
        let mut book = RegionBook::default();
        book.set(
            region,
            RegionData {
                risk,
                economic_growth: 0.0,
            },
        );
        book
    }

    #[test]
    fn test_drift_composition_risk_only() {
        let cfg = ReducerConfig::default();
        let company = neutral_company();
        let regions = regions_with_home_risk(Region::Europe, 0.2);
        let drift = compute_drift(&company, &regions, &no_news(), &DriftNoise::zero(), &cfg);

        assert!((drift.total() - (-0.0004)).abs() < 1e-12);
        let new_index = company.index * (1.0 + drift.total());
        assert!((new_index - 1000.0 * 0.9996).abs() < 1e-9);
    }

    #[test]
    fn test_esg_bonus_and_penalty() {
        let cfg = ReducerConfig::default();
        let regions = RegionBook::default();
        let mut c = neutral_company();

        c.esg_score = 100.0;
        let up = compute_drift(&c, &regions, &no_news(), &DriftNoise::zero(), &cfg);
        assert!((up.esg - 0.0002).abs() < 1e-12);

        c.esg_score = 20.0;
        let down = compute_drift(&c, &regions, &no_news(), &DriftNoise::zero(), &cfg);
        assert!((down.esg + 0.0002).abs() < 1e-12);
    }

    #[test]
    fn test_geopolitical_drag_skips_home_region() {
        let cfg = ReducerConfig::default();
        let mut c = neutral_company();
        c.geopolitical_exposure.insert(Region::Asia, 0.5);

        let mut regions = RegionBook::default();
        regions.get_mut(Region::Asia).risk = 0.8;
        regions.get_mut(Region::Europe).risk = 0.0;

        let drift = compute_drift(&c, &regions, &no_news(), &DriftNoise::zero(), &cfg);
        assert!((drift.geopolitical - (-0.8 * 0.5 * 0.001)).abs() < 1e-12);
        assert!(!c.geopolitical_exposure.contains_key(&Region::Europe));
    }

    #[test]
    fn test_news_impact_sums_matching_events() {
        let cfg = ReducerConfig::default();
        let c = neutral_company();
        let regions = RegionBook::default();
        let events = vec![
            NewsEvent {
                id: 1,
                title: "a".into(),
                target: NewsTarget::Sector(Sector::Finance),
                impact: 0.2,
                timestamp: 0,
            },
            NewsEvent {
                id: 2,
                title: "b".into(),
                target: NewsTarget::Region(Region::Europe),
                impact: -0.1,
                timestamp: 0,
            },
            NewsEvent {
                id: 3,
                title: "c".into(),
                target: NewsTarget::Region(Region::Asia),
                impact: 0.25,
                timestamp: 0,
            },
        ];
        let drift = compute_drift(&c, &regions, &events, &DriftNoise::zero(), &cfg);
        assert!((drift.news - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_meme_noise_only_when_meme_factor_positive() {
        let cfg = ReducerConfig::default();
        let regions = RegionBook::default();
        let noise = DriftNoise {
            sentiment: 0.0,
            volatility: 0.0,
            meme: 0.5,
        };
        let mut c = neutral_company();
        let d = compute_drift(&c, &regions, &no_news(), &noise, &cfg);
        assert_eq!(d.meme, 0.0);

        c.meme_factor = 0.5;
        let d = compute_drift(&c, &regions, &no_news(), &noise, &cfg);
        assert!((d.meme - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_bound_redraw_not_clamped() {
        let cfg = ReducerConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let hi = bound_index(2000.0, &mut rng, &cfg);
            assert!(hi >= 1750.0 && hi < 1800.0, "hi={}", hi);
            let lo = bound_index(500.0, &mut rng, &cfg);
            assert!(lo > 800.0 && lo <= 850.0, "lo={}", lo);
        }
        assert_eq!(bound_index(1234.5, &mut rng, &cfg), 1234.5);
        assert_eq!(bound_index(800.0, &mut rng, &cfg), 800.0);
    }

    #[test]
    fn test_bound_redraw_handles_nan() {
        let cfg = ReducerConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let v = bound_index(f64::NAN, &mut rng, &cfg);
        assert!(v > 800.0 && v <= 850.0);
    }

    #[test]
    fn test_region_evolution_clamped() {
        let cfg = ReducerConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut data = RegionData {
            risk: 0.999,
            economic_growth: 0.0999,
        };
        for _ in 0..10_000 {
            data = evolve_region(&data, &mut rng, &cfg);
            assert!((0.0..=1.0).contains(&data.risk));
            assert!((-0.1..=0.1).contains(&data.economic_growth));
        }
    }

    #[test]
    fn test_jitter_zero_width() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(jitter(&mut rng, 0.0), 0.0);
        let v = jitter(&mut rng, 0.05);
        assert!((-0.05..0.05).contains(&v));
    }
}
