//! Conformance aggregation: folds a set of decisions into a weighted
//! composite score and a certification tier.
//!
//! Two of the four dimensions are axioms rather than measurements:
//! `determinism` is 100 because the pipeline is pure, and `performance` is
//! 100 because primitive lookups are cached. They are kept in the formula so
//! weight profiles stay comparable with other surfaces.

use crate::decision::Decision;
use crate::errors::{GovernanceError, GovernanceResult};
use crate::tier::{Tier, TierThresholds};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-3;

/// Weights of the composite score dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConformanceWeights {
    pub accessibility: f64,
    pub perceptual: f64,
    pub determinism: f64,
    pub performance: f64,
}

impl ConformanceWeights {
    pub fn new(accessibility: f64, perceptual: f64, determinism: f64, performance: f64) -> Self {
        Self {
            accessibility,
            perceptual,
            determinism,
            performance,
        }
    }

    /// Sidebar navigation profile
    pub fn sidebar() -> Self {
        Self::new(0.35, 0.30, 0.20, 0.15)
    }

    /// Mobile bottom navigation profile, weighted harder on pass rate
    pub fn bottom_nav() -> Self {
        Self::new(0.40, 0.25, 0.20, 0.15)
    }

    fn as_array(&self) -> [f64; 4] {
        [
            self.accessibility,
            self.perceptual,
            self.determinism,
            self.performance,
        ]
    }

    pub fn validate(&self, profile: &str) -> GovernanceResult<()> {
        let weights = self.as_array();
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(GovernanceError::weights(
                profile,
                "weights must be finite and non-negative",
            ));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(GovernanceError::weights(
                profile,
                format!("weights must sum to 1.0, got {sum:.4}"),
            ));
        }
        Ok(())
    }
}

impl Default for ConformanceWeights {
    fn default() -> Self {
        Self::sidebar()
    }
}

/// Composite score required for each certification level.
///
/// There is no sub-Bronze certification: anything below `bronze` still
/// certifies as Bronze.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationCutoffs {
    pub platinum: f64,
    pub gold: f64,
    pub silver: f64,
    pub bronze: f64,
}

impl Default for CertificationCutoffs {
    fn default() -> Self {
        Self {
            platinum: 95.0,
            gold: 85.0,
            silver: 75.0,
            bronze: 60.0,
        }
    }
}

impl CertificationCutoffs {
    pub fn validate(&self, profile: &str) -> GovernanceResult<()> {
        let ordered = [self.bronze, self.silver, self.gold, self.platinum];
        if ordered.iter().any(|c| !c.is_finite()) {
            return Err(GovernanceError::weights(profile, "cutoffs must be finite"));
        }
        if ordered.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GovernanceError::weights(
                profile,
                format!("certification cutoffs must be strictly increasing, got {ordered:?}"),
            ));
        }
        Ok(())
    }

    pub fn level(&self, composite: f64) -> Tier {
        if composite >= self.platinum {
            Tier::Platinum
        } else if composite >= self.gold {
            Tier::Gold
        } else if composite >= self.silver {
            Tier::Silver
        } else {
            // At or above `bronze`, and also the floor below it.
            Tier::Bronze
        }
    }
}

/// Weights plus cutoffs for one surface
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConformancePolicy {
    pub weights: ConformanceWeights,
    #[serde(default)]
    pub cutoffs: CertificationCutoffs,
}

impl ConformancePolicy {
    pub fn new(weights: ConformanceWeights) -> Self {
        Self {
            weights,
            cutoffs: CertificationCutoffs::default(),
        }
    }

    pub fn validate(&self, profile: &str) -> GovernanceResult<()> {
        self.weights.validate(profile)?;
        self.cutoffs.validate(profile)
    }
}

/// Per-dimension scores feeding the composite, each in `[0, 100]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub accessibility: f64,
    pub perceptual: f64,
    pub determinism: f64,
    pub performance: f64,
}

/// Read-only summary of a set of decisions, always recomputed from scratch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConformanceReport {
    pub total_pairs: usize,
    pub passing_pairs: usize,
    pub pass_rate: f64,
    pub average_score: f64,
    pub min_score: f64,
    pub max_score: f64,
    pub tier_distribution: BTreeMap<Tier, usize>,
    pub total_violations: usize,
    pub critical_violations: usize,
    pub remediated_count: usize,
    pub fallback_count: usize,
    pub breakdown: ScoreBreakdown,
    pub composite_score: f64,
    pub level: Tier,
}

/// Aggregate decisions into a report.
///
/// An empty set yields zero pass rate and scores; the axiomatic dimensions
/// still contribute, so it certifies at the Bronze floor.
pub fn aggregate(
    decisions: &[Decision],
    policy: &ConformancePolicy,
    thresholds: &TierThresholds,
) -> ConformanceReport {
    let total_pairs = decisions.len();
    let passing_pairs = decisions.iter().filter(|d| d.meets_policy).count();

    let scores: Vec<f64> = decisions.iter().map(Decision::absolute_score).collect();
    let (average_score, min_score, max_score) = if scores.is_empty() {
        (0.0, 0.0, 0.0)
    } else {
        let sum: f64 = scores.iter().sum();
        (
            sum / scores.len() as f64,
            scores.iter().copied().fold(f64::INFINITY, f64::min),
            scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        )
    };
    let pass_rate = if total_pairs == 0 {
        0.0
    } else {
        passing_pairs as f64 / total_pairs as f64
    };

    let mut tier_distribution: BTreeMap<Tier, usize> =
        Tier::ALL.iter().map(|tier| (*tier, 0)).collect();
    for decision in decisions {
        *tier_distribution.entry(decision.tier_achieved).or_insert(0) += 1;
    }

    let total_violations = decisions.iter().map(|d| d.violations.len()).sum();
    let critical_violations = decisions
        .iter()
        .flat_map(|d| d.violations.iter())
        .filter(|v| v.is_critical())
        .count();
    let remediated_count = decisions.iter().filter(|d| d.was_remediated).count();
    let fallback_count = decisions.iter().filter(|d| d.used_fallback).count();

    let breakdown = ScoreBreakdown {
        accessibility: pass_rate * 100.0,
        perceptual: (average_score / thresholds.platinum * 100.0).min(100.0),
        determinism: 100.0,
        performance: 100.0,
    };
    let w = &policy.weights;
    let composite_score = breakdown.accessibility * w.accessibility
        + breakdown.perceptual * w.perceptual
        + breakdown.determinism * w.determinism
        + breakdown.performance * w.performance;

    ConformanceReport {
        total_pairs,
        passing_pairs,
        pass_rate,
        average_score,
        min_score,
        max_score,
        tier_distribution,
        total_violations,
        critical_violations,
        remediated_count,
        fallback_count,
        breakdown,
        composite_score,
        level: policy.cutoffs.level(composite_score),
    }
}
