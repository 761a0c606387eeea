//! Records produced by evaluation and remediation.

use crate::color::Color;
use crate::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side of the pair is lighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    LightOnDark,
    DarkOnLight,
}

/// One raw contrast measurement. `absolute_score` is always `|raw_score|`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContrastSample {
    pub foreground: Color,
    pub background: Color,
    pub raw_score: f64,
    pub absolute_score: f64,
    pub polarity: Polarity,
}

impl ContrastSample {
    pub fn new(foreground: Color, background: Color, raw_score: f64) -> Self {
        let raw_score = if raw_score.is_finite() { raw_score } else { 0.0 };
        let polarity = if raw_score > 0.0 {
            Polarity::DarkOnLight
        } else {
            Polarity::LightOnDark
        };
        Self {
            foreground,
            background,
            raw_score,
            absolute_score: raw_score.abs(),
            polarity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub foreground: Color,
    pub background: Color,
}

/// A failed tier requirement. Each failing decision carries exactly one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub policy_id: String,
    pub required_tier: Tier,
    pub achieved_tier: Tier,
    /// Lc still missing to reach the required threshold, never negative.
    pub deficit: f64,
    pub message: String,
    pub suggestion: String,
    pub detected_at: DateTime<Utc>,
}

impl Violation {
    /// Nothing passing was achieved at all.
    pub fn is_critical(&self) -> bool {
        self.achieved_tier == Tier::Fail
    }
}

/// Outcome of evaluating one foreground/background pair for a role.
///
/// Decisions are never mutated; remediation returns a replacement with
/// `was_remediated` set and `original_color` pointing at the input color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub role: String,
    pub color: Color,
    pub pair: ColorPair,
    pub sample: ContrastSample,
    pub tier_achieved: Tier,
    pub tier_required: Tier,
    pub meets_policy: bool,
    pub violations: Vec<Violation>,
    pub reasoning: String,
    pub recommendations: Vec<String>,
    /// Heuristic in `[0.5, 1]`: distance from the required threshold,
    /// saturating at 30 Lc. Not a probability.
    pub confidence: f64,
    pub was_remediated: bool,
    pub original_color: Option<Color>,
    /// An input was unparseable and a fallback palette color stood in.
    pub used_fallback: bool,
}

impl Decision {
    pub fn absolute_score(&self) -> f64 {
        self.sample.absolute_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_polarity_follows_sign() {
        let s = ContrastSample::new(Color::black(), Color::white(), 106.0);
        assert_eq!(s.polarity, Polarity::DarkOnLight);
        assert_eq!(s.absolute_score, 106.0);

        let s = ContrastSample::new(Color::white(), Color::black(), -107.9);
        assert_eq!(s.polarity, Polarity::LightOnDark);
        assert_eq!(s.absolute_score, 107.9);
    }

    #[test]
    fn non_finite_scores_become_zero() {
        let s = ContrastSample::new(Color::white(), Color::black(), f64::NAN);
        assert_eq!(s.raw_score, 0.0);
        assert_eq!(s.absolute_score, 0.0);
    }

    #[test]
    fn violation_criticality() {
        let v = Violation {
            policy_id: "contrast.bodyText.silver".into(),
            required_tier: Tier::Silver,
            achieved_tier: Tier::Fail,
            deficit: 30.0,
            message: String::new(),
            suggestion: String::new(),
            detected_at: Utc::now(),
        };
        assert!(v.is_critical());
        assert!(!Violation {
            achieved_tier: Tier::Bronze,
            ..v
        }
        .is_critical());
    }
}
