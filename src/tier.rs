//! Compliance tiers and the threshold table that classifies contrast scores.

use crate::errors::{GovernanceError, GovernanceResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named compliance level, totally ordered from `Fail` to `Platinum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Fail,
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl Tier {
    /// Every tier in ascending order.
    pub const ALL: [Tier; 5] = [
        Tier::Fail,
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Fail => "fail",
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
        }
    }

    /// Position in the fixed tier ordering.
    pub fn rank(&self) -> usize {
        *self as usize
    }
}

impl FromStr for Tier {
    type Err = GovernanceError;

    fn from_str(input: &str) -> Result<Tier, Self::Err> {
        match input.trim().to_lowercase().as_str() {
            "fail" => Ok(Tier::Fail),
            "bronze" => Ok(Tier::Bronze),
            "silver" => Ok(Tier::Silver),
            "gold" => Ok(Tier::Gold),
            "platinum" => Ok(Tier::Platinum),
            other => Err(GovernanceError::config(format!("unknown tier '{other}'"))),
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `true` iff `achieved` sits at or above `required` in tier order.
pub fn meets_tier(achieved: Tier, required: Tier) -> bool {
    achieved.rank() >= required.rank()
}

/// Minimum absolute contrast (Lc) for each passing tier.
///
/// The values track a draft external standard, so they are loaded from
/// configuration rather than baked in. Construction rejects tables that are
/// not strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub bronze: f64,
    pub silver: f64,
    pub gold: f64,
    pub platinum: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            bronze: 45.0,
            silver: 60.0,
            gold: 75.0,
            platinum: 90.0,
        }
    }
}

impl TierThresholds {
    /// Build a validated threshold table.
    pub fn new(bronze: f64, silver: f64, gold: f64, platinum: f64) -> GovernanceResult<Self> {
        let thresholds = Self {
            bronze,
            silver,
            gold,
            platinum,
        };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> GovernanceResult<()> {
        let ordered = [self.bronze, self.silver, self.gold, self.platinum];
        if ordered.iter().any(|t| !t.is_finite() || *t <= 0.0) {
            return Err(GovernanceError::thresholds(
                "thresholds must be finite and positive",
            ));
        }
        if ordered.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(GovernanceError::thresholds(format!(
                "thresholds must be strictly increasing, got {ordered:?}"
            )));
        }
        Ok(())
    }

    /// Threshold of a tier; `Fail` has none and reports 0.
    pub fn threshold(&self, tier: Tier) -> f64 {
        match tier {
            Tier::Fail => 0.0,
            Tier::Bronze => self.bronze,
            Tier::Silver => self.silver,
            Tier::Gold => self.gold,
            Tier::Platinum => self.platinum,
        }
    }

    /// Highest tier whose threshold is at or below `absolute_score`.
    pub fn classify(&self, absolute_score: f64) -> Tier {
        Tier::ALL
            .iter()
            .rev()
            .filter(|tier| **tier != Tier::Fail)
            .find(|tier| absolute_score >= self.threshold(**tier))
            .copied()
            .unwrap_or(Tier::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_boundaries() {
        let t = TierThresholds::default();
        assert_eq!(t.classify(0.0), Tier::Fail);
        assert_eq!(t.classify(44.99), Tier::Fail);
        assert_eq!(t.classify(45.0), Tier::Bronze);
        assert_eq!(t.classify(60.0), Tier::Silver);
        assert_eq!(t.classify(74.9), Tier::Silver);
        assert_eq!(t.classify(75.0), Tier::Gold);
        assert_eq!(t.classify(106.0), Tier::Platinum);
    }

    #[test]
    fn classify_is_monotone() {
        let t = TierThresholds::default();
        let mut previous = Tier::Fail;
        for step in 0..=1100 {
            let tier = t.classify(step as f64 / 10.0);
            assert!(tier >= previous, "tier dropped at score {}", step as f64 / 10.0);
            previous = tier;
        }
    }

    #[test]
    fn classify_nan_is_fail() {
        assert_eq!(TierThresholds::default().classify(f64::NAN), Tier::Fail);
    }

    #[test]
    fn meets_tier_uses_order() {
        assert!(meets_tier(Tier::Gold, Tier::Silver));
        assert!(meets_tier(Tier::Gold, Tier::Gold));
        assert!(!meets_tier(Tier::Bronze, Tier::Silver));
        assert!(meets_tier(Tier::Fail, Tier::Fail));
    }

    #[test]
    fn rejects_non_increasing_thresholds() {
        assert!(TierThresholds::new(45.0, 60.0, 60.0, 90.0).is_err());
        assert!(TierThresholds::new(45.0, 40.0, 75.0, 90.0).is_err());
        assert!(TierThresholds::new(f64::NAN, 60.0, 75.0, 90.0).is_err());
        assert!(TierThresholds::new(30.0, 50.0, 70.0, 85.0).is_ok());
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Gold".parse::<Tier>().unwrap(), Tier::Gold);
        assert_eq!(" platinum ".parse::<Tier>().unwrap(), Tier::Platinum);
        assert!("diamond".parse::<Tier>().is_err());
    }
}
