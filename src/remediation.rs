//! Remediation: replaces a failing decision with one whose color was pulled
//! along the tone axis until it reaches the required tier.

use crate::audit_log::{AuditAction, AuditEntry};
use crate::color::{Color, Hct};
use crate::decision::Decision;
use crate::engine::GovernanceEngine;
use crate::tier::{meets_tier, Tier};
use serde_json::json;
use tracing::{info, warn};

/// Candidates keep the failing color's hue at half its chroma.
pub(crate) const TINT_CHROMA_SCALE: f64 = 0.5;

impl GovernanceEngine {
    /// Hue family used when searching replacements for `color`.
    pub(crate) fn remediation_tint(&self, color: &Color) -> Option<Hct> {
        self.primitives
            .to_hct(color)
            .map(|hct| hct.with_chroma(hct.chroma * TINT_CHROMA_SCALE))
    }

    /// Repair a failing decision.
    ///
    /// - A decision that already reaches `required` is returned unchanged.
    /// - A decision already remediated toward `required` is terminal and
    ///   returned unchanged, so `remediate(remediate(d)) == remediate(d)`.
    ///   Asking for a different tier searches again; `original_color` keeps
    ///   the first color that was replaced.
    /// - When no tone reaches the threshold, the closest candidate comes back
    ///   with `meets_policy == false`. A candidate scoring below the input is
    ///   discarded in favour of the input, so the achieved tier never drops.
    ///
    /// `prefer_dark` should come from one background mode detection per
    /// background and be passed consistently for every role on it.
    pub fn remediate(&self, decision: &Decision, required: Tier, prefer_dark: bool) -> Decision {
        if meets_tier(decision.tier_achieved, required) {
            return decision.clone();
        }
        if decision.was_remediated && decision.tier_required == required {
            warn!(
                role = decision.role.as_str(),
                color = decision.color.as_str(),
                "remediated color still below {required}; leaving as is"
            );
            return decision.clone();
        }

        let background = &decision.pair.background;
        let threshold = self.thresholds.threshold(required);
        let search = self.primitives.optimal_color_for_score(
            background,
            threshold,
            prefer_dark,
            self.remediation_tint(&decision.color),
        );

        let candidate = self.evaluate_with_origin(
            &search.color,
            background,
            required,
            &decision.role,
            Some(decision.original_color.as_ref().unwrap_or(&decision.color)),
        );

        let outcome = if candidate.sample.absolute_score < decision.sample.absolute_score {
            warn!(
                role = decision.role.as_str(),
                candidate = candidate.color.as_str(),
                "remediation candidate scores below the original; keeping original"
            );
            decision.clone()
        } else {
            Decision {
                was_remediated: true,
                original_color: decision
                    .original_color
                    .clone()
                    .or_else(|| Some(decision.color.clone())),
                used_fallback: decision.used_fallback || candidate.used_fallback,
                ..candidate
            }
        };

        if outcome.meets_policy {
            info!(
                role = outcome.role.as_str(),
                from = decision.color.as_str(),
                to = outcome.color.as_str(),
                score = outcome.sample.absolute_score,
                "remediated to {required}"
            );
        } else {
            warn!(
                role = outcome.role.as_str(),
                from = decision.color.as_str(),
                best = outcome.color.as_str(),
                score = outcome.sample.absolute_score,
                "{required} unreachable on {background}"
            );
        }

        self.record(AuditEntry::new(
            AuditAction::ContrastRemediation,
            json!({
                "role": decision.role,
                "originalColor": decision.color,
                "background": background,
                "requiredTier": required,
                "preferDark": prefer_dark,
            }),
            json!({
                "color": outcome.color,
                "absoluteScore": outcome.sample.absolute_score,
                "tierAchieved": outcome.tier_achieved,
                "searchReached": search.reached,
                "wasRemediated": outcome.was_remediated,
            }),
            outcome.meets_policy,
        ));

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Oklch;
    use crate::decision::ContrastSample;
    use crate::engine::FallbackPalette;
    use crate::primitives::{BackgroundMode, ColorPrimitives, StandardPrimitives, ToneSearchResult};
    use crate::tier::TierThresholds;
    use std::sync::Arc;

    fn failing(engine: &GovernanceEngine) -> Decision {
        engine.evaluate(
            &Color::new("#0D9488"),
            &Color::new("#0A0F1A"),
            Tier::Gold,
            "activeText",
        )
    }

    #[test]
    fn compliant_decision_is_untouched() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(&Color::white(), &Color::black(), Tier::Gold, "bodyText");
        let r = engine.remediate(&d, Tier::Gold, false);
        assert_eq!(r, d);
        assert!(!r.was_remediated);
    }

    #[test]
    fn failing_decision_is_repaired_in_hue_family() {
        let engine = GovernanceEngine::with_defaults();
        let d = failing(&engine);
        assert!(!d.meets_policy);

        let r = engine.remediate(&d, Tier::Gold, false);
        assert!(r.meets_policy);
        assert!(r.was_remediated);
        assert_eq!(r.original_color, Some(Color::new("#0D9488")));
        assert!(r.sample.absolute_score >= 75.0);
        assert!(r.tier_achieved >= d.tier_achieved);
        assert!(r.violations.is_empty());
        assert!(r.reasoning.contains("Remediated from #0D9488"));

        let original_hue = engine.primitives().to_hct(&d.color).unwrap().hue;
        let repaired = engine.primitives().to_hct(&r.color).unwrap();
        if repaired.chroma > 3.0 {
            let diff = (repaired.hue - original_hue).abs();
            assert!(diff.min(360.0 - diff) < 15.0, "{repaired:?} vs {original_hue}");
        }
    }

    #[test]
    fn remediation_is_idempotent() {
        let engine = GovernanceEngine::with_defaults();
        let d = failing(&engine);
        let once = engine.remediate(&d, Tier::Gold, false);
        let twice = engine.remediate(&once, Tier::Gold, false);
        assert_eq!(once, twice);
    }

    #[test]
    fn raising_the_target_searches_again() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(
            &Color::new("#334155"),
            &Color::new("#0F172A"),
            Tier::Silver,
            "mutedText",
        );
        let silver = engine.remediate(&d, Tier::Silver, false);
        assert!(silver.meets_policy);
        assert_eq!(silver.tier_required, Tier::Silver);

        let gold = engine.remediate(&silver, Tier::Gold, false);
        assert!(gold.sample.absolute_score >= 75.0, "{gold:#?}");
        assert_eq!(gold.tier_required, Tier::Gold);
        assert!(gold.meets_policy);
        assert!(gold.was_remediated);
        assert_eq!(gold.original_color, Some(Color::new("#334155")));
        assert_eq!(engine.remediate(&gold, Tier::Gold, false), gold);
    }

    /// Standard math, but the tone search only ever offers the background.
    struct BackgroundOnlySearch(StandardPrimitives);

    impl ColorPrimitives for BackgroundOnlySearch {
        fn to_hct(&self, color: &Color) -> Option<Hct> {
            self.0.to_hct(color)
        }

        fn from_hct(&self, hct: Hct) -> Color {
            self.0.from_hct(hct)
        }

        fn to_oklch(&self, color: &Color) -> Option<Oklch> {
            self.0.to_oklch(color)
        }

        fn from_oklch(&self, oklch: Oklch) -> Color {
            self.0.from_oklch(oklch)
        }

        fn contrast_score(&self, foreground: &Color, background: &Color) -> ContrastSample {
            self.0.contrast_score(foreground, background)
        }

        fn optimal_color_for_score(
            &self,
            background: &Color,
            _min_score: f64,
            _prefer_dark: bool,
            _tint: Option<Hct>,
        ) -> ToneSearchResult {
            ToneSearchResult {
                color: background.clone(),
                achieved_score: 0.0,
                reached: false,
            }
        }

        fn detect_background_mode(&self, background: &Color) -> BackgroundMode {
            self.0.detect_background_mode(background)
        }
    }

    #[test]
    fn worse_candidate_keeps_the_original() {
        let engine = GovernanceEngine::new(
            Arc::new(BackgroundOnlySearch(StandardPrimitives::new())),
            TierThresholds::default(),
            FallbackPalette::default(),
            100,
        )
        .unwrap();
        let d = engine.evaluate(
            &Color::new("#334155"),
            &Color::new("#0F172A"),
            Tier::Silver,
            "mutedText",
        );
        assert!(d.sample.absolute_score > 0.0);

        let r = engine.remediate(&d, Tier::Silver, false);
        assert_eq!(r, d);
        assert!(!r.was_remediated);
        assert!(r.tier_achieved >= d.tier_achieved);
        assert_eq!(engine.remediate(&r, Tier::Silver, false), r);
    }

    #[test]
    fn unreachable_tier_returns_best_effort() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(
            &Color::new("#808080"),
            &Color::new("#777777"),
            Tier::Platinum,
            "label",
        );
        let r = engine.remediate(&d, Tier::Platinum, true);
        assert!(!r.meets_policy);
        assert!(r.was_remediated);
        assert!(r.tier_achieved >= d.tier_achieved);
        assert_eq!(r.violations.len(), 1);
        assert!(r.confidence < 1.0);

        let again = engine.remediate(&r, Tier::Platinum, true);
        assert_eq!(again, r);
    }

    #[test]
    fn remediation_is_audited() {
        let engine = GovernanceEngine::with_defaults();
        let d = failing(&engine);
        engine.remediate(&d, Tier::Gold, false);

        let actions: Vec<AuditAction> = engine
            .export_audit_log()
            .unwrap()
            .iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(
            actions,
            vec![
                AuditAction::ContrastEvaluation,
                AuditAction::ContrastEvaluation,
                AuditAction::ContrastRemediation,
            ]
        );
    }
}
