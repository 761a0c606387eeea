//! Decision evaluation: scores one foreground/background pair against a
//! required tier and explains the outcome.

use crate::audit_log::{AuditAction, AuditEntry};
use crate::color::Color;
use crate::decision::{ColorPair, ContrastSample, Decision, Violation};
use crate::engine::GovernanceEngine;
use crate::tier::{meets_tier, Tier};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};

/// Distance from the threshold (in Lc) at which confidence saturates.
const CONFIDENCE_SPAN: f64 = 30.0;

/// Rough tone percentage needed per missing Lc point.
const LIGHTNESS_PER_LC: f64 = 0.75;

/// Heuristic confidence in `[0.5, 1]`; low near the threshold, high far from
/// it in either direction.
pub fn confidence(absolute_score: f64, required_threshold: f64) -> f64 {
    let distance = (absolute_score - required_threshold).abs() / CONFIDENCE_SPAN;
    (0.5 + 0.5 * distance.min(1.0)).min(1.0)
}

impl GovernanceEngine {
    /// Evaluate `foreground` on `background` for a role.
    ///
    /// Never fails. Unparseable inputs are replaced with fallback palette
    /// colors and flagged through `Decision::used_fallback`.
    pub fn evaluate(
        &self,
        foreground: &Color,
        background: &Color,
        required: Tier,
        role: &str,
    ) -> Decision {
        self.evaluate_with_origin(foreground, background, required, role, None)
    }

    pub(crate) fn evaluate_with_origin(
        &self,
        foreground: &Color,
        background: &Color,
        required: Tier,
        role: &str,
        original: Option<&Color>,
    ) -> Decision {
        let (fg, fg_fallback) = self.resolve(foreground, self.palette.foreground_for(required));
        let (bg, bg_fallback) = self.resolve(background, &self.palette.background);
        let used_fallback = fg_fallback || bg_fallback;
        if used_fallback {
            warn!(
                role,
                foreground = foreground.as_str(),
                background = background.as_str(),
                "unparseable color replaced by fallback palette"
            );
        }

        let sample = self.primitives.contrast_score(&fg, &bg);
        let achieved = self.thresholds.classify(sample.absolute_score);
        let meets_policy = meets_tier(achieved, required);
        let required_threshold = self.thresholds.threshold(required);
        let deficit = (required_threshold - sample.absolute_score).max(0.0);

        let violations = if meets_policy {
            Vec::new()
        } else {
            vec![Violation {
                policy_id: format!("contrast.{role}.{required}"),
                required_tier: required,
                achieved_tier: achieved,
                deficit,
                message: format!(
                    "{role}: achieved {achieved} (Lc {:.1}) but {required} requires Lc {:.1}",
                    sample.absolute_score, required_threshold
                ),
                suggestion: format!("Increase contrast by ~{deficit:.1} Lc"),
                detected_at: Utc::now(),
            }]
        };

        let reasoning = reasoning(
            role,
            &sample,
            achieved,
            required,
            required_threshold,
            original,
            used_fallback,
        );
        let recommendations = if meets_policy {
            Vec::new()
        } else {
            self.recommendations(&fg, &bg, required, deficit)
        };

        let decision = Decision {
            role: role.to_string(),
            color: fg.clone(),
            pair: ColorPair {
                foreground: fg,
                background: bg,
            },
            confidence: confidence(sample.absolute_score, required_threshold),
            sample,
            tier_achieved: achieved,
            tier_required: required,
            meets_policy,
            violations,
            reasoning,
            recommendations,
            was_remediated: false,
            original_color: None,
            used_fallback,
        };

        debug!(
            role,
            color = decision.color.as_str(),
            score = decision.sample.absolute_score,
            tier = decision.tier_achieved.as_str(),
            meets = meets_policy,
            "contrast evaluated"
        );

        self.record(AuditEntry::new(
            AuditAction::ContrastEvaluation,
            json!({
                "role": role,
                "foreground": foreground,
                "background": background,
                "requiredTier": required,
            }),
            json!({
                "color": decision.color,
                "absoluteScore": decision.sample.absolute_score,
                "tierAchieved": decision.tier_achieved,
                "confidence": decision.confidence,
                "usedFallback": used_fallback,
            }),
            meets_policy,
        ));

        decision
    }

    fn resolve(&self, color: &Color, fallback: &Color) -> (Color, bool) {
        if self.primitives.to_hct(color).is_some() {
            (color.clone(), false)
        } else {
            (fallback.clone(), true)
        }
    }

    fn recommendations(
        &self,
        foreground: &Color,
        background: &Color,
        required: Tier,
        deficit: f64,
    ) -> Vec<String> {
        let prefer_dark = self
            .primitives
            .detect_background_mode(background)
            .prefers_dark();
        let direction = if prefer_dark { "Darken" } else { "Lighten" };
        let shift = (deficit * LIGHTNESS_PER_LC).clamp(1.0, 100.0);

        let mut recommendations = vec![format!(
            "{direction} the foreground by approximately {shift:.0}% lightness"
        )];

        // Dry run: what remediation would pick, without touching the audit log.
        let search = self.primitives.optimal_color_for_score(
            background,
            self.thresholds.threshold(required),
            prefer_dark,
            self.remediation_tint(foreground),
        );
        if &search.color != foreground {
            if search.reached {
                recommendations.push(format!(
                    "Use {} (Lc {:.1}) to reach {required}",
                    search.color, search.achieved_score
                ));
            } else {
                recommendations.push(format!(
                    "Closest achievable color is {} (Lc {:.1}); {required} is out of reach \
                     on {background}",
                    search.color, search.achieved_score
                ));
            }
        }
        recommendations
    }
}

fn reasoning(
    role: &str,
    sample: &ContrastSample,
    achieved: Tier,
    required: Tier,
    required_threshold: f64,
    original: Option<&Color>,
    used_fallback: bool,
) -> String {
    let verdict = if meets_tier(achieved, required) {
        format!("meets the required {required} tier (Lc {required_threshold:.0})")
    } else {
        format!(
            "does not meet the required {required} tier (Lc {required_threshold:.0}), \
             short by {:.1}",
            (required_threshold - sample.absolute_score).max(0.0)
        )
    };
    let mut text = format!(
        "{role}: {} on {} scores Lc {:.1} ({achieved}) and {verdict}.",
        sample.foreground, sample.background, sample.absolute_score
    );
    if let Some(original) = original {
        text.push_str(&format!(" Remediated from {original}."));
    }
    if used_fallback {
        text.push_str(" An input color was unparseable; the fallback palette was used.");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_is_bounded_and_symmetric() {
        assert_eq!(confidence(75.0, 75.0), 0.5);
        assert_eq!(confidence(105.0, 75.0), 1.0);
        assert_eq!(confidence(45.0, 75.0), 1.0);
        assert!((confidence(90.0, 75.0) - 0.75).abs() < 1e-9);
        assert!((confidence(60.0, 75.0) - 0.75).abs() < 1e-9);
        assert_eq!(confidence(500.0, 0.0), 1.0);
    }

    #[test]
    fn compliant_pair_has_no_violations() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(
            &Color::white(),
            &Color::new("#0A0F1A"),
            Tier::Gold,
            "bodyText",
        );
        assert!(d.meets_policy);
        assert_eq!(d.tier_achieved, Tier::Platinum);
        assert!(d.violations.is_empty());
        assert!(d.recommendations.is_empty());
        assert!(!d.used_fallback);
        assert!(d.reasoning.contains("bodyText"));
        assert!(d.reasoning.contains("meets the required gold tier"));
    }

    #[test]
    fn failing_pair_has_one_violation_and_suggestions() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(
            &Color::new("#334155"),
            &Color::new("#0F172A"),
            Tier::Silver,
            "mutedText",
        );
        assert!(!d.meets_policy);
        assert_eq!(d.violations.len(), 1);

        let v = &d.violations[0];
        assert_eq!(v.required_tier, Tier::Silver);
        assert!(v.deficit > 0.0);
        assert!((v.deficit - (60.0 - d.sample.absolute_score)).abs() < 1e-9);
        assert!(v.message.contains("mutedText"));
        assert!(v.suggestion.starts_with("Increase contrast by ~"));
        assert_eq!(v.policy_id, "contrast.mutedText.silver");

        assert!(d.recommendations[0].starts_with("Lighten"));
        assert!(d.recommendations.iter().any(|r| r.starts_with("Use #")));
        assert!(d.reasoning.contains("does not meet"));
    }

    #[test]
    fn unparseable_inputs_fall_back() {
        let engine = GovernanceEngine::with_defaults();
        let d = engine.evaluate(
            &Color::new("rgb(1,2,3)"),
            &Color::new("#0A0F1A"),
            Tier::Silver,
            "icon",
        );
        assert!(d.used_fallback);
        assert_eq!(d.color, engine.palette().foreground);
        assert!(d.sample.absolute_score > 0.0);
        assert!(d.reasoning.contains("fallback palette"));

        let secondary = engine.evaluate(
            &Color::new("not-a-color"),
            &Color::new("#0A0F1A"),
            Tier::Bronze,
            "mutedText",
        );
        assert!(secondary.used_fallback);
        assert_eq!(secondary.color, engine.palette().muted);
    }

    #[test]
    fn every_evaluation_is_audited() {
        let engine = GovernanceEngine::with_defaults();
        engine.evaluate(&Color::white(), &Color::black(), Tier::Gold, "a");
        engine.evaluate(&Color::black(), &Color::black(), Tier::Gold, "b");

        let log = engine.export_audit_log().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.iter().all(|e| e.action == AuditAction::ContrastEvaluation));
        assert!(log[0].compliant);
        assert!(!log[1].compliant);
        assert_eq!(log[1].input["role"], "b");
    }
}
