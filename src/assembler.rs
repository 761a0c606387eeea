//! Surface computation: derives a raw color per semantic role from the seed
//! colors, evaluates it, remediates it when it fails, and aggregates the
//! result. Each UI surface is just a [`SurfaceProfile`]: a role table and a
//! conformance policy.

use crate::aggregator::{aggregate, ConformancePolicy, ConformanceReport, ConformanceWeights};
use crate::color::Color;
use crate::decision::{Decision, Violation};
use crate::engine::GovernanceEngine;
use crate::errors::{GovernanceError, GovernanceResult};
use crate::primitives::BackgroundMode;
use crate::tier::Tier;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

/// Brand seeds a surface is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedColors {
    /// Background of the surface; every role is evaluated against it.
    pub surface: Color,
    pub primary: Color,
    /// Secondary brand color; defaults to `primary`.
    #[serde(default)]
    pub accent: Option<Color>,
}

impl SeedColors {
    pub fn new(surface: impl Into<Color>, primary: impl Into<Color>) -> Self {
        Self {
            surface: surface.into(),
            primary: primary.into(),
            accent: None,
        }
    }

    pub fn with_accent(mut self, accent: impl Into<Color>) -> Self {
        self.accent = Some(accent.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSlot {
    Surface,
    Primary,
    Accent,
    /// Pure white on dark surfaces, pure black on light ones.
    Contrast,
}

/// How a role's raw color is derived before evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RoleSource {
    /// The seed's hue at a fixed tone, picked by the surface's content mode.
    Tone {
        seed: SeedSlot,
        light_content_tone: f64,
        dark_content_tone: f64,
        chroma_scale: f64,
    },
    /// OKLCH interpolation from one seed toward another.
    Mix {
        base: SeedSlot,
        toward: SeedSlot,
        amount: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub key: String,
    pub required_tier: Tier,
    pub source: RoleSource,
}

impl RoleSpec {
    pub fn tone(
        key: &str,
        required_tier: Tier,
        seed: SeedSlot,
        light_content_tone: f64,
        dark_content_tone: f64,
        chroma_scale: f64,
    ) -> Self {
        Self {
            key: key.to_string(),
            required_tier,
            source: RoleSource::Tone {
                seed,
                light_content_tone,
                dark_content_tone,
                chroma_scale,
            },
        }
    }

    pub fn mix(
        key: &str,
        required_tier: Tier,
        base: SeedSlot,
        toward: SeedSlot,
        amount: f64,
    ) -> Self {
        Self {
            key: key.to_string(),
            required_tier,
            source: RoleSource::Mix {
                base,
                toward,
                amount,
            },
        }
    }
}

/// Role table and conformance policy for one UI surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceProfile {
    /// Filled from the config map key when omitted.
    #[serde(default)]
    pub name: String,
    pub roles: Vec<RoleSpec>,
    pub policy: ConformancePolicy,
}

impl SurfaceProfile {
    pub fn sidebar() -> Self {
        Self {
            name: "sidebar".to_string(),
            roles: vec![
                RoleSpec::tone("bodyText", Tier::Silver, SeedSlot::Surface, 90.0, 15.0, 0.15),
                RoleSpec::tone("icon", Tier::Bronze, SeedSlot::Surface, 72.0, 35.0, 0.3),
                RoleSpec::mix(
                    "hoverText",
                    Tier::Silver,
                    SeedSlot::Contrast,
                    SeedSlot::Primary,
                    0.2,
                ),
                RoleSpec::tone("activeText", Tier::Gold, SeedSlot::Primary, 70.0, 35.0, 1.0),
                RoleSpec::tone("mutedText", Tier::Bronze, SeedSlot::Surface, 62.0, 45.0, 0.2),
            ],
            policy: ConformancePolicy::new(ConformanceWeights::sidebar()),
        }
    }

    pub fn bottom_nav() -> Self {
        Self {
            name: "bottom-nav".to_string(),
            roles: vec![
                RoleSpec::tone("label", Tier::Silver, SeedSlot::Surface, 85.0, 25.0, 0.15),
                RoleSpec::tone("icon", Tier::Silver, SeedSlot::Surface, 80.0, 30.0, 0.3),
                RoleSpec::tone("activeLabel", Tier::Gold, SeedSlot::Primary, 75.0, 30.0, 1.0),
                RoleSpec::tone("inactiveIcon", Tier::Bronze, SeedSlot::Surface, 62.0, 45.0, 0.2),
                RoleSpec::mix(
                    "badgeText",
                    Tier::Silver,
                    SeedSlot::Contrast,
                    SeedSlot::Accent,
                    0.15,
                ),
            ],
            policy: ConformancePolicy::new(ConformanceWeights::bottom_nav()),
        }
    }

    pub fn validate(&self) -> GovernanceResult<()> {
        if self.roles.is_empty() {
            return Err(GovernanceError::role_table(&self.name, "no roles defined"));
        }
        let mut seen = HashSet::new();
        for role in &self.roles {
            if role.key.trim().is_empty() {
                return Err(GovernanceError::role_table(&self.name, "empty role key"));
            }
            if !seen.insert(role.key.as_str()) {
                return Err(GovernanceError::role_table(
                    &self.name,
                    format!("duplicate role '{}'", role.key),
                ));
            }
            if role.required_tier == Tier::Fail {
                return Err(GovernanceError::UnsupportedRequiredTier {
                    tier: role.required_tier,
                });
            }
            match &role.source {
                RoleSource::Tone {
                    light_content_tone,
                    dark_content_tone,
                    chroma_scale,
                    ..
                } => {
                    let tones_ok = [light_content_tone, dark_content_tone]
                        .iter()
                        .all(|t| (0.0..=100.0).contains(*t));
                    if !tones_ok || !chroma_scale.is_finite() || *chroma_scale < 0.0 {
                        return Err(GovernanceError::role_table(
                            &self.name,
                            format!(
                                "role '{}' has tones outside [0, 100] or a bad chroma scale",
                                role.key
                            ),
                        ));
                    }
                }
                RoleSource::Mix { amount, .. } => {
                    if !(0.0..=1.0).contains(amount) {
                        return Err(GovernanceError::role_table(
                            &self.name,
                            format!("role '{}' mix amount must be within [0, 1]", role.key),
                        ));
                    }
                }
            }
        }
        self.policy.validate(&self.name)
    }
}

/// Everything a caller needs to style one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceOutcome {
    pub surface: String,
    pub background: Color,
    pub background_mode: BackgroundMode,
    /// Final color per role key. Every role in the table has an entry.
    pub role_colors: BTreeMap<String, Color>,
    pub decisions: Vec<Decision>,
    pub report: ConformanceReport,
    pub violations: Vec<Violation>,
    /// Seed slots that were unparseable and replaced from the fallback palette.
    pub seed_fallbacks: Vec<SeedSlot>,
}

/// Seeds after fallback substitution.
struct ResolvedSeeds {
    surface: Color,
    primary: Color,
    accent: Color,
    contrast: Color,
}

impl GovernanceEngine {
    /// Run evaluation, conditional remediation and aggregation over a role table.
    pub fn compute(&self, seeds: &SeedColors, profile: &SurfaceProfile) -> SurfaceOutcome {
        let (resolved, seed_fallbacks) = self.resolve_seeds(seeds);
        let mode = self.primitives.detect_background_mode(&resolved.surface);
        let prefer_dark = mode.prefers_dark();

        let mut role_colors = BTreeMap::new();
        let mut decisions = Vec::with_capacity(profile.roles.len());
        let mut violations = Vec::new();

        for role in &profile.roles {
            let raw = self.derive_role_color(role, &resolved, mode);
            let evaluated = self.evaluate(&raw, &seeds.surface, role.required_tier, &role.key);
            let decision = if evaluated.meets_policy {
                evaluated
            } else {
                self.remediate(&evaluated, role.required_tier, prefer_dark)
            };

            role_colors.insert(role.key.clone(), decision.color.clone());
            violations.extend(decision.violations.iter().cloned());
            decisions.push(decision);
        }

        let report = aggregate(&decisions, &profile.policy, &self.thresholds);
        info!(
            surface = profile.name.as_str(),
            roles = decisions.len(),
            passing = report.passing_pairs,
            remediated = report.remediated_count,
            composite = report.composite_score,
            level = report.level.as_str(),
            "surface computed"
        );

        SurfaceOutcome {
            surface: profile.name.clone(),
            background: resolved.surface,
            background_mode: mode,
            role_colors,
            decisions,
            report,
            violations,
            seed_fallbacks,
        }
    }

    fn resolve_seeds(&self, seeds: &SeedColors) -> (ResolvedSeeds, Vec<SeedSlot>) {
        let mut fallbacks = Vec::new();
        let mut pick = |slot: SeedSlot, color: &Color, fallback: &Color| {
            if self.primitives.to_hct(color).is_some() {
                color.clone()
            } else {
                warn!(
                    slot = ?slot,
                    color = color.as_str(),
                    "seed color unparseable, using fallback"
                );
                fallbacks.push(slot);
                fallback.clone()
            }
        };

        let surface = pick(SeedSlot::Surface, &seeds.surface, &self.palette.background);
        let primary = pick(SeedSlot::Primary, &seeds.primary, &self.palette.foreground);
        let accent = match &seeds.accent {
            Some(accent) => pick(SeedSlot::Accent, accent, &primary),
            None => primary.clone(),
        };
        let contrast = match self.primitives.detect_background_mode(&surface) {
            BackgroundMode::LightContent => Color::white(),
            BackgroundMode::DarkContent => Color::black(),
        };

        (
            ResolvedSeeds {
                surface,
                primary,
                accent,
                contrast,
            },
            fallbacks,
        )
    }

    fn derive_role_color(
        &self,
        role: &RoleSpec,
        seeds: &ResolvedSeeds,
        mode: BackgroundMode,
    ) -> Color {
        let seed_color = move |slot: SeedSlot| match slot {
            SeedSlot::Surface => &seeds.surface,
            SeedSlot::Primary => &seeds.primary,
            SeedSlot::Accent => &seeds.accent,
            SeedSlot::Contrast => &seeds.contrast,
        };

        let derived = match &role.source {
            RoleSource::Tone {
                seed,
                light_content_tone,
                dark_content_tone,
                chroma_scale,
            } => self.primitives.to_hct(seed_color(*seed)).map(|hct| {
                let tone = match mode {
                    BackgroundMode::LightContent => *light_content_tone,
                    BackgroundMode::DarkContent => *dark_content_tone,
                };
                self.primitives
                    .from_hct(hct.with_chroma(hct.chroma * chroma_scale).with_tone(tone))
            }),
            RoleSource::Mix {
                base,
                toward,
                amount,
            } => {
                let from = self.primitives.to_oklch(seed_color(*base));
                let to = self.primitives.to_oklch(seed_color(*toward));
                from.zip(to)
                    .map(|(from, to)| self.primitives.from_oklch(from.mix(&to, *amount)))
            }
        };

        derived.unwrap_or_else(|| self.palette.foreground_for(role.required_tier).clone())
    }
}
