// config.rs
// Purpose: Versioned governance configuration (thresholds, fallback palette,
// surface role tables) layered from defaults, TOML and environment

use crate::assembler::SurfaceProfile;
use crate::audit_log::DEFAULT_AUDIT_CAPACITY;
use crate::engine::{FallbackPalette, GovernanceEngine};
use crate::errors::{GovernanceError, GovernanceResult};
use crate::primitives::{ColorPrimitives, StandardPrimitives};
use crate::tier::TierThresholds;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "contrast.toml";

/// Environment prefix; nested keys use `__`, e.g. `CONTRAST_THRESHOLDS__GOLD=80`.
pub const ENV_PREFIX: &str = "CONTRAST_";

pub const DEFAULT_VERSION: &str = "apca-0.0.98g-draft";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovernanceConfig {
    /// Version tag of the threshold table; stamped into compliance contracts.
    pub version: String,
    pub thresholds: TierThresholds,
    pub audit_capacity: usize,
    pub fallback: FallbackPalette,
    pub surfaces: BTreeMap<String, SurfaceProfile>,
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        let surfaces = [SurfaceProfile::sidebar(), SurfaceProfile::bottom_nav()]
            .into_iter()
            .map(|profile| (profile.name.clone(), profile))
            .collect();

        Self {
            version: DEFAULT_VERSION.to_string(),
            thresholds: TierThresholds::default(),
            audit_capacity: DEFAULT_AUDIT_CAPACITY,
            fallback: FallbackPalette::default(),
            surfaces,
        }
    }
}

impl GovernanceConfig {
    pub fn validate(&self) -> GovernanceResult<()> {
        if self.version.trim().is_empty() {
            return Err(GovernanceError::config("version must be set"));
        }
        if self.audit_capacity == 0 {
            return Err(GovernanceError::config("audit_capacity must be positive"));
        }
        self.thresholds.validate()?;
        self.fallback.validate()?;
        if self.surfaces.is_empty() {
            return Err(GovernanceError::config("no surfaces configured"));
        }
        for (key, profile) in &self.surfaces {
            if profile.name != *key {
                return Err(GovernanceError::role_table(
                    key,
                    format!("profile name '{}' does not match its key", profile.name),
                ));
            }
            profile.validate()?;
        }
        Ok(())
    }

    pub fn surface(&self, name: &str) -> GovernanceResult<&SurfaceProfile> {
        self.surfaces
            .get(name)
            .ok_or_else(|| GovernanceError::unknown_surface(name))
    }

    /// Engine over [`StandardPrimitives`] using this configuration.
    pub fn build_engine(&self) -> GovernanceResult<GovernanceEngine> {
        self.build_engine_with(Arc::new(StandardPrimitives::new()))
    }

    pub fn build_engine_with(
        &self,
        primitives: Arc<dyn ColorPrimitives>,
    ) -> GovernanceResult<GovernanceEngine> {
        GovernanceEngine::new(
            primitives,
            self.thresholds.clone(),
            self.fallback.clone(),
            self.audit_capacity,
        )
    }

    /// Extract and validate a configuration from any figment.
    pub fn from_figment(figment: Figment) -> GovernanceResult<Self> {
        let mut config: GovernanceConfig = figment.extract()?;
        for (key, profile) in config.surfaces.iter_mut() {
            if profile.name.is_empty() {
                profile.name = key.clone();
            }
        }
        config.validate()?;
        Ok(config)
    }
}

/// Layered sources: defaults, then TOML, then `CONTRAST_*` environment.
pub fn figment(path: Option<&Path>) -> Figment {
    let toml = match path {
        Some(path) => Toml::file(path),
        None => Toml::file(DEFAULT_CONFIG_FILE),
    };
    Figment::from(Serialized::defaults(GovernanceConfig::default()))
        .merge(toml)
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

/// Load the configuration. An explicitly given file must exist; the default
/// `contrast.toml` is optional.
pub fn load_config(path: Option<&Path>) -> GovernanceResult<GovernanceConfig> {
    if let Some(path) = path {
        if !path.is_file() {
            return Err(GovernanceError::io(
                format!("read config {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
            ));
        }
    }

    let config = GovernanceConfig::from_figment(figment(path))?;
    info!(
        version = config.version.as_str(),
        surfaces = config.surfaces.len(),
        "governance config loaded"
    );
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tier::Tier;

    fn from_toml(toml: &str) -> GovernanceResult<GovernanceConfig> {
        GovernanceConfig::from_figment(
            Figment::from(Serialized::defaults(GovernanceConfig::default()))
                .merge(Toml::string(toml)),
        )
    }

    #[test]
    fn defaults_are_valid() {
        let config = GovernanceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.version, DEFAULT_VERSION);
        assert_eq!(config.audit_capacity, 100);
        assert!(config.surface("sidebar").is_ok());
        assert!(config.surface("bottom-nav").is_ok());
        assert!(matches!(
            config.surface("header"),
            Err(GovernanceError::UnknownSurface { .. })
        ));
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let config = from_toml(
            r#"
            version = "brand-2026"
            audit_capacity = 25

            [thresholds]
            gold = 80.0
            "#,
        )
        .unwrap();
        assert_eq!(config.version, "brand-2026");
        assert_eq!(config.audit_capacity, 25);
        assert_eq!(config.thresholds.gold, 80.0);
        assert_eq!(config.thresholds.silver, 60.0);
        assert_eq!(config.surfaces.len(), 2);
    }

    #[test]
    fn toml_can_add_a_surface() {
        let config = from_toml(
            r##"
            [surfaces.header]
            roles = [
                { key = "title", required_tier = "gold", source = { kind = "tone", seed = "surface", light_content_tone = 95.0, dark_content_tone = 10.0, chroma_scale = 0.1 } },
                { key = "link", required_tier = "silver", source = { kind = "mix", base = "contrast", toward = "primary", amount = 0.3 } },
            ]

            [surfaces.header.policy.weights]
            accessibility = 0.5
            perceptual = 0.2
            determinism = 0.2
            performance = 0.1
            "##,
        )
        .unwrap();

        let header = config.surface("header").unwrap();
        assert_eq!(header.name, "header");
        assert_eq!(header.roles.len(), 2);
        assert_eq!(header.roles[0].required_tier, Tier::Gold);
        assert_eq!(header.policy.cutoffs.platinum, 95.0);
    }

    #[test]
    fn malformed_config_is_rejected() {
        assert!(matches!(
            from_toml("[thresholds]\nsilver = 40.0"),
            Err(GovernanceError::InvalidThresholds { .. })
        ));
        assert!(from_toml("audit_capacity = 0").is_err());
        assert!(matches!(
            from_toml("[surfaces.sidebar.policy.weights]\naccessibility = 0.9"),
            Err(GovernanceError::InvalidWeights { .. })
        ));
        assert!(from_toml("[fallback]\nforeground = \"grey\"").is_err());
        assert!(matches!(
            from_toml("thresholds = \"high\""),
            Err(GovernanceError::ConfigSource { .. })
        ));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/definitely/not/here/contrast.toml")));
        assert!(matches!(result, Err(GovernanceError::Io { .. })));
    }

    #[test]
    fn builds_engine_from_config() {
        let config = from_toml("audit_capacity = 3").unwrap();
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.thresholds(), &config.thresholds);
    }
}
