// contract.rs
// Purpose: Signed-off compliance record for one computed surface

use crate::aggregator::ConformanceReport;
use crate::assembler::SurfaceOutcome;
use crate::color::Color;
use crate::errors::{GovernanceError, GovernanceResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceContract {
    pub id: String,
    pub surface: String,
    /// Threshold table version the outcome was computed under.
    pub version: String,
    pub generated_at: DateTime<Utc>,
    pub role_colors: BTreeMap<String, Color>,
    pub report: ConformanceReport,
    /// Hex SHA-256 over the canonical JSON of surface, version, role colors
    /// and report. `id` and `generated_at` are excluded.
    pub digest: String,
}

impl ComplianceContract {
    /// Recompute the digest and compare it with the stored one.
    pub fn verify(&self) -> GovernanceResult<bool> {
        let digest = content_digest(&self.surface, &self.version, &self.role_colors, &self.report)?;
        Ok(digest == self.digest)
    }
}

/// Build a contract for a computed surface.
///
/// Fails when the outcome carries no roles or the surface name is blank.
pub fn generate_contract(
    surface: &str,
    version: &str,
    outcome: &SurfaceOutcome,
) -> GovernanceResult<ComplianceContract> {
    if surface.trim().is_empty() {
        return Err(GovernanceError::contract("surface name is empty"));
    }
    if outcome.role_colors.is_empty() || outcome.decisions.is_empty() {
        return Err(GovernanceError::contract(format!(
            "surface '{surface}' produced no role colors"
        )));
    }

    let digest = content_digest(surface, version, &outcome.role_colors, &outcome.report)?;

    Ok(ComplianceContract {
        id: Uuid::new_v4().to_string(),
        surface: surface.to_string(),
        version: version.to_string(),
        generated_at: Utc::now(),
        role_colors: outcome.role_colors.clone(),
        report: outcome.report.clone(),
        digest,
    })
}

fn content_digest(
    surface: &str,
    version: &str,
    role_colors: &BTreeMap<String, Color>,
    report: &ConformanceReport,
) -> GovernanceResult<String> {
    // serde_json::Value keeps object keys sorted, so this rendering is canonical.
    let body = json!({
        "surface": surface,
        "version": version,
        "roleColors": role_colors,
        "report": report,
    });
    let canonical = serde_json::to_string(&body)
        .map_err(|e| GovernanceError::serialization("contract digest", e))?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::{SeedColors, SurfaceProfile};
    use crate::engine::GovernanceEngine;

    fn outcome() -> SurfaceOutcome {
        GovernanceEngine::with_defaults().compute(
            &SeedColors::new("#0A0F1A", "#0D9488"),
            &SurfaceProfile::sidebar(),
        )
    }

    #[test]
    fn contract_digest_is_stable_across_runs() {
        let a = generate_contract("sidebar", "apca-0.0.98g-draft", &outcome()).unwrap();
        let b = generate_contract("sidebar", "apca-0.0.98g-draft", &outcome()).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);
        assert!(a.verify().unwrap());
    }

    #[test]
    fn tampering_breaks_verification() {
        let mut contract = generate_contract("sidebar", "v1", &outcome()).unwrap();
        contract
            .role_colors
            .insert("bodyText".to_string(), Color::new("#222222"));
        assert!(!contract.verify().unwrap());
    }

    #[test]
    fn version_is_part_of_the_digest() {
        let o = outcome();
        let a = generate_contract("sidebar", "v1", &o).unwrap();
        let b = generate_contract("sidebar", "v2", &o).unwrap();
        assert_ne!(a.digest, b.digest);
    }

    #[test]
    fn empty_outcome_is_an_error() {
        let mut o = outcome();
        o.role_colors.clear();
        o.decisions.clear();
        assert!(matches!(
            generate_contract("sidebar", "v1", &o),
            Err(GovernanceError::Contract { .. })
        ));
        assert!(generate_contract("  ", "v1", &outcome()).is_err());
    }
}
