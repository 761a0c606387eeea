//! The governance engine: one explicitly constructed object that owns the
//! primitive service, the tier table, the fallback palette and the audit log.
//!
//! Evaluation and remediation live in `evaluator.rs` and `remediation.rs`;
//! surface computation lives in `assembler.rs`.

use crate::audit_log::{AuditEntry, AuditLog};
use crate::color::Color;
use crate::errors::{GovernanceError, GovernanceResult, SafeLock};
use crate::primitives::{ColorPrimitives, StandardPrimitives};
use crate::tier::{Tier, TierThresholds};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::error;

/// Colors substituted when an input cannot be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPalette {
    /// Stand-in for unparseable foregrounds and primary seeds.
    pub foreground: Color,
    /// Stand-in foreground for secondary roles, those requiring only Bronze.
    pub muted: Color,
    /// Stand-in for unparseable backgrounds and surface seeds.
    pub background: Color,
}

impl Default for FallbackPalette {
    fn default() -> Self {
        Self {
            foreground: Color::new("#9CA3AF"),
            muted: Color::new("#6B7280"),
            background: Color::new("#111827"),
        }
    }
}

impl FallbackPalette {
    pub fn validate(&self) -> GovernanceResult<()> {
        for (slot, color) in [
            ("foreground", &self.foreground),
            ("muted", &self.muted),
            ("background", &self.background),
        ] {
            if !color.is_parseable() {
                return Err(GovernanceError::config(format!(
                    "fallback palette '{slot}' is not a valid hex color: {color}"
                )));
            }
        }
        Ok(())
    }

    /// Foreground substitute for a role with the given requirement.
    pub fn foreground_for(&self, required: Tier) -> &Color {
        if required <= Tier::Bronze {
            &self.muted
        } else {
            &self.foreground
        }
    }
}

pub struct GovernanceEngine {
    pub(crate) primitives: Arc<dyn ColorPrimitives>,
    pub(crate) thresholds: TierThresholds,
    pub(crate) palette: FallbackPalette,
    audit: Mutex<AuditLog>,
}

impl std::fmt::Debug for GovernanceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("thresholds", &self.thresholds)
            .field("palette", &self.palette)
            .finish_non_exhaustive()
    }
}

impl GovernanceEngine {
    /// Build an engine, rejecting malformed configuration up front.
    pub fn new(
        primitives: Arc<dyn ColorPrimitives>,
        thresholds: TierThresholds,
        palette: FallbackPalette,
        audit_capacity: usize,
    ) -> GovernanceResult<Self> {
        thresholds.validate()?;
        palette.validate()?;
        let audit = AuditLog::with_capacity(audit_capacity)?;
        Ok(Self {
            primitives,
            thresholds,
            palette,
            audit: Mutex::new(audit),
        })
    }

    /// Engine over [`StandardPrimitives`] with default thresholds, palette
    /// and a 100-entry audit log.
    pub fn with_defaults() -> Self {
        Self {
            primitives: Arc::new(StandardPrimitives::new()),
            thresholds: TierThresholds::default(),
            palette: FallbackPalette::default(),
            audit: Mutex::new(AuditLog::default()),
        }
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    pub fn palette(&self) -> &FallbackPalette {
        &self.palette
    }

    pub fn primitives(&self) -> &dyn ColorPrimitives {
        self.primitives.as_ref()
    }

    /// Record an entry. A poisoned log is reported but never fails the caller.
    pub(crate) fn record(&self, entry: AuditEntry) {
        match self.audit.safe_lock("audit_log") {
            Ok(mut log) => log.append(entry),
            Err(e) => error!(action = entry.action.as_str(), "dropping audit entry: {e}"),
        }
    }

    /// Snapshot of the audit log, oldest entry first.
    pub fn export_audit_log(&self) -> GovernanceResult<Vec<AuditEntry>> {
        Ok(self.audit.safe_lock("audit_log")?.export())
    }

    /// Audit log as a JSON array for compliance tooling.
    pub fn export_audit_log_json(&self) -> GovernanceResult<String> {
        self.audit.safe_lock("audit_log")?.export_json()
    }

    pub fn audit_len(&self) -> usize {
        self.audit
            .safe_lock("audit_log")
            .map(|log| log.len())
            .unwrap_or(0)
    }
}
