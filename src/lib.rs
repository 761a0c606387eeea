//! Library root for the `contrast_governance` crate
//! Perceptual contrast governance for UI color roles: tier classification,
//! evaluation, remediation, conformance aggregation and audit.

// Core error handling
pub mod errors;

// Color model and primitive service
pub mod color;
pub mod primitives;

// Policy
pub mod decision;
pub mod tier;

// Engine and pipeline stages
pub mod aggregator;
pub mod assembler;
pub mod engine;
pub mod evaluator;
pub mod remediation;

// Audit & compliance
pub mod audit_log;
pub mod contract;

// Configuration & CLI
pub mod cli;
pub mod config;

pub use aggregator::{
    aggregate, CertificationCutoffs, ConformancePolicy, ConformanceReport, ConformanceWeights,
    ScoreBreakdown,
};
pub use assembler::{RoleSource, RoleSpec, SeedColors, SeedSlot, SurfaceOutcome, SurfaceProfile};
pub use audit_log::{AuditAction, AuditEntry, AuditLog};
pub use color::{Color, Hct, Oklch};
pub use config::{load_config, GovernanceConfig};
pub use contract::{generate_contract, ComplianceContract};
pub use decision::{ColorPair, ContrastSample, Decision, Polarity, Violation};
pub use engine::{FallbackPalette, GovernanceEngine};
pub use errors::{GovernanceError, GovernanceResult};
pub use evaluator::confidence;
pub use primitives::{BackgroundMode, ColorPrimitives, StandardPrimitives, ToneSearchResult};
pub use tier::{meets_tier, Tier, TierThresholds};
