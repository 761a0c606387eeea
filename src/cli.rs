use crate::assembler::SeedColors;
use crate::color::Color;
use crate::config::{load_config, GovernanceConfig};
use crate::contract::generate_contract;
use crate::tier::Tier;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;

/// Top-level CLI interface for the contrast governance engine
#[derive(Parser, Debug)]
#[command(
    name = "contrast-governance",
    version,
    about = "Perceptual color contrast governance: evaluate, remediate and certify UI color roles"
)]
pub struct Cli {
    /// Configuration file (defaults to ./contrast.toml when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log evaluation details to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute governed role colors for a surface
    Compute {
        /// Surface profile name, e.g. `sidebar` or `bottom-nav`
        #[arg(short, long)]
        surface: String,
        #[arg(short, long)]
        background: String,
        #[arg(short, long)]
        primary: String,
        #[arg(short, long)]
        accent: Option<String>,
        /// Include the audit log in the output
        #[arg(long)]
        audit: bool,
        /// Include a compliance contract in the output
        #[arg(long)]
        contract: bool,
    },

    /// Evaluate a single foreground/background pair
    Check {
        #[arg(short, long)]
        foreground: String,
        #[arg(short, long)]
        background: String,
        /// Required tier: bronze, silver, gold or platinum
        #[arg(short, long, default_value = "silver")]
        tier: Tier,
        /// Repair the foreground when it falls short
        #[arg(long)]
        remediate: bool,
    },

    /// List configured surfaces and their roles
    Surfaces {
        /// Dump the full surface tables as TOML
        #[arg(long)]
        toml: bool,
    },
}

pub fn dispatch(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Compute {
            surface,
            background,
            primary,
            accent,
            audit,
            contract,
        } => compute(&config, &surface, background, primary, accent, audit, contract),
        Commands::Check {
            foreground,
            background,
            tier,
            remediate,
        } => check(&config, foreground, background, tier, remediate),
        Commands::Surfaces { toml } => surfaces(&config, toml),
    }
}

fn compute(
    config: &GovernanceConfig,
    surface: &str,
    background: String,
    primary: String,
    accent: Option<String>,
    audit: bool,
    contract: bool,
) -> Result<()> {
    let profile = config.surface(surface)?;
    let engine = config.build_engine()?;

    let mut seeds = SeedColors::new(background, primary);
    if let Some(accent) = accent {
        seeds = seeds.with_accent(accent);
    }
    let outcome = engine.compute(&seeds, profile);

    let mut output = json!({ "outcome": outcome });
    if contract {
        let contract = generate_contract(surface, &config.version, &outcome)
            .context("failed to generate compliance contract")?;
        output["contract"] = serde_json::to_value(contract)?;
    }
    if audit {
        output["audit"] = serde_json::to_value(engine.export_audit_log()?)?;
    }

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn check(
    config: &GovernanceConfig,
    foreground: String,
    background: String,
    tier: Tier,
    remediate: bool,
) -> Result<()> {
    let engine = config.build_engine()?;
    let background = Color::new(background);
    let mut decision = engine.evaluate(&Color::new(foreground), &background, tier, "check");

    if remediate && !decision.meets_policy {
        let prefer_dark = engine
            .primitives()
            .detect_background_mode(&background)
            .prefers_dark();
        decision = engine.remediate(&decision, tier, prefer_dark);
    }

    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}

fn surfaces(config: &GovernanceConfig, as_toml: bool) -> Result<()> {
    if as_toml {
        let rendered =
            toml::to_string_pretty(&config.surfaces).context("failed to render surfaces")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("version {}", config.version);
    for (name, profile) in &config.surfaces {
        let roles: Vec<String> = profile
            .roles
            .iter()
            .map(|role| format!("{} ({})", role.key, role.required_tier))
            .collect();
        println!("{name}: {}", roles.join(", "));
    }
    Ok(())
}
