// contrast-governance - main.rs
// Entry point: logging setup and command dispatch

use clap::Parser;
use contrast_governance::cli::{dispatch, Cli};
use tracing::Level;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    dispatch(cli)
}
