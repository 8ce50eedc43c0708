//! Entry point of the `severance` binary.
//!
//! Loads a road network, runs a closure simulation over it and prints the report to stdout.
//! Diagnostics go to stderr through `tracing`.

mod cli;
mod logging;

use std::{
    io::{self, BufWriter, Write},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use severance::{analysis::run_analysis, ingest::load_network};
use tracing::{error, info};

use crate::cli::Cli;

fn try_main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli
        .analysis_config()
        .context("invalid analysis configuration")?;

    let seed = config.seed.unwrap_or_else(rand::random);
    info!(seed, "seeded random generator");
    let mut rng = StdRng::seed_from_u64(seed);

    let network = load_network(&cli.path)
        .with_context(|| format!("failed to load `{}`", cli.path.display()))?;
    let report = run_analysis(&network, &config, &mut rng).context("analysis failed")?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    if cli.json {
        serde_json::to_writer_pretty(&mut writer, &report).context("failed to render report")?;
        writeln!(writer).context("failed to render report")?;
    } else {
        writeln!(writer, "{report}").context("failed to render report")?;
    }
    writer.flush().context("failed to flush output")?;

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init_logging() {
        eprintln!("failed to initialise logging: {err}");
        return ExitCode::FAILURE;
    }

    if let Err(err) = try_main() {
        error!(error = %format!("{err:#}"), "run failed");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
