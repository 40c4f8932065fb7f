use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use gridload_cli::{cli::GridCommands, load_config, Stage};
use gridload_core::{GridLoadError, TracingProgress};
use gridload_grid::{clean_grid, io};
use tracing::info;

use crate::commands::load::report;
use crate::commands::telemetry::record_run_timed;

pub fn handle(command: &GridCommands) -> Result<()> {
    match command {
        GridCommands::Clean {
            config,
            input,
            out,
            no_dedup,
        } => {
            let start = Instant::now();
            let res = run_clean(config, input, out, !no_dedup);
            let (config, input, out_str) = (
                config.display().to_string(),
                input.display().to_string(),
                out.display().to_string(),
            );
            let dedup = (!no_dedup).to_string();
            record_run_timed(
                out,
                "grid clean",
                &[
                    ("config", config.as_str()),
                    ("input", input.as_str()),
                    ("out", out_str.as_str()),
                    ("dedup", dedup.as_str()),
                ],
                start,
                &res,
            );
            res
        }
    }
}

fn run_clean(config: &Path, input: &Path, out: &Path, dedup: bool) -> Result<()> {
    let config = load_config(config, &[Stage::Grid])?;
    let table = config.loadability()?;
    info!("Cleaning grid lines from {}", input.display());
    let raw = io::read_raw_lines(input)
        .with_context(|| format!("reading grid lines {}", input.display()))?;
    let cleaned = clean_grid(
        &raw,
        config.grid.split_policy,
        dedup,
        &table,
        &TracingProgress::default(),
    )
    .map_err(GridLoadError::from)?;
    report(&cleaned.diagnostics);
    for (case, count) in &cleaned.cases {
        info!("{case}: {count} lines");
    }
    io::write_lines(out, &cleaned.lines)?;
    println!(
        "Cleaned {} raw lines into {} records ({} after splitting, {} skipped) -> {}",
        raw.len(),
        cleaned.lines.len(),
        cleaned.resolved,
        cleaned.skipped,
        out.display()
    );
    Ok(())
}
