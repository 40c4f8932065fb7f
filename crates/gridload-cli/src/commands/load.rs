use std::collections::BTreeMap;
use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use gridload_cli::{cli::LoadCommands, load_config, Stage};
use gridload_core::{Diagnostics, GridLoadError, TracingProgress};
use gridload_ts::{build_profiles, io, reconstruct};
use tracing::{info, warn};

use crate::commands::telemetry::record_run_timed;

pub fn handle(command: &LoadCommands) -> Result<()> {
    match command {
        LoadCommands::Reconstruct { config, input, out } => {
            let start = Instant::now();
            let res = run_reconstruct(config, input, out);
            let (config, input, out_str) = (
                config.display().to_string(),
                input.display().to_string(),
                out.display().to_string(),
            );
            record_run_timed(
                out,
                "load reconstruct",
                &[
                    ("config", config.as_str()),
                    ("input", input.as_str()),
                    ("out", out_str.as_str()),
                ],
                start,
                &res,
            );
            res
        }
        LoadCommands::Profiles { config, out } => {
            let start = Instant::now();
            let res = run_profiles(config, out);
            let (config, out_str) = (config.display().to_string(), out.display().to_string());
            record_run_timed(
                out,
                "load profiles",
                &[("config", config.as_str()), ("out", out_str.as_str())],
                start,
                &res,
            );
            res
        }
    }
}

fn run_reconstruct(config: &Path, input: &Path, out: &Path) -> Result<()> {
    let config = load_config(config, &[Stage::Reconstruct])?;
    info!("Reconstructing {} load from {}", config.year, input.display());
    let rows = io::read_raw_load(input)
        .with_context(|| format!("reading raw load {}", input.display()))?;
    let result = reconstruct(&rows, &config.reconstruction(), &TracingProgress::default())
        .map_err(GridLoadError::from)?;
    report(&result.diagnostics);
    io::write_load_table(&result.table, out)?;
    println!(
        "Reconstructed {} countries x {} hours ({} values filled) -> {}",
        result.table.countries().len(),
        result.table.hours(),
        result.filled,
        out.display()
    );
    Ok(())
}

fn run_profiles(config: &Path, out: &Path) -> Result<()> {
    let config = load_config(config, &[Stage::Profiles])?;
    let paths = config.profile_sources()?;
    let mut sources = BTreeMap::new();
    for sector in &config.load.sectors {
        if let Some(path) = paths.get(sector) {
            let source = io::read_shape_source(path)
                .with_context(|| format!("reading {sector} shape {}", path.display()))?;
            sources.insert(*sector, source);
        }
    }
    let profiles = build_profiles(
        config.year,
        &config.load.sectors,
        &sources,
        &config.calendar()?,
        &TracingProgress::default(),
    )
    .map_err(GridLoadError::from)?;
    io::write_profiles(&profiles, out)?;
    println!(
        "Built {} sector profiles x {} hours -> {}",
        config.load.sectors.len(),
        profiles.hours(),
        out.display()
    );
    Ok(())
}

pub(crate) fn report(diagnostics: &Diagnostics) {
    for issue in &diagnostics.issues {
        warn!("{issue}");
    }
    if diagnostics.has_issues() {
        println!("{}", diagnostics.summary());
    }
}
