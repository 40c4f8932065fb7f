use std::io::{self, Write};

use anyhow::Result;
use gridload_cli::{cli::ConfigCommands, load_config, PipelineConfig, Stage};
use tabwriter::TabWriter;

pub fn handle(command: &ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Check { config } => {
            let parsed = load_config(config, &Stage::ALL)?;
            print_summary(&parsed)?;
            println!("Configuration OK: {}", config.display());
            Ok(())
        }
    }
}

fn print_summary(config: &PipelineConfig) -> Result<()> {
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SETTING\tVALUE")?;
    writeln!(writer, "year\t{}", config.year)?;
    writeln!(writer, "countries\t{}", config.load.countries.join(", "))?;
    let sectors: Vec<&str> = config.load.sectors.iter().map(|s| s.code()).collect();
    writeln!(writer, "sectors\t{}", sectors.join(", "))?;
    writeln!(writer, "boundary\t{:?}", config.load.boundary)?;
    writeln!(
        writer,
        "default proxy\t{}",
        config.load.default_proxy.as_deref().unwrap_or("-")
    )?;
    writeln!(writer, "renames\t{}", config.load.rename.len())?;
    for (country, missing) in &config.load.missing_countries {
        let proxy = missing
            .proxy
            .as_deref()
            .or(config.load.default_proxy.as_deref())
            .unwrap_or("-");
        writeln!(
            writer,
            "missing {country}\t{} (shape of {proxy})",
            missing.annual_total
        )?;
    }
    let calendar = config.calendar()?;
    let mut seasons: Vec<&str> = calendar.seasons.values().map(String::as_str).collect();
    seasons.sort_unstable();
    seasons.dedup();
    writeln!(writer, "seasons\t{}", seasons.join(", "))?;
    let mut day_types: Vec<&str> = calendar.day_types.values().map(String::as_str).collect();
    day_types.sort_unstable();
    day_types.dedup();
    writeln!(writer, "day types\t{}", day_types.join(", "))?;
    for (sector, path) in config.profile_sources()? {
        writeln!(writer, "profile {sector}\t{}", path.display())?;
    }
    writeln!(writer, "split policy\t{:?}", config.grid.split_policy)?;
    let brackets: Vec<String> = config
        .loadability()?
        .brackets()
        .iter()
        .map(|(bound, factor)| format!("{bound}:{factor}"))
        .collect();
    writeln!(writer, "loadability\t{}", brackets.join(" "))?;
    writer.flush()?;
    Ok(())
}
