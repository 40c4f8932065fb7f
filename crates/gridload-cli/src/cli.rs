use clap::{Parser, Subcommand, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridload", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Hourly load reconstruction and sector profiles
    Load {
        #[command(subcommand)]
        command: LoadCommands,
    },
    /// Transmission line cleaning
    Grid {
        #[command(subcommand)]
        command: GridCommands,
    },
    /// Pipeline configuration helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum LoadCommands {
    /// Rebuild a gap-free hourly load table per country from raw readings
    Reconstruct {
        /// Pipeline configuration (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Raw load readings (CSV or Parquet)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output table path
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
    /// Build normalized hourly profiles for the configured sectors
    Profiles {
        /// Pipeline configuration (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Output table path
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum GridCommands {
    /// Split multi-voltage lines, merge duplicates, assign loadability
    Clean {
        /// Pipeline configuration (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
        /// Raw grid lines (CSV)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        input: PathBuf,
        /// Output CSV path
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: PathBuf,
        /// Keep parallel and bidirectional records separate
        #[arg(long)]
        no_dedup: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate a configuration file and print what it sets
    Check {
        /// Pipeline configuration (TOML)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        config: PathBuf,
    },
}
