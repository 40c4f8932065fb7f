use clap::{CommandFactory, Parser};
use gridload_cli::cli::{Cli, Commands};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

mod commands;

use crate::commands::{config, grid, load};

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();

    if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {err}");
    }

    let result = match &cli.command {
        Some(Commands::Load { command }) => load::handle(command),
        Some(Commands::Grid { command }) => grid::handle(command),
        Some(Commands::Config { command }) => config::handle(command),
        None => {
            let _ = Cli::command().print_help();
            Ok(())
        }
    };

    match result {
        Ok(()) => info!("gridload finished"),
        Err(err) => {
            error!("gridload failed: {err:?}");
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    }
}
