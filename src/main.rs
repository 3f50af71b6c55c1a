// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use photobooth::constants::app_info;
use photobooth::filters::FilterId;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "photobooth")]
#[command(about = "Countdown photo booth that prints three-shot photo strips")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    options: cli::GlobalOptions,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the booth in the terminal (default)
    Booth,

    /// List available cameras
    List,

    /// Print the filter catalog
    Filters,

    /// Take three photos without a preview and save the strip
    Shoot,

    /// Compose a strip from three existing images
    Strip {
        #[arg(num_args = 3, value_names = ["FIRST", "SECOND", "THIRD"])]
        images: Vec<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let terminal_mode = matches!(cli.command, None | Some(Commands::Booth));

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=photobooth=debug, RUST_LOG=info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    if terminal_mode {
        // The preview owns the screen; log to a file instead
        let log_path = photobooth::terminal::log_file_path();
        if let Some(dir) = log_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log_file))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .init();
    }

    let options = cli.options;
    match cli.command {
        None | Some(Commands::Booth) => cli::run_booth(&options),
        Some(Commands::List) => cli::list_cameras(&options),
        Some(Commands::Filters) => {
            cli::list_filters(options.filter.unwrap_or(FilterId::Original));
            Ok(())
        }
        Some(Commands::Shoot) => cli::shoot(&options),
        Some(Commands::Strip { images }) => cli::compose_from_files(&options, &images),
    }
}
