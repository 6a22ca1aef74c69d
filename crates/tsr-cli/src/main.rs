use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tsr_cli::commands::{report, tasks, timeline};
use tsr_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let (Commands::Tasks(args) | Commands::Timeline(args) | Commands::Report(args)) = command;
    let reconstruction = config
        .reconstruction(args.step, args.time_zone.as_deref())
        .context("invalid reconstruction settings")?;

    match command {
        Commands::Tasks(args) => tasks::run(args, &reconstruction)?,
        Commands::Timeline(args) => timeline::run(args, &reconstruction)?,
        Commands::Report(args) => report::run(args, &reconstruction)?,
    }

    Ok(())
}
