//! Main entry point for the My Code Organizer CLI

use clap::Parser;
use mco_cli::{Cli, CliRunner};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    std::env::set_var("RUST_LOG", log_level);
    env_logger::init();

    match CliRunner::new(&cli) {
        Ok(runner) => runner.run_and_close(&cli.command),
        Err(e) => {
            log::error!("Failed to initialize CLI runner: {}", e);
            Err(e)
        }
    }
}
