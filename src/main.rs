use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;
mod command;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let host = command::default_host(&cli);

    match cli.command {
        Some(Commands::Run { wait }) => {
            command::run_app(host, wait).await?;
        }
        Some(Commands::Actions) => {
            command::run_actions(&host).await?;
        }
        Some(Commands::Info) => {
            command::run_info(&host).await?;
        }
        None => {
            eprintln!("No command specified. Use --help for usage information.");
            eprintln!("Use 'hostkit run' to start the application.");
        }
    }

    Ok(())
}
