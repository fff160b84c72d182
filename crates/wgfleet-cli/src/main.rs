//! `wgfleet` binary entrypoint.

use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wgfleet_cli::cli::{Cli, Commands};
use wgfleet_cli::commands::{agent, peer, server, web};
use wgfleet_cli::CliError;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match &cli.command {
        Commands::Server { command } => server::execute(&cli, command).await,
        Commands::Peer { command } => peer::execute(&cli, command).await,
        Commands::Agent { command } => agent::execute(&cli, command).await,
        Commands::Web(args) => web::execute(&cli, args).await,
    }
}
