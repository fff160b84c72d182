//! `wgfleet agent server|peer`: runs a reconciliation pass once, or loops
//! forever sleeping `--sync` seconds between passes.

use std::time::Duration;

use tracing::error;
use wgfleet_agent::{peer_reconciler, server_reconciler};

use crate::backend::{close_store, open_store, resolve_cipher_key};
use crate::cli::{AgentCommands, Cli};
use crate::error::Result;

/// Executes an agent subcommand.
pub async fn execute(cli: &Cli, command: &AgentCommands) -> Result<()> {
    match command {
        AgentCommands::Server { server, config, sync } => {
            run_server(cli, server, config, *sync).await
        }
        AgentCommands::Peer { server, iface, sync } => run_peer(cli, server, iface, *sync).await,
    }
}

async fn run_server(
    cli: &Cli,
    server_name: &str,
    config_path: &std::path::Path,
    sync: Option<u64>,
) -> Result<()> {
    let cipher_key = resolve_cipher_key(cli)?;
    let config = server_reconciler::ServerReconcilerConfig {
        server_name: server_name.to_string(),
        config_path: config_path.to_path_buf(),
        cipher_key,
    };

    loop {
        match server_reconcile_pass(cli, &config).await {
            Ok(result) => println!("server reconcile pass: {result:?}"),
            Err(e) if sync.is_some() => error!(error = %e, "server reconcile pass failed"),
            Err(e) => return Err(e),
        }

        match sync {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => return Ok(()),
        }
    }
}

async fn server_reconcile_pass(
    cli: &Cli,
    config: &server_reconciler::ServerReconcilerConfig,
) -> Result<server_reconciler::PassResult> {
    let store = open_store(cli).await?;
    let result = server_reconciler::reconcile_once(&store, config).await?;
    close_store(cli, store).await?;
    Ok(result)
}

async fn run_peer(cli: &Cli, server_name: &str, iface: &str, sync: Option<u64>) -> Result<()> {
    loop {
        match peer_reconcile_pass(cli, server_name, iface).await {
            Ok(stats) => println!(
                "peer reconcile pass: live={} desired={} dirty={}",
                stats.live_count, stats.desired_count, stats.dirty
            ),
            Err(e) if sync.is_some() => error!(error = %e, "peer reconcile pass failed"),
            Err(e) => return Err(e),
        }

        match sync {
            Some(seconds) => tokio::time::sleep(Duration::from_secs(seconds)).await,
            None => return Ok(()),
        }
    }
}

async fn peer_reconcile_pass(
    cli: &Cli,
    server_name: &str,
    iface: &str,
) -> Result<peer_reconciler::PassStats> {
    let store = open_store(cli).await?;
    let stats = peer_reconciler::reconcile_once(&store, iface, server_name).await?;
    close_store(cli, store).await?;
    Ok(stats)
}
