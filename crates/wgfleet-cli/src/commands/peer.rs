//! `wgfleet peer add|list|remove`.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use wgfleet_store::{Peer, PeerSpec, PeerStatus};

use crate::backend::{close_store, open_store};
use crate::cli::{Cli, ExpireActionArg, PeerCommands};
use crate::error::{CliError, Result};
use crate::output::print_peers;

const SECRET_LENGTH: usize = 50;

/// Executes a peer subcommand.
pub async fn execute(cli: &Cli, command: &PeerCommands) -> Result<()> {
    match command {
        PeerCommands::Add {
            server,
            name,
            address,
            public_key,
            expire_action,
            expire_duration,
        } => {
            add(
                cli,
                server,
                name,
                address.as_deref(),
                public_key.as_deref(),
                *expire_action,
                expire_duration,
            )
            .await
        }
        PeerCommands::List { server } => list(cli, server.as_deref()).await,
        PeerCommands::Remove { uid } => remove(cli, uid).await,
    }
}

async fn add(
    cli: &Cli,
    server_name: &str,
    name: &str,
    address: Option<&str>,
    public_key: Option<&str>,
    expire_action: ExpireActionArg,
    expire_duration: &str,
) -> Result<()> {
    let store = open_store(cli).await?;
    let server = store.servers().get(server_name)?;
    let ip_map = store.ip_map_for(&server)?;

    let allowed_ip = match address {
        Some(addr) => {
            let parsed: std::net::IpAddr = addr
                .parse()
                .map_err(|e| CliError::InvalidArgument(format!("invalid address {addr:?}: {e}")))?;
            if !ip_map.contains(parsed) || !ip_map.is_available(parsed) {
                return Err(CliError::InvalidArgument(format!(
                    "{addr} is not available in {}'s subnet",
                    server.address
                )));
            }
            ip_map.claim(parsed);
            format!("{parsed}/32")
        }
        None => ip_map.pop()?.to_string(),
    };

    let secret: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SECRET_LENGTH)
        .map(char::from)
        .collect();

    let now = Utc::now();
    let peer = Peer {
        uid: format!("{server_name}/{name}"),
        spec: PeerSpec {
            allowed_ip,
            persistent_public_key: public_key.map(str::to_string),
            expire_action: expire_action.into(),
            expire_duration: expire_duration.to_string(),
            client_mtu: "1280".to_string(),
            blocked: false,
        },
        status: PeerStatus {
            secret_value: format!("{secret}.conf"),
            public_key: None,
        },
        created_at: now,
        updated_at: now,
    };
    store.peers().update(peer)?;
    close_store(cli, store).await?;

    println!("peer {server_name}/{name} created, download token {secret}");
    Ok(())
}

async fn list(cli: &Cli, server: Option<&str>) -> Result<()> {
    let store = open_store(cli).await?;
    let peers = match server {
        Some(server) => store.peers().list_by_server(server)?,
        None => store.peers().list()?,
    };
    print_peers(cli.output, &peers)?;
    close_store(cli, store).await
}

async fn remove(cli: &Cli, uid: &str) -> Result<()> {
    let store = open_store(cli).await?;
    store.peers().delete(uid)?;
    close_store(cli, store).await?;
    println!("peer {uid} removed");
    Ok(())
}
