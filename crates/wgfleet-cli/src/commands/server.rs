//! `wgfleet server add|list|remove`.

use chrono::Utc;
use wgfleet_keys::generate_keypair;
use wgfleet_store::Server;

use crate::backend::{close_store, open_store, resolve_cipher_key};
use crate::cli::{Cli, ServerCommands};
use crate::error::{CliError, Result};
use crate::output::print_servers;

/// Executes a server subcommand.
pub async fn execute(cli: &Cli, command: &ServerCommands) -> Result<()> {
    match command {
        ServerCommands::Add {
            name,
            address,
            endpoint,
            listen_port,
            r#override,
        } => add(cli, name, address, endpoint, *listen_port, *r#override).await,
        ServerCommands::List => list(cli).await,
        ServerCommands::Remove { name } => remove(cli, name).await,
    }
}

async fn add(
    cli: &Cli,
    name: &str,
    address: &str,
    endpoint: &str,
    listen_port: u16,
    r#override: bool,
) -> Result<()> {
    if !endpoint.contains(':') {
        return Err(CliError::InvalidArgument(format!(
            "endpoint {endpoint:?} must be host:port"
        )));
    }
    address
        .parse::<ipnet::IpNet>()
        .map_err(|e| CliError::InvalidArgument(format!("invalid address {address:?}: {e}")))?;

    let store = open_store(cli).await?;

    if !r#override && store.servers().get(name).is_ok() {
        return Err(CliError::InvalidArgument(format!(
            "server {name:?} already exists; pass --override to replace it"
        )));
    }

    let cipher_key = resolve_cipher_key(cli)?;
    let (private_key, public_key) = generate_keypair();
    let encrypted_private_key = wgfleet_store::Store::encrypt_server_key(&private_key, &cipher_key)?;

    let now = Utc::now();
    let server = Server {
        name: name.to_string(),
        address: address.to_string(),
        listen_port,
        encrypted_private_key,
        public_key: public_key.to_base64(),
        endpoint: endpoint.to_string(),
        post_up: Vec::new(),
        post_down: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    store.servers().update(server)?;
    close_store(cli, store).await?;

    println!("server {name} created");
    Ok(())
}

async fn list(cli: &Cli) -> Result<()> {
    let store = open_store(cli).await?;
    let servers = store.servers().list()?;
    print_servers(cli.output, &servers)?;
    close_store(cli, store).await
}

async fn remove(cli: &Cli, name: &str) -> Result<()> {
    let store = open_store(cli).await?;
    store.servers().delete(name)?;
    close_store(cli, store).await?;
    println!("server {name} removed");
    Ok(())
}
