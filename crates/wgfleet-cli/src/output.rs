//! Rendering lists of servers and peers in the format the caller asked for.

use wgfleet_store::{Peer, Server};

use crate::cli::OutputFormat;
use crate::error::{CliError, Result};

/// Prints a list of servers in the requested format.
pub fn print_servers(format: OutputFormat, servers: &[Server]) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(servers),
        OutputFormat::Yaml => print_yaml(servers),
        OutputFormat::Table => {
            println!("{:<20} {:<18} {:<8} {}", "NAME", "ADDRESS", "PORT", "ENDPOINT");
            for server in servers {
                println!(
                    "{:<20} {:<18} {:<8} {}",
                    server.name, server.address, server.listen_port, server.endpoint
                );
            }
            Ok(())
        }
    }
}

/// Prints a list of peers in the requested format.
pub fn print_peers(format: OutputFormat, peers: &[Peer]) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(peers),
        OutputFormat::Yaml => print_yaml(peers),
        OutputFormat::Table => {
            let now = chrono::Utc::now();
            println!("{:<30} {:<18} {:<16} {}", "UID", "ALLOWED IP", "PHASE", "BLOCKED");
            for peer in peers {
                println!(
                    "{:<30} {:<18} {:<16} {}",
                    peer.uid,
                    peer.spec.allowed_ip,
                    phase_label(peer.phase(now)),
                    peer.spec.blocked
                );
            }
            Ok(())
        }
    }
}

fn phase_label(phase: wgfleet_store::Phase) -> &'static str {
    match phase {
        wgfleet_store::Phase::Blocked => "blocked",
        wgfleet_store::Phase::PendingDownload => "pending-download",
        wgfleet_store::Phase::Expired => "expired",
        wgfleet_store::Phase::Active => "active",
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::InvalidArgument(format!("failed to render JSON: {e}")))?;
    println!("{text}");
    Ok(())
}

fn print_yaml<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let text = serde_yaml::to_string(value)
        .map_err(|e| CliError::InvalidArgument(format!("failed to render YAML: {e}")))?;
    print!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_label_covers_every_variant() {
        assert_eq!(phase_label(wgfleet_store::Phase::Blocked), "blocked");
        assert_eq!(phase_label(wgfleet_store::Phase::Active), "active");
    }
}
