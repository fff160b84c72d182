//! Thin, validated wrappers around the `wg` and `wg-quick` sub-shells.

use wgfleet_validation::command::{AllowedProgram, SafeCommand};

use crate::error::Result;

/// Brings the interface described by the config file at `path` down.
/// Best-effort: a non-zero exit (e.g. the interface was never up) is not
/// treated as an error.
pub async fn wg_quick_down(path: &str) -> Result<()> {
    let _ = SafeCommand::new(AllowedProgram::WgQuick)
        .arg("down")
        .arg(path)
        .execute_unchecked()
        .await?;
    Ok(())
}

/// Brings the interface described by the config file at `path` up.
///
/// # Errors
///
/// Returns an error if `wg-quick` exits non-zero.
pub async fn wg_quick_up(path: &str) -> Result<()> {
    SafeCommand::new(AllowedProgram::WgQuick)
        .arg("up")
        .arg(path)
        .execute()
        .await?;
    Ok(())
}

/// Lists the base64 public keys currently attached to `iface`.
///
/// # Errors
///
/// Returns an error if `wg show` exits non-zero.
pub async fn show_peers(iface: &str) -> Result<Vec<String>> {
    let output = SafeCommand::new(AllowedProgram::Wg)
        .arg("show")
        .arg(iface)
        .arg("peers")
        .execute()
        .await?;

    Ok(output
        .stdout_lossy()
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Adds or updates a peer on `iface` with the given allowed IPs.
///
/// # Errors
///
/// Returns an error if `wg set` exits non-zero.
pub async fn set_peer_allowed_ips(iface: &str, pubkey: &str, allowed_ips: &str) -> Result<()> {
    SafeCommand::new(AllowedProgram::Wg)
        .arg("set")
        .arg(iface)
        .arg("peer")
        .arg(pubkey)
        .arg("allowed-ips")
        .arg(allowed_ips)
        .execute()
        .await?;
    Ok(())
}

/// Removes a peer from `iface`.
///
/// # Errors
///
/// Returns an error if `wg set` exits non-zero.
pub async fn remove_peer(iface: &str, pubkey: &str) -> Result<()> {
    SafeCommand::new(AllowedProgram::Wg)
        .arg("set")
        .arg(iface)
        .arg("peer")
        .arg(pubkey)
        .arg("remove")
        .execute()
        .await?;
    Ok(())
}
