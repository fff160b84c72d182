//! Converges a host's on-disk WireGuard interface file (and, through it,
//! the live interface) to the server record in the store.

use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::{info, warn};
use wgfleet_cipher::CipherKey;
use wgfleet_store::Store;
use wgfleet_template::{render_server, ServerInterfaceContext, ServerPeerEntry};

use crate::error::{Error, Result};
use crate::sentinel;
use crate::wg_cli;

/// Where the server reconciler writes the interface file, and which live
/// interface it cycles with `wg-quick`.
pub struct ServerReconcilerConfig {
    /// The server record's name in the store.
    pub server_name: String,
    /// Path to the on-disk WireGuard interface config.
    pub config_path: PathBuf,
    /// The cipher key used to decrypt the server's private key.
    pub cipher_key: CipherKey,
}

/// The outcome of a single reconcile pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassResult {
    /// The on-disk file already matched the desired state and no dirty
    /// sentinel was present.
    UpToDate,
    /// The file was rewritten and the interface cycled.
    Applied,
}

/// Runs one reconcile pass.
///
/// # Errors
///
/// Returns an error if the server record is missing, the private key fails
/// to decrypt, rendering fails, a rewrite is required but the process is
/// not root, or the `wg-quick up` step fails (the sentinel is left in place
/// in that case, forcing a retry).
pub async fn reconcile_once(store: &Store, config: &ServerReconcilerConfig) -> Result<PassResult> {
    let server = store.servers().get(&config.server_name)?;
    let private_key = store.decrypt_server_key(&server, &config.cipher_key)?;

    let peers = store
        .peers()
        .list_by_server(&config.server_name)?
        .into_iter()
        .filter(|p| {
            matches!(
                p.phase(chrono::Utc::now()),
                wgfleet_store::Phase::Active
            )
        })
        .map(|p| ServerPeerEntry {
            public_key: p
                .status
                .public_key
                .clone()
                .unwrap_or_default(),
            allowed_ips: p.spec.allowed_ip.clone(),
        })
        .collect();

    let rendered = render_server(&ServerInterfaceContext {
        address: server.address.clone(),
        listen_port: server.listen_port,
        private_key: private_key.to_base64(),
        post_up: server.post_up.clone(),
        post_down: server.post_down.clone(),
        peers,
    })?;

    let on_disk = tokio::fs::read_to_string(&config.config_path)
        .await
        .unwrap_or_default();

    let dirty = sentinel::is_dirty(&config.config_path);
    if !dirty && sha1_hex(&on_disk) == sha1_hex(&rendered) {
        return Ok(PassResult::UpToDate);
    }

    if !is_root() {
        return Err(Error::NotRoot);
    }

    sentinel::mark_dirty(&config.config_path).await?;
    tokio::fs::write(&config.config_path, &rendered).await?;

    let path_str = config.config_path.to_string_lossy().into_owned();
    wg_cli::wg_quick_down(&path_str).await.ok();
    wg_cli::wg_quick_up(&path_str).await.inspect_err(|e| {
        warn!(server = %config.server_name, error = %e, "wg-quick up failed, leaving dirty sentinel");
    })?;

    sentinel::clear_dirty(&config.config_path).await?;
    info!(server = %config.server_name, "server interface reconciled");
    Ok(PassResult::Applied)
}

fn sha1_hex(text: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Whether the current process is running as root, per `/proc/self/status`.
/// Non-Linux or sandboxed environments without that file are treated as
/// non-root.
fn is_root() -> bool {
    let Ok(status) = std::fs::read_to_string("/proc/self/status") else {
        return false;
    };
    status
        .lines()
        .find_map(|line| line.strip_prefix("Uid:"))
        .and_then(|rest| rest.split_whitespace().next())
        .is_some_and(|uid| uid == "0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha1_hex_is_stable_and_order_sensitive() {
        assert_eq!(sha1_hex("abc"), sha1_hex("abc"));
        assert_ne!(sha1_hex("abc"), sha1_hex("abd"));
    }

    #[test]
    fn sentinel_path_matches_config_path_suffix() {
        let path = Path::new("/etc/wireguard/wg0.conf");
        assert!(sentinel::sentinel_path(path).ends_with("wg0.conf.dirty"));
    }
}
