//! Converges a live WireGuard interface's peer set to the desired roster
//! for one server, in three phases: Revoke, Prune, Install.

use chrono::Utc;
use tracing::{debug, warn};
use wgfleet_store::{Peer, Phase, Store};

use crate::error::Result;
use crate::wg_cli;

/// Tallies from one reconcile pass, for logging/reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Number of public keys live on the interface after this pass.
    pub live_count: usize,
    /// Number of peers desired for this server.
    pub desired_count: usize,
    /// Number of shell commands that failed during this pass.
    pub dirty: usize,
}

/// Runs one Revoke -> Prune -> Install pass against `iface` for `server_name`.
///
/// # Errors
///
/// Returns an error if listing desired peers or refreshing the live set
/// fails. Individual shell-command failures are logged and counted in
/// [`PassStats::dirty`] rather than aborting the pass.
pub async fn reconcile_once(store: &Store, iface: &str, server_name: &str) -> Result<PassStats> {
    let now = Utc::now();
    let desired = store.peers().list_by_server(server_name)?;
    let mut dirty = 0usize;

    // Phase 1: Revoke. Peers that are blocked, or active-but-auto-locked,
    // are removed from the live interface even though their record stays.
    for peer in &desired {
        let phase = peer.phase(now);
        let should_revoke = phase == Phase::Blocked
            || (phase == Phase::Active && peer.should_auto_lock(now));
        if !should_revoke {
            continue;
        }
        if let Some(pubkey) = live_pubkey(peer) {
            if let Err(e) = wg_cli::remove_peer(iface, pubkey).await {
                warn!(peer = %peer.uid, error = %e, "revoke failed");
                dirty += 1;
            }
        }
    }

    // Phase 2: Prune. Anything live that no desired peer's public key maps
    // to is removed.
    let live = wg_cli::show_peers(iface).await?;
    for pubkey in &live {
        if store.peers().search_by_pubkey(server_name, pubkey)?.is_none() {
            if let Err(e) = wg_cli::remove_peer(iface, pubkey).await {
                warn!(pubkey, error = %e, "prune failed");
                dirty += 1;
            }
        }
    }

    // Phase 3: Install. Refresh the live set again so additions see the
    // effect of Revoke and Prune, then add anything active and missing.
    let live = wg_cli::show_peers(iface).await?;
    for peer in &desired {
        let phase = peer.phase(now);
        if phase != Phase::Active || peer.should_auto_lock(now) {
            continue;
        }
        let Some(pubkey) = live_pubkey(peer) else {
            continue;
        };
        if live.iter().any(|k| k == pubkey) {
            continue;
        }
        if let Err(e) = wg_cli::set_peer_allowed_ips(iface, pubkey, &peer.spec.allowed_ip).await {
            warn!(peer = %peer.uid, error = %e, "install failed");
            dirty += 1;
        }
    }

    let live_count = wg_cli::show_peers(iface).await?.len();
    debug!(server_name, live_count, desired_count = desired.len(), dirty, "peer reconcile pass complete");

    Ok(PassStats {
        live_count,
        desired_count: desired.len(),
        dirty,
    })
}

fn live_pubkey(peer: &Peer) -> Option<&str> {
    peer.spec
        .persistent_public_key
        .as_deref()
        .or(peer.status.public_key.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgfleet_store::{ExpireAction, PeerSpec, PeerStatus};

    fn active_peer(uid: &str, pubkey: &str) -> Peer {
        let now = Utc::now();
        Peer {
            uid: uid.to_string(),
            spec: PeerSpec {
                allowed_ip: "10.8.0.2/32".to_string(),
                persistent_public_key: None,
                expire_action: ExpireAction::Default,
                expire_duration: "24h".to_string(),
                client_mtu: "1280".to_string(),
                blocked: false,
            },
            status: PeerStatus {
                secret_value: String::new(),
                public_key: Some(pubkey.to_string()),
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn live_pubkey_prefers_persistent_key() {
        let mut peer = active_peer("dev/alice", "rotating-key");
        peer.spec.persistent_public_key = Some("fixed-key".to_string());
        assert_eq!(live_pubkey(&peer), Some("fixed-key"));
    }

    #[test]
    fn live_pubkey_falls_back_to_status_key() {
        let peer = active_peer("dev/alice", "rotating-key");
        assert_eq!(live_pubkey(&peer), Some("rotating-key"));
    }

    #[test]
    fn pass_stats_default_is_zeroed() {
        let stats = PassStats::default();
        assert_eq!(stats.live_count, 0);
        assert_eq!(stats.desired_count, 0);
        assert_eq!(stats.dirty, 0);
    }
}
