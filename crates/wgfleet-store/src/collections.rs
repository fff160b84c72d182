//! Typed `Get`/`Update`/`Delete`/`List` views over the raw key-value store.

use chrono::Utc;

use crate::error::{Error, Result};
use crate::kv::Kv;
use crate::model::{Peer, Phase, Server};

const SERVER_PREFIX: &str = "/wgsconfig/";
const PEER_PREFIX: &str = "/peers/";

fn server_key(name: &str) -> String {
    format!("{SERVER_PREFIX}{name}")
}

fn peer_key(uid: &str) -> String {
    format!("{PEER_PREFIX}{uid}")
}

/// Typed access to [`Server`] records.
pub struct ServerCollection<'a> {
    pub(crate) kv: &'a Kv,
}

impl ServerCollection<'_> {
    /// Fetches the server named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such server exists.
    pub fn get(&self, name: &str) -> Result<Server> {
        let raw = self
            .kv
            .get(&server_key(name))?
            .ok_or_else(|| Error::NotFound {
                kind: "server",
                uid: name.to_string(),
            })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Inserts or overwrites a server record, stamping `updated_at`.
    pub fn update(&self, mut server: Server) -> Result<Server> {
        server.updated_at = Utc::now();
        let raw = serde_json::to_vec(&server)?;
        self.kv.set(&server_key(&server.name), &raw)?;
        Ok(server)
    }

    /// Deletes the server named `name`. Missing is not an error.
    pub fn delete(&self, name: &str) -> Result<()> {
        self.kv.delete(&server_key(name))
    }

    /// Lists every server.
    pub fn list(&self) -> Result<Vec<Server>> {
        let rows = self.kv.prefix_scan(SERVER_PREFIX, ".*")?;
        rows.into_iter()
            .map(|(_, v)| Ok(serde_json::from_slice(&v)?))
            .collect()
    }
}

/// Typed access to [`Peer`] records.
pub struct PeerCollection<'a> {
    pub(crate) kv: &'a Kv,
}

impl PeerCollection<'_> {
    /// Fetches the peer with UID `uid` (`<server>/<name>`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such peer exists.
    pub fn get(&self, uid: &str) -> Result<Peer> {
        let raw = self
            .kv
            .get(&peer_key(uid))?
            .ok_or_else(|| Error::NotFound {
                kind: "peer",
                uid: uid.to_string(),
            })?;
        Ok(serde_json::from_slice(&raw)?)
    }

    /// Inserts or overwrites a peer record, stamping `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the UID is not `<server>/<name>`.
    pub fn update(&self, mut peer: Peer) -> Result<Peer> {
        if Peer::split_uid(&peer.uid).is_none() {
            return Err(Error::Validation {
                field: "uid",
                reason: format!("expected <server>/<name>, got {:?}", peer.uid),
            });
        }
        peer.updated_at = Utc::now();
        let raw = serde_json::to_vec(&peer)?;
        self.kv.set(&peer_key(&peer.uid), &raw)?;
        Ok(peer)
    }

    /// Deletes the peer with UID `uid`. Missing is not an error.
    pub fn delete(&self, uid: &str) -> Result<()> {
        self.kv.delete(&peer_key(uid))
    }

    /// Lists every peer across every server.
    pub fn list(&self) -> Result<Vec<Peer>> {
        let rows = self.kv.prefix_scan(PEER_PREFIX, ".*")?;
        rows.into_iter()
            .map(|(_, v)| Ok(serde_json::from_slice(&v)?))
            .collect()
    }

    /// Lists every peer belonging to `server`.
    pub fn list_by_server(&self, server: &str) -> Result<Vec<Peer>> {
        let pattern = format!("^{PEER_PREFIX}{}/[^/]+$", regex::escape(server));
        let rows = self.kv.prefix_scan(&format!("{PEER_PREFIX}{server}/"), &pattern)?;
        rows.into_iter()
            .map(|(_, v)| Ok(serde_json::from_slice(&v)?))
            .collect()
    }

    /// Finds the active peer on `server` whose derived public key equals
    /// `pubkey`, if any.
    pub fn search_by_pubkey(&self, server: &str, pubkey: &str) -> Result<Option<Peer>> {
        let now = Utc::now();
        let peers = self.list_by_server(server)?;
        Ok(peers.into_iter().find(|p| {
            p.phase(now) == Phase::Active && p.status.public_key.as_deref() == Some(pubkey)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ExpireAction, PeerSpec, PeerStatus};

    fn open_tmp() -> (Kv, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = Kv::open(dir.path().join("store.db")).expect("open");
        (kv, dir)
    }

    fn sample_peer(uid: &str) -> Peer {
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
            status: PeerStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn peer_round_trips_through_update_and_get() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        let written = peers.update(sample_peer("dev/alice")).unwrap();
        let read = peers.get("dev/alice").unwrap();
        assert_eq!(read.uid, written.uid);
        assert_eq!(read.updated_at, written.updated_at);
    }

    #[test]
    fn update_rejects_malformed_uid() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        let result = peers.update(sample_peer("no-slash"));
        assert!(matches!(result, Err(Error::Validation { field: "uid", .. })));
    }

    #[test]
    fn list_by_server_only_returns_that_server() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        peers.update(sample_peer("dev/alice")).unwrap();
        peers.update(sample_peer("dev/bob")).unwrap();
        peers.update(sample_peer("prod/alice")).unwrap();

        let dev_peers = peers.list_by_server("dev").unwrap();
        assert_eq!(dev_peers.len(), 2);
        assert!(dev_peers.iter().all(|p| p.server_name() == Some("dev")));
    }

    #[test]
    fn search_by_pubkey_only_matches_active_peers() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        let mut p = sample_peer("dev/alice");
        p.status.public_key = Some("abc".to_string());
        peers.update(p).unwrap();

        assert!(peers.search_by_pubkey("dev", "abc").unwrap().is_some());
        assert!(peers.search_by_pubkey("dev", "zzz").unwrap().is_none());
    }

    #[test]
    fn get_missing_peer_errors() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        assert!(matches!(peers.get("dev/ghost"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn delete_is_idempotent() {
        let (kv, _dir) = open_tmp();
        let peers = PeerCollection { kv: &kv };
        peers.update(sample_peer("dev/alice")).unwrap();
        peers.delete("dev/alice").unwrap();
        peers.delete("dev/alice").unwrap();
        assert!(peers.get("dev/alice").is_err());
    }
}
