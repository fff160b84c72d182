//! The data model: servers, peers, and the transient client config assembled
//! on download.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A WireGuard VPN server instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    /// Unique name, also the record's UID.
    pub name: String,
    /// The server's subnet in CIDR form, e.g. `10.8.0.0/24`.
    pub address: String,
    /// UDP port the interface listens on.
    pub listen_port: u16,
    /// Base64 of the AES-CFB ciphertext of the server's private key.
    pub encrypted_private_key: String,
    /// The server's base64 Curve25519 public key.
    pub public_key: String,
    /// Public `host:port` clients dial.
    pub endpoint: String,
    /// Shell commands run after the interface comes up.
    pub post_up: Vec<String>,
    /// Shell commands run before the interface goes down.
    pub post_down: Vec<String>,
    /// When this record was first created.
    pub created_at: DateTime<Utc>,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Server {
    /// The UID a server record is stored and looked up under.
    #[must_use]
    pub fn uid(&self) -> &str {
        &self.name
    }
}

/// What happens to a peer once its lease expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpireAction {
    /// No expiry is enforced.
    Default,
    /// The peer's clock resets and it is treated as freshly created.
    Reset,
    /// The peer is locked out of the live interface once expired.
    Block,
}

impl Default for ExpireAction {
    fn default() -> Self {
        Self::Default
    }
}

/// The administrator-declared shape of a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSpec {
    /// The single host address (CIDR) reserved for this peer.
    pub allowed_ip: String,
    /// A public key that never rotates on download, for peers that are
    /// provisioned out of band.
    pub persistent_public_key: Option<String>,
    /// What to do once the peer's lease expires.
    #[serde(default)]
    pub expire_action: ExpireAction,
    /// Lease duration, parsed with [`humantime`]-style suffixes (e.g. `"24h"`).
    pub expire_duration: String,
    /// MTU advertised to the client, as a string for direct INI interpolation.
    #[serde(default = "default_mtu")]
    pub client_mtu: String,
    /// Administrator kill switch, independent of expiry.
    #[serde(default)]
    pub blocked: bool,
}

fn default_mtu() -> String {
    "1280".to_string()
}

/// Runtime, as opposed to declared, peer state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeerStatus {
    /// One-shot download token; cleared once the client config is served.
    pub secret_value: String,
    /// Set when a config is minted; cleared again once a fresh one is
    /// requested for a rotating peer.
    pub public_key: Option<String>,
}

/// A peer's derived lifecycle state. Never persisted; always recomputed from
/// [`PeerSpec`] + [`PeerStatus`] + the current time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// The administrator has disabled this peer outright.
    Blocked,
    /// No config has been downloaded yet.
    PendingDownload,
    /// The peer's lease has run out.
    Expired,
    /// The peer is live and within its lease.
    Active,
}

/// A VPN client attached to a server. UID is `<server>/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peer {
    /// `<server>/<name>`.
    pub uid: String,
    /// Administrator-declared shape.
    pub spec: PeerSpec,
    /// Runtime state.
    #[serde(default)]
    pub status: PeerStatus,
    /// When this record was first created.
    pub created_at: DateTime<Utc>,
    /// When this record was last written.
    pub updated_at: DateTime<Utc>,
}

impl Peer {
    /// Splits `<server>/<name>` into its two halves.
    ///
    /// # Errors
    ///
    /// Returns `None` if `uid` does not contain exactly one `/`.
    #[must_use]
    pub fn split_uid(uid: &str) -> Option<(&str, &str)> {
        let mut parts = uid.splitn(2, '/');
        let server = parts.next()?;
        let name = parts.next()?;
        if server.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((server, name))
    }

    /// The server half of this peer's UID.
    #[must_use]
    pub fn server_name(&self) -> Option<&str> {
        Self::split_uid(&self.uid).map(|(server, _)| server)
    }

    /// Whether this peer's lease action would lock it out if expired.
    #[must_use]
    pub fn should_auto_lock(&self, now: DateTime<Utc>) -> bool {
        self.spec.expire_action != ExpireAction::Default && self.is_expired(now)
    }

    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        if self.spec.persistent_public_key.is_some() {
            return false;
        }
        if self.spec.expire_action == ExpireAction::Default {
            return false;
        }
        let Some(lifespan) = parse_duration(&self.spec.expire_duration) else {
            return false;
        };
        let basis = match self.spec.expire_action {
            ExpireAction::Reset => self.created_at,
            ExpireAction::Block | ExpireAction::Default => self.updated_at,
        };
        now - basis > lifespan
    }

    /// Derives this peer's current lifecycle phase.
    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> Phase {
        if self.spec.blocked {
            return Phase::Blocked;
        }
        if self.status.public_key.is_none() {
            return Phase::PendingDownload;
        }
        if self.is_expired(now) {
            return Phase::Expired;
        }
        Phase::Active
    }
}

/// Parses durations like `"24h"`, `"15m"`, `"30s"`; unit suffix required.
fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    let (value, unit) = s.split_at(s.len().checked_sub(1)?);
    let value: i64 = value.parse().ok()?;
    match unit {
        "s" => Some(Duration::seconds(value)),
        "m" => Some(Duration::minutes(value)),
        "h" => Some(Duration::hours(value)),
        "d" => Some(Duration::days(value)),
        _ => None,
    }
}

/// A fully-rendered client configuration, assembled once on download and
/// never persisted.
#[derive(Debug, Clone)]
pub struct WireguardClientConfig {
    /// The client's freshly minted private key, base64.
    pub private_key: String,
    /// The client's reserved address, CIDR form.
    pub address: String,
    /// DNS servers to advertise.
    pub dns: Vec<String>,
    /// MTU to advertise.
    pub mtu: String,
    /// The server's public key.
    pub server_public_key: String,
    /// Networks routed through the tunnel.
    pub allowed_ips: Vec<String>,
    /// The server's public `host:port`.
    pub endpoint: String,
    /// Keepalive interval in seconds.
    pub persistent_keepalive: u32,
}

impl WireguardClientConfig {
    /// The default DNS servers baked into every client config.
    #[must_use]
    pub fn default_dns() -> Vec<String> {
        vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()]
    }

    /// The default allowed-IPs set routing all traffic through the tunnel.
    #[must_use]
    pub fn default_allowed_ips() -> Vec<String> {
        vec!["0.0.0.0/0".to_string(), "::/0".to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_peer(now: DateTime<Utc>) -> Peer {
        Peer {
            uid: "dev/alice".to_string(),
            spec: PeerSpec {
                allowed_ip: "10.8.0.2/32".to_string(),
                persistent_public_key: None,
                expire_action: ExpireAction::Default,
                expire_duration: "24h".to_string(),
                client_mtu: "1280".to_string(),
                blocked: false,
            },
            status: PeerStatus {
                secret_value: "tok".to_string(),
                public_key: None,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn split_uid_requires_exactly_one_slash() {
        assert_eq!(Peer::split_uid("dev/alice"), Some(("dev", "alice")));
        assert_eq!(Peer::split_uid("dev/alice/extra"), None);
        assert_eq!(Peer::split_uid("dev"), None);
        assert_eq!(Peer::split_uid("/alice"), None);
    }

    #[test]
    fn phase_blocked_wins_over_everything() {
        let now = Utc::now();
        let mut peer = base_peer(now);
        peer.spec.blocked = true;
        peer.status.public_key = Some("pub".to_string());
        assert_eq!(peer.phase(now), Phase::Blocked);
    }

    #[test]
    fn phase_pending_download_before_first_config() {
        let now = Utc::now();
        let peer = base_peer(now);
        assert_eq!(peer.phase(now), Phase::PendingDownload);
    }

    #[test]
    fn phase_expired_after_reset_lifespan() {
        let now = Utc::now();
        let mut peer = base_peer(now - Duration::hours(25));
        peer.spec.expire_action = ExpireAction::Reset;
        peer.status.public_key = Some("pub".to_string());
        assert_eq!(peer.phase(now), Phase::Expired);
    }

    #[test]
    fn persistent_public_key_never_expires() {
        let now = Utc::now();
        let mut peer = base_peer(now - Duration::hours(999));
        peer.spec.expire_action = ExpireAction::Reset;
        peer.spec.persistent_public_key = Some("fixed-pub".to_string());
        peer.status.public_key = Some("fixed-pub".to_string());
        assert_eq!(peer.phase(now), Phase::Active);
        assert!(!peer.should_auto_lock(now));
    }

    #[test]
    fn should_auto_lock_only_when_expired_and_not_default() {
        let now = Utc::now();
        let mut peer = base_peer(now - Duration::hours(25));
        peer.status.public_key = Some("pub".to_string());
        assert!(!peer.should_auto_lock(now));

        peer.spec.expire_action = ExpireAction::Block;
        assert!(peer.should_auto_lock(now));
    }
}
