//! Rendering the three fixed WireGuard INI templates.

use serde::Serialize;
use tera::{Context, Tera};
use wgfleet_store::WireguardClientConfig;

use crate::error::Result;

const SERVER_TEMPLATE: &str = "\
[Interface]
Address    = {{ address }}
ListenPort = {{ listen_port }}
PrivateKey = {{ private_key }}
{% for cmd in post_up %}
PostUp = {{ cmd }}
{%- endfor %}
{% for cmd in post_down %}
PostDown = {{ cmd }}
{%- endfor %}
{% for peer in peers %}

[Peer]
PublicKey  = {{ peer.public_key }}
AllowedIPs = {{ peer.allowed_ips }}
{%- endfor %}
";

const CLIENT_TEMPLATE: &str = "\
[Interface]
PrivateKey = {{ private_key }}
Address    = {{ address }}
DNS        = {{ dns }}
MTU        = {{ mtu }}

[Peer]
PublicKey           = {{ server_public_key }}
AllowedIPs          = {{ allowed_ips }}
Endpoint            = {{ endpoint }}
PersistentKeepalive = {{ persistent_keepalive }}
";

/// A single rendered `[Peer]` stanza in a server's interface file.
#[derive(Debug, Clone, Serialize)]
pub struct ServerPeerEntry {
    /// The peer's base64 public key.
    pub public_key: String,
    /// The peer's allowed-IPs, comma-joined.
    pub allowed_ips: String,
}

/// Everything needed to render a server's interface file.
#[derive(Debug, Clone, Serialize)]
pub struct ServerInterfaceContext {
    /// The server's subnet in CIDR form.
    pub address: String,
    /// The UDP port the interface listens on.
    pub listen_port: u16,
    /// The server's decrypted private key, base64.
    pub private_key: String,
    /// Commands run after the interface comes up.
    pub post_up: Vec<String>,
    /// Commands run before the interface goes down.
    pub post_down: Vec<String>,
    /// The peer entries attached to this server.
    pub peers: Vec<ServerPeerEntry>,
}

/// Renders a server's WireGuard interface file.
///
/// # Errors
///
/// Returns an error if the template engine fails to render the context.
pub fn render_server(context: &ServerInterfaceContext) -> Result<String> {
    let ctx = Context::from_serialize(context)?;
    Ok(Tera::one_off(SERVER_TEMPLATE, &ctx, false)?)
}

/// Renders a client's WireGuard interface file.
///
/// # Errors
///
/// Returns an error if the template engine fails to render the context.
pub fn render_client(config: &WireguardClientConfig) -> Result<String> {
    let mut ctx = Context::new();
    ctx.insert("private_key", &config.private_key);
    ctx.insert("address", &config.address);
    ctx.insert("dns", &config.dns.join(", "));
    ctx.insert("mtu", &config.mtu);
    ctx.insert("server_public_key", &config.server_public_key);
    ctx.insert("allowed_ips", &config.allowed_ips.join(", "));
    ctx.insert("endpoint", &config.endpoint);
    ctx.insert("persistent_keepalive", &config.persistent_keepalive);
    Ok(Tera::one_off(CLIENT_TEMPLATE, &ctx, false)?)
}
