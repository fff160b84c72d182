//! The one-shot client config download handler.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use wgfleet_keys::generate_keypair;
use wgfleet_store::{Peer, Phase, WireguardClientConfig};
use wgfleet_template::render_client;

use crate::error::{Error, Result};
use crate::state::AppState;

/// Query parameters on the download URL.
#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    /// Which server's VPN the peer belongs to.
    pub vpn: String,
}

const TOKEN_WINDOW_MINUTES: i64 = 15;
const DEFAULT_KEEPALIVE: u32 = 25;

/// `GET /peers/:secret?vpn=:server`
///
/// # Errors
///
/// See [`Error`] for the cases mapped to each HTTP status.
pub async fn download_peer_config(
    State(state): State<AppState>,
    Path(secret): Path<String>,
    Query(query): Query<DownloadQuery>,
    headers: HeaderMap,
) -> Result<Response> {
    let email = state
        .session
        .session_email(&headers)
        .ok_or(Error::Unauthenticated)?;

    let store = state.backend.open().await?;

    let now = Utc::now();
    let peer = store
        .peers()
        .list_by_server(&query.vpn)?
        .into_iter()
        .find(|p| p.status.secret_value == secret && matches_session(p, &email))
        .ok_or(Error::NotFound)?;

    if peer.phase(now) == Phase::Blocked {
        return Err(Error::Blocked);
    }
    if now - peer.updated_at > chrono::Duration::minutes(TOKEN_WINDOW_MINUTES) {
        return Err(Error::TokenExpired);
    }

    let (fresh_private, fresh_public) = generate_keypair();

    let server = store.servers().get(&query.vpn)?;

    let client_config = WireguardClientConfig {
        private_key: fresh_private.to_base64(),
        address: peer.spec.allowed_ip.clone(),
        dns: WireguardClientConfig::default_dns(),
        mtu: peer.spec.client_mtu.clone(),
        server_public_key: server.public_key.clone(),
        allowed_ips: WireguardClientConfig::default_allowed_ips(),
        endpoint: server.endpoint.clone(),
        persistent_keepalive: DEFAULT_KEEPALIVE,
    };
    let rendered = render_client(&client_config)?;

    let mut updated = peer;
    updated.status.public_key = Some(fresh_public.to_base64());
    updated.status.secret_value = String::new();
    store.peers().update(updated)?;
    store.push_remote().await.or_else(|e| {
        // A local-only backend has no remote configured; that is not a
        // failure for this handler.
        if matches!(e, wgfleet_store::Error::RemoteIo(_)) {
            Ok(())
        } else {
            Err(e)
        }
    })?;

    let filename = format!("{}-{}.conf", query.vpn, now.timestamp());
    Ok(attachment_response(&rendered, &filename))
}

fn matches_session(peer: &Peer, email: &str) -> bool {
    peer.uid
        .rsplit('/')
        .next()
        .is_some_and(|name| name == email)
}

fn attachment_response(body: &str, filename: &str) -> Response {
    let mut response = (StatusCode::OK, body.to_string()).into_response();
    let headers = response.headers_mut();
    headers.insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        axum::http::header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    headers.insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgfleet_store::{ExpireAction, PeerSpec, PeerStatus};

    fn peer(uid: &str) -> Peer {
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
                secret_value: "tok".to_string(),
                public_key: None,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn matches_session_compares_uid_tail() {
        assert!(matches_session(&peer("dev/alice@example.com"), "alice@example.com"));
        assert!(!matches_session(&peer("dev/alice@example.com"), "bob@example.com"));
    }

    #[test]
    fn attachment_response_sets_headers() {
        let response = attachment_response("body text", "dev-123.conf");
        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert!(headers
            .get(axum::http::header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .contains("dev-123.conf"));
        assert_eq!(
            headers.get(axum::http::header::CACHE_CONTROL).unwrap(),
            "no-store, no-cache, must-revalidate"
        );
    }
}
