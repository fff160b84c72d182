//! Shared router state: how to open the store, how to resolve a session.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderMap;
use wgfleet_store::Store;

/// How the handler reaches the desired-state store. OAuth/JWT session
/// handling itself is out of scope here; [`SessionSource`] is the seam the
/// binary supplies a real implementation through.
pub trait SessionSource: Send + Sync {
    /// Resolves the authenticated user's email from the request headers, or
    /// `None` if there is no valid session.
    fn session_email(&self, headers: &HeaderMap) -> Option<String>;
}

/// A [`SessionSource`] that trusts a fixed header value. Useful for local
/// development and tests; production deployments supply their own OAuth/JWT
/// implementation of the trait.
#[derive(Debug, Clone, Default)]
pub struct HeaderSessionSource {
    /// The header name carrying the caller's email.
    pub header_name: String,
}

impl SessionSource for HeaderSessionSource {
    fn session_email(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get(&self.header_name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

/// Where the store this handler serves out of lives.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    /// A local-only file, no remote sync.
    Local(PathBuf),
    /// Pull-before-open, push-after-mutate against an object store bucket.
    Remote {
        /// Scratch directory the local copy of the database lives in.
        workdir: PathBuf,
        /// The bucket holding the canonical blob.
        bucket: String,
    },
}

impl StoreBackend {
    /// Opens the store this backend describes.
    pub async fn open(&self) -> wgfleet_store::Result<Store> {
        match self {
            Self::Local(path) => Store::open_local(path),
            Self::Remote { workdir, bucket } => Store::open_with_remote(workdir, bucket).await,
        }
    }
}

/// Shared state for the delivery router.
#[derive(Clone)]
pub struct AppState {
    /// Where to open the store from on each request.
    pub backend: Arc<StoreBackend>,
    /// Resolves the authenticated caller.
    pub session: Arc<dyn SessionSource>,
}

impl AppState {
    /// Builds a new shared state.
    #[must_use]
    pub fn new(backend: StoreBackend, session: Arc<dyn SessionSource>) -> Self {
        Self {
            backend: Arc::new(backend),
            session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_session_source_reads_configured_header() {
        let source = HeaderSessionSource {
            header_name: "x-session-email".to_string(),
        };
        let mut headers = HeaderMap::new();
        headers.insert("x-session-email", "alice@example.com".parse().unwrap());
        assert_eq!(source.session_email(&headers), Some("alice@example.com".to_string()));
    }

    #[test]
    fn header_session_source_missing_header_is_none() {
        let source = HeaderSessionSource {
            header_name: "x-session-email".to_string(),
        };
        assert_eq!(source.session_email(&HeaderMap::new()), None);
    }
}
