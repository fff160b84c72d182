//! Error types for the delivery handler, mapped to HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Result type alias for web handler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving a client config download.
#[derive(Debug, Error)]
pub enum Error {
    /// No session could be established; the caller should be sent to sign in.
    #[error("no active session")]
    Unauthenticated,

    /// No peer matched the secret and session email.
    #[error("no matching peer")]
    NotFound,

    /// The peer exists but is blocked.
    #[error("peer is blocked")]
    Blocked,

    /// The one-shot token has expired.
    #[error("download token expired")]
    TokenExpired,

    /// A lower-level store error.
    #[error("store error: {0}")]
    Store(#[from] wgfleet_store::Error),

    /// A template rendering error.
    #[error("template error: {0}")]
    Template(#[from] wgfleet_template::Error),

    /// A key codec error.
    #[error("key error: {0}")]
    Key(#[from] wgfleet_keys::WireGuardError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => {
                axum::response::Redirect::to("/signin").into_response()
            }
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::Blocked | Self::TokenExpired => {
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            Self::Store(_) | Self::Template(_) | Self::Key(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let response = Error::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn blocked_maps_to_400() {
        let response = Error::Blocked.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn token_expired_maps_to_400() {
        let response = Error::TokenExpired.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unauthenticated_redirects() {
        let response = Error::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
}
