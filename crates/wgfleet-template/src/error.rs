//! Error types for template rendering.

use thiserror::Error;

/// Result type alias for template operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering a WireGuard config file.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying template engine failed to render.
    #[error("template render error: {0}")]
    Render(#[from] tera::Error),
}
