//! Error types for the reconciliation agents.

use thiserror::Error;

/// Result type alias for agent operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a host against desired state.
#[derive(Debug, Error)]
pub enum Error {
    /// The current process is not root, but a rewrite requires it.
    #[error("must run as root to rewrite the interface config")]
    NotRoot,

    /// A shell-out to `wg` or `wg-quick` failed.
    #[error("shell command failed: {0}")]
    Shell(#[from] wgfleet_validation::command::CommandError),

    /// Reading or writing the interface config file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store or a typed collection raised an error.
    #[error("store error: {0}")]
    Store(#[from] wgfleet_store::Error),

    /// Rendering the interface file failed.
    #[error("template error: {0}")]
    Template(#[from] wgfleet_template::Error),

    /// Decrypting the server's private key failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] wgfleet_cipher::Error),

    /// The output of `wg show <iface> peers` could not be parsed.
    #[error("unparseable wg output: {0}")]
    UnparseableOutput(String),
}
