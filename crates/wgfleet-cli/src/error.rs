//! Top-level CLI error type, aggregating every crate's error below it.

use thiserror::Error;

/// Result type alias for CLI command execution.
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors surfaced at the command line.
#[derive(Debug, Error)]
pub enum CliError {
    /// The supplied argument failed basic validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The store or a typed collection raised an error.
    #[error(transparent)]
    Store(#[from] wgfleet_store::Error),

    /// The IP allocator raised an error.
    #[error(transparent)]
    Net(#[from] wgfleet_net::Error),

    /// A key codec error.
    #[error(transparent)]
    Key(#[from] wgfleet_keys::WireGuardError),

    /// A cipher error.
    #[error(transparent)]
    Cipher(#[from] wgfleet_cipher::Error),

    /// A reconciliation agent raised an error.
    #[error(transparent)]
    Agent(#[from] wgfleet_agent::Error),

    /// Serving the web delivery handler failed.
    #[error("web server error: {0}")]
    Web(String),

    /// Plain filesystem I/O.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_mentions_message() {
        let err = CliError::InvalidArgument("missing --address".to_string());
        assert!(err.to_string().contains("missing --address"));
    }
}
