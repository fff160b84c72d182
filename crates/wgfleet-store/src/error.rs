//! Error types for the embedded store, remote sync, and typed collections.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading or writing fleet state.
#[derive(Debug, Error)]
pub enum Error {
    /// A requested server or peer does not exist.
    #[error("{kind} not found: {uid}")]
    NotFound {
        /// The kind of record, e.g. `"server"` or `"peer"`.
        kind: &'static str,
        /// The UID that was not found.
        uid: String,
    },

    /// A record failed basic validation before being written.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The field that failed validation.
        field: &'static str,
        /// The reason it was rejected.
        reason: String,
    },

    /// The regular expression supplied to a prefix scan was malformed.
    #[error("invalid scan pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The local KV file could not be opened or written.
    #[error("local store I/O error: {0}")]
    Local(#[from] sled::Error),

    /// A record failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Pulling from or pushing to the remote object store failed.
    #[error("remote sync error: {0}")]
    RemoteIo(String),

    /// Plain filesystem I/O, e.g. creating an empty local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The IP allocator for a server's subnet raised an error.
    #[error("address allocation error: {0}")]
    Allocation(#[from] wgfleet_net::Error),

    /// Decrypting or encrypting a server's private key failed.
    #[error("cipher error: {0}")]
    Cipher(#[from] wgfleet_cipher::Error),

    /// A stored key could not be parsed.
    #[error("key codec error: {0}")]
    Key(#[from] wgfleet_keys::WireGuardError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_mentions_uid() {
        let err = Error::NotFound {
            kind: "peer",
            uid: "dev/alice".to_string(),
        };
        assert!(err.to_string().contains("dev/alice"));
    }

    #[test]
    fn validation_mentions_field_and_reason() {
        let err = Error::Validation {
            field: "address",
            reason: "not a CIDR".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("address"));
        assert!(msg.contains("not a CIDR"));
    }
}
