//! Error types for the at-rest cipher.

use thiserror::Error;

/// Errors that can occur while building a cipher or encrypting/decrypting
/// a server's private key material.
#[derive(Debug, Error)]
pub enum Error {
    /// The cipher key was not valid base64, or did not decode to the
    /// required key length.
    #[error("bad cipher key: {reason}")]
    BadKey {
        /// The reason the key was rejected.
        reason: String,
    },

    /// Ciphertext was too short to contain an IV, or its padding was
    /// malformed after decryption.
    #[error("bad cipher text: {reason}")]
    BadCipher {
        /// The reason the ciphertext was rejected.
        reason: String,
    },
}

/// Result type alias for cipher operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formats_correctly() {
        let err = Error::BadKey {
            reason: "expected 32 bytes, got 16".to_string(),
        };
        assert_eq!(err.to_string(), "bad cipher key: expected 32 bytes, got 16");

        let err = Error::BadCipher {
            reason: "ciphertext shorter than IV".to_string(),
        };
        assert_eq!(err.to_string(), "bad cipher text: ciphertext shorter than IV");
    }
}
