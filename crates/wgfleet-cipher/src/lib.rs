//! # wgfleet-cipher
//!
//! Symmetric encryption for WireGuard server private keys at rest.
//!
//! The store never writes a server's private key to the embedded
//! database or the remote object store in plaintext: every write goes
//! through [`encrypt`], and every read comes back out through [`decrypt`].
//!
//! ## Example
//!
//! ```rust
//! use wgfleet_cipher::{encrypt, decrypt, CipherKey};
//!
//! let key = CipherKey::generate();
//! let ciphertext = encrypt(&key, b"private key bytes").expect("encrypt");
//! let plaintext = decrypt(&key, &ciphertext).expect("decrypt");
//! assert_eq!(plaintext, b"private key bytes");
//! ```
//!
//! ## Security Considerations
//!
//! - [`CipherKey`] uses `zeroize` to securely clear memory on drop
//! - Debug output for the key is redacted

pub mod encryption;
pub mod error;

pub use encryption::{CipherKey, IV_SIZE, KEY_SIZE};
pub use error::{Error, Result};

/// Encrypts plaintext under the given key. See [`encryption::encrypt`].
pub fn encrypt(key: &CipherKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    encryption::encrypt(key, plaintext)
}

/// Decrypts ciphertext under the given key. See [`encryption::decrypt`].
pub fn decrypt(key: &CipherKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    encryption::decrypt(key, ciphertext)
}
