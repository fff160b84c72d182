//! Symmetric cipher protecting server private keys at rest.
//!
//! Uses AES-256 in CFB mode with PKCS7 padding. The output format is:
//! `iv || ciphertext`, where `iv` is a random 16-byte initialization vector
//! generated fresh for every call to [`encrypt`].

use aes::Aes256;
use base64::Engine;
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of the cipher key in bytes (AES-256).
pub const KEY_SIZE: usize = 32;

/// Size of the initialization vector in bytes (one AES block).
pub const IV_SIZE: usize = 16;

type Aes256CfbEnc = Encryptor<Aes256>;
type Aes256CfbDec = Decryptor<Aes256>;

/// The symmetric key used to encrypt server private keys at rest.
///
/// The key is securely zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: [u8; KEY_SIZE],
}

impl CipherKey {
    /// Builds a cipher key from a standard-base64-encoded string, the form
    /// the key is supplied in via the `CIPHER_KEY` environment variable.
    ///
    /// The decoded bytes are padded with zeros or truncated to exactly
    /// [`KEY_SIZE`] bytes rather than rejected on a length mismatch.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid base64.
    pub fn from_base64(s: &str) -> Result<Self> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(s)
            .map_err(|e| Error::BadKey {
                reason: format!("invalid base64: {e}"),
            })?;
        Ok(Self::from_bytes_padded(&decoded))
    }

    /// Builds a cipher key from raw bytes, padding with zeros or truncating
    /// to exactly [`KEY_SIZE`] bytes.
    #[must_use]
    pub fn from_bytes_padded(bytes: &[u8]) -> Self {
        let mut key_bytes = [0u8; KEY_SIZE];
        let n = bytes.len().min(KEY_SIZE);
        key_bytes[..n].copy_from_slice(&bytes[..n]);
        Self { bytes: key_bytes }
    }

    /// Generates a new random cipher key.
    ///
    /// Draws [`KEY_SIZE`] random bytes from the OS CSPRNG, then composes a
    /// SHA-256 digest of the base64-alphabet representation of those bytes
    /// and uses the digest as the key, matching the shape of a key this
    /// crate would also accept back from [`Self::to_base64`].
    #[must_use]
    pub fn generate() -> Self {
        let mut seed = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut seed);
        let encoded = base64::engine::general_purpose::STANDARD.encode(seed);

        let mut hasher = Sha256::new();
        hasher.update(encoded.as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; KEY_SIZE];
        bytes.copy_from_slice(&digest);
        Self { bytes }
    }

    /// Encodes the key as standard base64, for advertising a freshly
    /// generated key back to the caller.
    #[must_use]
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(self.bytes)
    }
}

impl std::fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

fn pkcs7_pad(data: &[u8]) -> Vec<u8> {
    let pad_len = IV_SIZE - (data.len() % IV_SIZE);
    let mut padded = Vec::with_capacity(data.len() + pad_len);
    padded.extend_from_slice(data);
    padded.extend(std::iter::repeat(pad_len as u8).take(pad_len));
    padded
}

fn pkcs7_unpad(data: &[u8]) -> Result<Vec<u8>> {
    let Some(&pad_len) = data.last() else {
        return Err(Error::BadCipher {
            reason: "empty plaintext".to_string(),
        });
    };
    let pad_len = pad_len as usize;
    if pad_len == 0 || pad_len > data.len() || pad_len > IV_SIZE {
        return Err(Error::BadCipher {
            reason: "invalid PKCS7 padding length".to_string(),
        });
    }
    let (body, padding) = data.split_at(data.len() - pad_len);
    if padding.iter().any(|&b| b as usize != pad_len) {
        return Err(Error::BadCipher {
            reason: "malformed PKCS7 padding bytes".to_string(),
        });
    }
    Ok(body.to_vec())
}

/// Encrypts plaintext with AES-256-CFB, PKCS7-padded, and a fresh random IV.
///
/// The output format is: `iv || ciphertext`.
///
/// # Errors
///
/// Never fails for valid inputs; the `Result` exists for interface symmetry
/// with [`decrypt`].
pub fn encrypt(key: &CipherKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut buf = pkcs7_pad(plaintext);
    Aes256CfbEnc::new(&key.bytes.into(), &iv.into()).encrypt(&mut buf);

    let mut output = Vec::with_capacity(IV_SIZE + buf.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&buf);
    Ok(output)
}

/// Decrypts ciphertext produced by [`encrypt`].
///
/// Expects the input format: `iv || ciphertext`.
///
/// # Errors
///
/// Returns an error if the ciphertext is shorter than one IV, its length
/// is not a multiple of the AES block size, or PKCS7 unpadding fails.
pub fn decrypt(key: &CipherKey, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() <= IV_SIZE {
        return Err(Error::BadCipher {
            reason: "ciphertext too short to contain an IV".to_string(),
        });
    }
    if (ciphertext.len() - IV_SIZE) % IV_SIZE != 0 {
        return Err(Error::BadCipher {
            reason: "ciphertext length is not a multiple of the block size".to_string(),
        });
    }

    let (iv, body) = ciphertext.split_at(IV_SIZE);
    let mut buf = body.to_vec();
    Aes256CfbDec::new(&key.bytes.into(), iv.into()).decrypt(&mut buf);

    pkcs7_unpad(&buf)
}
