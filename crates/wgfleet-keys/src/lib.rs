//! WireGuard Curve25519 key types: the codec every server and peer record
//! stores its public key as, and every private key is generated through.

pub mod error;
mod keys;

pub use error::WireGuardError;
pub use keys::{generate_keypair, KeyPair, PrivateKey, PublicKey, KEY_SIZE};
