//! The top-level [`Store`] handle: opens the local database (optionally
//! after a remote pull) and exposes the typed collections over it.

use std::path::{Path, PathBuf};

use wgfleet_cipher::CipherKey;
use wgfleet_keys::PrivateKey;
use wgfleet_net::IpMap;

use crate::collections::{PeerCollection, ServerCollection};
use crate::error::{Error, Result};
use crate::kv::Kv;
use crate::model::Server;
use crate::remote::{local_db_path, RemoteSync};

/// An open handle on one fleet's desired state.
///
/// Obtained via [`Store::open_local`] for local-only use, or
/// [`Store::open_with_remote`] to pull the canonical blob first. Dropping a
/// `Store` does not push to remote; call [`Store::push_remote`] explicitly
/// after a mutation.
pub struct Store {
    kv: Kv,
    path: PathBuf,
    remote: Option<RemoteSync>,
}

impl Store {
    /// Opens (creating if absent) the local database at `path`, with no
    /// remote sync.
    pub fn open_local(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let kv = Kv::open(&path)?;
        Ok(Self {
            kv,
            path,
            remote: None,
        })
    }

    /// Pulls the canonical blob from `bucket` into `workdir`, then opens it.
    ///
    /// # Errors
    ///
    /// Returns an error if connecting to the object store or pulling the
    /// blob fails.
    pub async fn open_with_remote(workdir: &Path, bucket: &str) -> Result<Self> {
        let remote = RemoteSync::connect(bucket).await?;
        let path = local_db_path(workdir);
        remote.pull(&path).await?;
        let kv = Kv::open(&path)?;
        Ok(Self {
            kv,
            path,
            remote: Some(remote),
        })
    }

    /// Typed access to server records.
    #[must_use]
    pub fn servers(&self) -> ServerCollection<'_> {
        ServerCollection { kv: &self.kv }
    }

    /// Typed access to peer records.
    #[must_use]
    pub fn peers(&self) -> PeerCollection<'_> {
        PeerCollection { kv: &self.kv }
    }

    /// Builds the [`IpMap`] for `server`'s subnet, with every address
    /// already claimed by an existing peer removed from the free set.
    ///
    /// # Errors
    ///
    /// Returns an error if the server's address is not a valid CIDR, or if
    /// listing its peers fails.
    pub fn ip_map_for(&self, server: &Server) -> Result<IpMap> {
        let map = IpMap::new(&server.address)?;
        for peer in self.peers().list_by_server(&server.name)? {
            if let Ok(addr) = peer.spec.allowed_ip.split('/').next().unwrap_or("").parse() {
                map.claim(addr);
            }
        }
        Ok(map)
    }

    /// Decrypts `server`'s private key using `cipher_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the ciphertext is malformed or the decrypted
    /// bytes are not a valid base64 key.
    pub fn decrypt_server_key(
        &self,
        server: &Server,
        cipher_key: &CipherKey,
    ) -> Result<PrivateKey> {
        let ciphertext = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            &server.encrypted_private_key,
        )
        .map_err(|e| Error::Validation {
            field: "encrypted_private_key",
            reason: e.to_string(),
        })?;
        let plaintext = wgfleet_cipher::decrypt(cipher_key, &ciphertext)?;
        let text = String::from_utf8(plaintext).map_err(|e| Error::Validation {
            field: "encrypted_private_key",
            reason: e.to_string(),
        })?;
        Ok(PrivateKey::from_base64(&text)?)
    }

    /// Encrypts `private_key` for storage on a [`Server`] record.
    ///
    /// # Errors
    ///
    /// Returns an error if encryption fails.
    pub fn encrypt_server_key(
        private_key: &PrivateKey,
        cipher_key: &CipherKey,
    ) -> Result<String> {
        let ciphertext = wgfleet_cipher::encrypt(cipher_key, private_key.to_base64().as_bytes())?;
        Ok(base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            ciphertext,
        ))
    }

    /// Flushes and closes the local database, without pushing to remote.
    /// Call [`Store::push_remote`] instead if a push is needed.
    ///
    /// # Errors
    ///
    /// Returns an error if flushing fails.
    pub fn close(self) -> Result<()> {
        self.kv.close()
    }

    /// Closes the local database and pushes it back to the remote bucket
    /// this store was opened from.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RemoteIo`] if this store has no remote configured,
    /// or if the push itself fails.
    pub async fn push_remote(self) -> Result<()> {
        let Self { kv, path, remote } = self;
        let remote = remote.ok_or_else(|| {
            Error::RemoteIo("store was opened without remote sync".to_string())
        })?;
        kv.close()?;
        remote.push(&path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_local_round_trips_a_server() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_local(dir.path().join("store.db")).unwrap();
        let now = chrono::Utc::now();
        let server = Server {
            name: "dev".to_string(),
            address: "10.8.0.0/24".to_string(),
            listen_port: 51820,
            encrypted_private_key: String::new(),
            public_key: "pub".to_string(),
            endpoint: "vpn.test:51820".to_string(),
            post_up: vec![],
            post_down: vec![],
            created_at: now,
            updated_at: now,
        };
        store.servers().update(server.clone()).unwrap();
        let read = store.servers().get("dev").unwrap();
        assert_eq!(read.name, server.name);
    }

    #[test]
    fn server_private_key_round_trips_through_cipher() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open_local(dir.path().join("store.db")).unwrap();
        let cipher_key = CipherKey::generate();
        let (private, public) = wgfleet_keys::generate_keypair();

        let encrypted = Store::encrypt_server_key(&private, &cipher_key).unwrap();
        let now = chrono::Utc::now();
        let server = Server {
            name: "dev".to_string(),
            address: "10.8.0.0/24".to_string(),
            listen_port: 51820,
            encrypted_private_key: encrypted,
            public_key: public.to_base64(),
            endpoint: "vpn.test:51820".to_string(),
            post_up: vec![],
            post_down: vec![],
            created_at: now,
            updated_at: now,
        };
        store.servers().update(server.clone()).unwrap();

        let loaded = store.servers().get("dev").unwrap();
        let decrypted = store.decrypt_server_key(&loaded, &cipher_key).unwrap();
        assert_eq!(decrypted.public_key().to_base64(), loaded.public_key);
    }
}
