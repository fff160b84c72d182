//! Syncing the local database directory against a cloud object store.
//!
//! Every mutating command pulls the canonical blob before opening the local
//! store and pushes it back after closing. There is no multi-writer
//! arbitration: the last push wins.
//!
//! [`Kv`](crate::kv::Kv) is a [`sled`] database, which owns a directory, not
//! a single file — a pull unpacks the downloaded gzipped tarball into that
//! directory and a push re-archives it, rather than treating the path as a
//! flat file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use google_cloud_storage::client::{Client, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use tracing::{info, warn};

use crate::error::{Error, Result};

/// The object name the canonical database archive is stored under.
pub const OBJECT_NAME: &str = "wireguard.db";

/// How long a pull or push is given to complete before it is abandoned.
const REMOTE_DEADLINE: Duration = Duration::from_secs(10);

/// A connection to the bucket backing one fleet's desired state.
pub struct RemoteSync {
    client: Client,
    bucket: String,
}

impl RemoteSync {
    /// Connects using the ambient application-default credential chain.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials cannot be discovered.
    pub async fn connect(bucket: impl Into<String>) -> Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .map_err(|e| Error::RemoteIo(format!("credential discovery failed: {e}")))?;
        Ok(Self {
            client: Client::new(config),
            bucket: bucket.into(),
        })
    }

    /// Downloads the canonical database archive and unpacks it into `dir`,
    /// or creates an empty `dir` if the archive does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the download fails for any reason other than the
    /// object being absent, or if the archive cannot be unpacked.
    pub async fn pull(&self, dir: &Path) -> Result<()> {
        let req = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: OBJECT_NAME.to_string(),
            ..Default::default()
        };

        let download = tokio::time::timeout(
            REMOTE_DEADLINE,
            self.client.download_object(&req, &Range::default()),
        )
        .await
        .map_err(|_| Error::RemoteIo("pull timed out".to_string()));

        match download {
            Ok(Ok(bytes)) => {
                tokio::fs::create_dir_all(dir).await?;
                unpack_archive(dir, &bytes)?;
                info!(bucket = %self.bucket, "pulled remote database");
                Ok(())
            }
            Ok(Err(e)) if is_not_found(&e) => {
                tokio::fs::create_dir_all(dir).await?;
                info!(bucket = %self.bucket, "no remote database yet, starting fresh");
                Ok(())
            }
            Ok(Err(e)) => Err(Error::RemoteIo(e.to_string())),
            Err(e) => Err(e),
        }
    }

    /// Archives the directory at `dir` and uploads it back to the canonical
    /// object.
    ///
    /// # Errors
    ///
    /// Returns an error if archiving fails, or if the upload fails or does
    /// not complete within the remote deadline.
    pub async fn push(&self, dir: &Path) -> Result<()> {
        let dir = dir.to_path_buf();
        let bytes = tokio::task::spawn_blocking(move || pack_archive(&dir))
            .await
            .map_err(|e| Error::RemoteIo(format!("archiving panicked: {e}")))??;

        let upload_type = UploadType::Simple(Media::new(OBJECT_NAME.to_string()));
        let req = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        tokio::time::timeout(
            REMOTE_DEADLINE,
            self.client.upload_object(&req, bytes, &upload_type),
        )
        .await
        .map_err(|_| Error::RemoteIo("push timed out".to_string()))?
        .map_err(|e| Error::RemoteIo(e.to_string()))?;

        info!(bucket = %self.bucket, "pushed local database to remote");
        Ok(())
    }
}

fn is_not_found(err: &google_cloud_storage::http::Error) -> bool {
    matches!(err, google_cloud_storage::http::Error::Response(r) if r.code == 404)
}

/// Unpacks a gzipped tarball of a sled directory's contents into `dir`.
fn unpack_archive(dir: &Path, bytes: &[u8]) -> Result<()> {
    let decoder = GzDecoder::new(bytes);
    let mut archive = tar::Archive::new(decoder);
    archive.unpack(dir)?;
    Ok(())
}

/// Archives the contents of `dir` into a gzipped tarball.
fn pack_archive(dir: &Path) -> Result<Vec<u8>> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(".", dir)?;
    let encoder = builder.into_inner()?;
    Ok(encoder.finish()?)
}

/// Resolves the path the local database directory lives at when running
/// with remote sync enabled: a fixed directory name inside a working
/// directory.
#[must_use]
pub fn local_db_path(workdir: &Path) -> PathBuf {
    workdir.join(OBJECT_NAME)
}

/// Warns and continues rather than failing a whole control-loop pass when a
/// remote sync step errors out; one-shot callers should propagate instead.
pub fn log_and_continue(context: &str, err: &Error) {
    warn!(context, error = %err, "remote sync step failed, continuing");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::Kv;

    #[test]
    fn archive_round_trips_a_sled_directory() {
        let src_parent = tempfile::tempdir().expect("tempdir");
        let src = src_parent.path().join("store.db");
        {
            let kv = Kv::open(&src).expect("open");
            kv.set("/wgsconfig/dev", b"payload").expect("set");
            kv.close().expect("close");
        }

        let bytes = pack_archive(&src).expect("pack");

        let dst_parent = tempfile::tempdir().expect("tempdir");
        let dst = dst_parent.path().join("store.db");
        unpack_archive(&dst, &bytes).expect("unpack");

        let kv = Kv::open(&dst).expect("reopen");
        assert_eq!(kv.get("/wgsconfig/dev").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn local_db_path_joins_object_name() {
        let path = local_db_path(Path::new("/tmp/wgfleet"));
        assert_eq!(path, Path::new("/tmp/wgfleet/wireguard.db"));
    }
}
