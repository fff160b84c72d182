//! Resolves the configured store backend and cipher key for a CLI
//! invocation.

use wgfleet_cipher::CipherKey;
use wgfleet_store::Store;

use crate::cli::Cli;
use crate::error::{CliError, Result};

/// Opens the store this invocation is configured to use: local-only, or
/// pulled from the configured bucket.
pub async fn open_store(cli: &Cli) -> Result<Store> {
    if cli.local_only {
        return Ok(Store::open_local(
            cli.workdir.join(wgfleet_store::remote::OBJECT_NAME),
        )?);
    }

    let bucket = cli.bucket.as_deref().ok_or_else(|| {
        CliError::InvalidArgument(
            "--bucket or GCS_BUCKET_NAME is required unless --local-only is set".to_string(),
        )
    })?;
    Ok(Store::open_with_remote(&cli.workdir, bucket).await?)
}

/// Closes `store`, pushing to remote unless this invocation is local-only.
pub async fn close_store(cli: &Cli, store: Store) -> Result<()> {
    if cli.local_only {
        Ok(store.close()?)
    } else {
        Ok(store.push_remote().await?)
    }
}

/// Resolves the cipher key from `--cipher-key`/`CIPHER_KEY`, or generates a
/// fresh one and prints it once so the operator can persist it.
pub fn resolve_cipher_key(cli: &Cli) -> Result<CipherKey> {
    match &cli.cipher_key {
        Some(encoded) => Ok(CipherKey::from_base64(encoded)?),
        None => {
            let key = CipherKey::generate();
            eprintln!(
                "warning: no --cipher-key/CIPHER_KEY supplied, generated a new key for this run: {}\n\
                 save it or every server's private key becomes unrecoverable",
                key.to_base64()
            );
            Ok(key)
        }
    }
}
