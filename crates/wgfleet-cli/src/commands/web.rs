//! `wgfleet web`: serves the client config delivery handler.

use std::sync::Arc;

use wgfleet_web::{AppState, HeaderSessionSource, StoreBackend};

use crate::cli::{Cli, WebArgs};
use crate::error::{CliError, Result};

/// Executes the web subcommand, serving until the process is killed.
pub async fn execute(cli: &Cli, args: &WebArgs) -> Result<()> {
    let backend = if cli.local_only {
        StoreBackend::Local(cli.workdir.join(wgfleet_store::remote::OBJECT_NAME))
    } else {
        let bucket = cli.bucket.clone().ok_or_else(|| {
            CliError::InvalidArgument(
                "--bucket or GCS_BUCKET_NAME is required unless --local-only is set".to_string(),
            )
        })?;
        StoreBackend::Remote {
            workdir: cli.workdir.clone(),
            bucket,
        }
    };

    let session = Arc::new(HeaderSessionSource {
        header_name: args.session_header.clone(),
    });
    let state = AppState::new(backend, session);
    let router = wgfleet_web::create_router(state);

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .map_err(CliError::Io)?;
    println!("listening on {}", args.listen);
    axum::serve(listener, router)
        .await
        .map_err(|e| CliError::Web(e.to_string()))
}
