//! The dirty sentinel file marking an interrupted server reconcile.
//!
//! If a pass crashes between rewriting the config file and bringing the
//! interface back up, the sentinel survives the crash and forces the next
//! pass to reapply regardless of whether the on-disk hash already matches.

use std::path::{Path, PathBuf};

/// The sentinel path for a given interface config file.
#[must_use]
pub fn sentinel_path(config_path: &Path) -> PathBuf {
    let mut name = config_path.as_os_str().to_owned();
    name.push(".dirty");
    PathBuf::from(name)
}

/// Whether the sentinel for `config_path` currently exists.
#[must_use]
pub fn is_dirty(config_path: &Path) -> bool {
    sentinel_path(config_path).exists()
}

/// Creates the sentinel for `config_path`, overwriting any existing one.
///
/// # Errors
///
/// Returns an error if the sentinel file cannot be created.
pub async fn mark_dirty(config_path: &Path) -> std::io::Result<()> {
    tokio::fs::write(sentinel_path(config_path), []).await
}

/// Removes the sentinel for `config_path`. Missing is not an error.
///
/// # Errors
///
/// Returns an error if removal fails for a reason other than the file
/// already being absent.
pub async fn clear_dirty(config_path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(sentinel_path(config_path)).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lifecycle_marks_checks_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("wg0.conf");

        assert!(!is_dirty(&config));
        mark_dirty(&config).await.unwrap();
        assert!(is_dirty(&config));
        clear_dirty(&config).await.unwrap();
        assert!(!is_dirty(&config));
    }

    #[tokio::test]
    async fn clear_on_absent_sentinel_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("wg0.conf");
        clear_dirty(&config).await.unwrap();
    }

    #[test]
    fn sentinel_path_appends_dirty_suffix() {
        let path = sentinel_path(Path::new("/etc/wireguard/wg0.conf"));
        assert_eq!(path, PathBuf::from("/etc/wireguard/wg0.conf.dirty"));
    }
}
