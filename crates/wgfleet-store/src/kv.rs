//! The embedded single-tree key-value file.
//!
//! Every server and peer record lives as one JSON value under one key in a
//! single [`sled`] tree. [`Kv::prefix_scan`] is the only listing primitive;
//! typed collections build their `list`/`list_by_server` operations on top
//! of it.

use std::path::Path;

use regex::Regex;

use crate::error::{Error, Result};

/// A handle on the local on-disk database file.
pub struct Kv {
    db: sled::Db,
}

impl Kv {
    /// Opens (creating if absent) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Reads the raw bytes stored at `key`.
    pub fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.db.get(key)?.map(|v| v.to_vec()))
    }

    /// Writes `value` under `key`, overwriting any previous value.
    pub fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        self.db.insert(key, value)?;
        Ok(())
    }

    /// Removes `key`. A missing key is not an error.
    pub fn delete(&self, key: &str) -> Result<()> {
        self.db.remove(key)?;
        Ok(())
    }

    /// Iterates every `(key, value)` pair whose key starts with `prefix` AND
    /// matches `pattern`, in key order.
    ///
    /// # Errors
    ///
    /// Returns an error if `pattern` fails to compile.
    pub fn prefix_scan(&self, prefix: &str, pattern: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let re = Regex::new(pattern)?;
        let mut out = Vec::new();
        for entry in self.db.scan_prefix(prefix) {
            let (key, value) = entry?;
            let key = String::from_utf8_lossy(&key).into_owned();
            if re.is_match(&key) {
                out.push((key, value.to_vec()));
            }
        }
        Ok(out)
    }

    /// Flushes pending writes to disk and drops the underlying handle.
    pub fn close(self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Path to the database file, for remote sync to read back.
    #[must_use]
    pub fn was_recovered(&self) -> bool {
        self.db.was_recovered()
    }
}

impl std::fmt::Debug for Kv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kv").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_tmp() -> (Kv, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("tempdir");
        let kv = Kv::open(dir.path().join("store.db")).expect("open");
        (kv, dir)
    }

    #[test]
    fn get_missing_key_is_none() {
        let (kv, _dir) = open_tmp();
        assert_eq!(kv.get("nope").unwrap(), None);
    }

    #[test]
    fn set_then_get_round_trips() {
        let (kv, _dir) = open_tmp();
        kv.set("/wgsconfig/dev", b"payload").unwrap();
        assert_eq!(kv.get("/wgsconfig/dev").unwrap(), Some(b"payload".to_vec()));
    }

    #[test]
    fn delete_removes_key() {
        let (kv, _dir) = open_tmp();
        kv.set("/peers/dev/alice", b"x").unwrap();
        kv.delete("/peers/dev/alice").unwrap();
        assert_eq!(kv.get("/peers/dev/alice").unwrap(), None);
    }

    #[test]
    fn prefix_scan_filters_by_prefix_and_regex() {
        let (kv, _dir) = open_tmp();
        kv.set("/peers/dev/alice", b"1").unwrap();
        kv.set("/peers/dev/bob", b"2").unwrap();
        kv.set("/peers/prod/alice", b"3").unwrap();
        kv.set("/wgsconfig/dev", b"4").unwrap();

        let got = kv.prefix_scan("/peers/", "^/peers/dev/.+").unwrap();
        let keys: Vec<_> = got.into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["/peers/dev/alice", "/peers/dev/bob"]);
    }

    #[test]
    fn prefix_scan_on_empty_tree_is_empty() {
        let (kv, _dir) = open_tmp();
        assert!(kv.prefix_scan("/peers/", ".*").unwrap().is_empty());
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        let (kv, _dir) = open_tmp();
        let result = kv.prefix_scan("/peers/", "(unclosed");
        assert!(matches!(result, Err(Error::InvalidPattern(_))));
    }
}
