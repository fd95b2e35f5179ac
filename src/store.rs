use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::{Error, Result};

/// File extension of SQLite-backed localStorage databases.
const STORAGE_EXT: &str = ".localstorage";

/// Identifies a storage partition by scheme and host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    scheme: String,
    host: String,
}

impl Origin {
    /// Scheme assumed when the caller supplies only a host.
    pub const DEFAULT_SCHEME: &str = "http";

    pub fn new(host: impl Into<String>) -> Self {
        Self::with_scheme(host, Self::DEFAULT_SCHEME)
    }

    pub fn with_scheme(host: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Backing files are named `{scheme}_{host}_{port}.localstorage`; the
    /// prefix leaves the port unconstrained.
    fn file_prefix(&self) -> String {
        format!("{}_{}_", self.scheme, self.host)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)
    }
}

/// Read-only handle onto one origin's localStorage database.
///
/// The underlying connection is released when the handle drops.
#[derive(Debug)]
pub struct LocalStorage {
    origin: Origin,
    path: PathBuf,
    conn: Connection,
}

impl LocalStorage {
    /// Open the backing database for `origin` inside `storage_dir`.
    ///
    /// The directory is scanned for the first file matching the origin's
    /// `{scheme}_{host}_` prefix. A missing, unopenable, or foreign file
    /// surfaces as `Error::StoreUnavailable` here, not at first lookup.
    pub fn open(origin: Origin, storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref();
        let path = backing_file(&origin, storage_dir)?;
        tracing::debug!("Opening local storage db: {}", path.display());

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        // A corrupt or unrelated database fails here rather than on first get()
        conn.prepare("SELECT key, value FROM ItemTable LIMIT 1")?;

        Ok(Self { origin, path, conn })
    }

    /// Look up one key, returning the value bytes exactly as stored.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        let value: Option<Value> = self
            .conn
            .query_row(
                "SELECT value FROM ItemTable WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        match value {
            Some(value) => Ok(value_bytes(value)),
            None => Err(Error::KeyNotFound(key.to_string())),
        }
    }

    /// All entries for this origin, keyed by name.
    pub fn read_all(&self) -> Result<HashMap<String, Vec<u8>>> {
        Ok(self.entries()?.into_iter().collect())
    }

    /// All entries in table order.
    pub fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM ItemTable")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Value>(1)?))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (key, value) = row?;
            entries.push((key, value_bytes(value)));
        }
        Ok(entries)
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The resolved backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Locate the first file in `storage_dir` matching the origin's prefix.
fn backing_file(origin: &Origin, storage_dir: &Path) -> Result<PathBuf> {
    let prefix = origin.file_prefix();
    let entries = fs::read_dir(storage_dir).map_err(|err| {
        Error::StoreUnavailable(format!("cannot read {}: {}", storage_dir.display(), err))
    })?;

    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && name.ends_with(STORAGE_EXT) {
            return Ok(entry.path());
        }
    }

    Err(Error::StoreUnavailable(format!(
        "no local storage file for {} in {}",
        origin,
        storage_dir.display()
    )))
}

/// Values are stored as TEXT or BLOB depending on the writing application;
/// either way the caller gets the raw bytes.
fn value_bytes(value: Value) -> Vec<u8> {
    match value {
        Value::Blob(bytes) => bytes,
        Value::Text(text) => text.into_bytes(),
        Value::Integer(n) => n.to_string().into_bytes(),
        Value::Real(n) => n.to_string().into_bytes(),
        Value::Null => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_store(dir: &Path, file_name: &str, entries: &[(&str, &[u8])]) {
        let conn = Connection::open(dir.join(file_name)).unwrap();
        conn.execute_batch(
            "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
        )
        .unwrap();
        for (key, value) in entries {
            conn.execute(
                "INSERT INTO ItemTable (key, value) VALUES (?1, ?2)",
                params![key, value],
            )
            .unwrap();
        }
    }

    #[test]
    fn test_lookup_returns_stored_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_example.com_0.localstorage",
            &[("token", b"abc")],
        );

        let store = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap();
        assert_eq!(store.get("token").unwrap(), b"abc");
    }

    #[test]
    fn test_missing_key_is_key_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_example.com_0.localstorage",
            &[("token", b"abc")],
        );

        let store = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap();
        let err = store.get("missing").unwrap_err();
        assert!(matches!(err, Error::KeyNotFound(_)));
    }

    #[test]
    fn test_repeated_lookups_return_identical_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_example.com_0.localstorage",
            &[("token", b"abc")],
        );

        let store = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap();
        let first = store.get("token").unwrap();
        let second = store.get("token").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scheme_mismatch_is_store_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_example.com_0.localstorage",
            &[("token", b"abc")],
        );

        let err =
            LocalStorage::open(Origin::with_scheme("example.com", "https"), tmp.path())
                .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn test_missing_directory_is_store_unavailable() {
        let err = LocalStorage::open(Origin::new("example.com"), "/nonexistent/storage")
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn test_corrupt_file_is_store_unavailable() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(
            tmp.path().join("http_example.com_0.localstorage"),
            b"not a database",
        )
        .unwrap();

        let err = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn test_any_port_suffix_matches() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_localhost_8080.localstorage",
            &[("session", b"xyz")],
        );

        let store = LocalStorage::open(Origin::new("localhost"), tmp.path()).unwrap();
        assert_eq!(store.get("session").unwrap(), b"xyz");
    }

    #[test]
    fn test_read_all_returns_every_entry() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "https_example.com_0.localstorage",
            &[("a", b"1"), ("b", b"2")],
        );

        let store =
            LocalStorage::open(Origin::with_scheme("example.com", "https"), tmp.path()).unwrap();
        let all = store.read_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"], b"1");
        assert_eq!(all["b"], b"2");
    }

    #[test]
    fn test_entries_preserve_table_order() {
        let tmp = tempfile::tempdir().unwrap();
        create_store(
            tmp.path(),
            "http_example.com_0.localstorage",
            &[("first", b"1"), ("second", b"2")],
        );

        let store = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap();
        let entries = store.entries().unwrap();
        assert_eq!(entries[0].0, "first");
        assert_eq!(entries[1].0, "second");
    }

    #[test]
    fn test_text_values_come_back_as_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let conn = Connection::open(tmp.path().join("http_example.com_0.localstorage")).unwrap();
        conn.execute_batch(
            "CREATE TABLE ItemTable (key TEXT UNIQUE ON CONFLICT REPLACE, value BLOB)",
        )
        .unwrap();
        conn.execute(
            "INSERT INTO ItemTable (key, value) VALUES ('greeting', 'hello')",
            [],
        )
        .unwrap();
        drop(conn);

        let store = LocalStorage::open(Origin::new("example.com"), tmp.path()).unwrap();
        assert_eq!(store.get("greeting").unwrap(), b"hello");
    }

    #[test]
    fn test_origin_defaults_to_http() {
        let origin = Origin::new("example.com");
        assert_eq!(origin.scheme(), "http");
        assert_eq!(origin.host(), "example.com");
        assert_eq!(origin.to_string(), "http://example.com");
    }

    #[test]
    fn test_origin_with_explicit_scheme() {
        let origin = Origin::with_scheme("example.com", "https");
        assert_eq!(origin.to_string(), "https://example.com");
        assert_eq!(origin.file_prefix(), "https_example.com_");
    }
}
