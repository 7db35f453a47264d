//! Persistent per-source dedup store
//!
//! One JSON file per source holds the canonical serializations of every raw
//! descriptor that has been fully downloaded and reported. The set never
//! shrinks, contains no duplicate canonical forms, and is written back with
//! stable ordering and fixed indentation so diffs stay readable.
//!
//! Concurrent writers are out of scope here: the run controller's single-flight
//! guard is what makes the load-modify-write cycle safe, not file locking.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{RawDescriptor, SourceKind};

const LAST_RUN_FILE: &str = ".last-successful-run";

/// Persistent set of already-processed descriptors, one file per source
pub struct SeenStore {
    dir: PathBuf,
}

impl SeenStore {
    /// Create a store rooted at `dir`. The directory is created lazily on the
    /// first write; a missing directory or file reads as an empty set.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn context_path(&self, kind: SourceKind) -> PathBuf {
        self.dir.join(format!("{kind}.json"))
    }

    fn load(&self, kind: SourceKind) -> Result<Vec<Value>> {
        let path = self.context_path(kind);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(Error::Store { path, source }),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Whether `descriptor` has already been fully processed for `kind`
    pub fn has_seen(&self, kind: SourceKind, descriptor: &RawDescriptor) -> Result<bool> {
        let needle = descriptor.canonical()?;
        for entry in self.load(kind)? {
            if canonical_form(&entry)? == needle {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Record `descriptor` as processed for `kind`.
    ///
    /// Set semantics: re-inserting an existing canonical form is a no-op. The
    /// whole set is re-serialized deterministically and replaced atomically, so
    /// a crash mid-write leaves the previous file intact.
    pub fn mark_seen(&self, kind: SourceKind, descriptor: &RawDescriptor) -> Result<()> {
        let mut canonical: BTreeSet<String> = BTreeSet::new();
        for entry in self.load(kind)? {
            canonical.insert(canonical_form(&entry)?);
        }
        canonical.insert(descriptor.canonical()?);

        let values = canonical
            .iter()
            .map(|entry| serde_json::from_str(entry))
            .collect::<std::result::Result<Vec<Value>, _>>()?;
        let content = serde_json::to_string_pretty(&values)?;

        self.write_atomic(&self.context_path(kind), content.as_bytes())?;
        debug!(context = %kind, entries = values.len(), "dedup set updated");
        Ok(())
    }

    /// Record the wall-clock time of a fully successful run
    pub fn record_last_run(&self, when: DateTime<Utc>) -> Result<()> {
        self.write_atomic(&self.dir.join(LAST_RUN_FILE), when.to_rfc3339().as_bytes())
    }

    /// Timestamp of the last fully successful run, if any
    pub fn last_run(&self) -> Result<Option<DateTime<Utc>>> {
        let path = self.dir.join(LAST_RUN_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Store { path, source }),
        };
        let parsed = DateTime::parse_from_rfc3339(content.trim())
            .map_err(|err| Error::Other(format!("unreadable last-run marker: {err}")))?;
        Ok(Some(parsed.with_timezone(&Utc)))
    }

    fn write_atomic(&self, path: &Path, content: &[u8]) -> Result<()> {
        let io_err = |source| Error::Store {
            path: path.to_path_buf(),
            source,
        };
        std::fs::create_dir_all(&self.dir).map_err(io_err)?;
        let staging = path.with_extension("tmp");
        {
            let mut file = std::fs::File::create(&staging).map_err(io_err)?;
            file.write_all(content).map_err(io_err)?;
            file.sync_all().map_err(io_err)?;
        }
        std::fs::rename(&staging, path).map_err(io_err)
    }
}

/// Canonical text form of an already-parsed store entry.
///
/// Shares the ordering guarantee of [`RawDescriptor::canonical`]: object keys
/// are sorted, so structurally equal entries always compare equal.
fn canonical_form(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
