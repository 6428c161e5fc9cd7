//! Core Journal implementation

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::JournalError;

/// A record that can live in a journal
///
/// Records are immutable once appended. The id must be unique within a
/// journal; appends with an id already present are rejected.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + 'static {
    /// Unique, stable identifier of this record
    fn record_id(&self) -> &str;
}

/// Untyped records, used by the `cs` binary to inspect any journal
///
/// The id is taken from `case_id`, falling back to `id`.
impl Record for serde_json::Value {
    fn record_id(&self) -> &str {
        self.get("case_id")
            .or_else(|| self.get("id"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
    }
}

/// Append-only log of records persisted as one JSON array on disk
///
/// Every append takes an exclusive advisory lock on a sibling `.lock` file,
/// re-reads the document, appends, and atomically replaces the file via a
/// temp file + rename. A crash mid-write leaves the previous document intact.
pub struct Journal<R: Record> {
    path: PathBuf,
    lock_path: PathBuf,
    records: Vec<R>,
}

/// Held for the duration of a read-modify-write cycle
struct LockGuard {
    file: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            debug!(error = %e, "LockGuard::drop: unlock failed");
        }
    }
}

impl<R: Record> Journal<R> {
    /// Open the journal at `path`, creating an empty one if it does not exist
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Journal::open: called");

        let dir = parent_dir(&path);
        fs::create_dir_all(&dir)?;

        let lock_path = lock_path_for(&path);

        let records = {
            // Another handle may be appending to a journal created a moment ago
            let _guard = acquire_lock(&lock_path)?;
            if !path.exists() {
                debug!("Journal::open: no journal on disk, initializing empty");
                write_atomic(&path, &Vec::<R>::new())?;
                info!(path = %path.display(), "Initialized empty journal");
            }
            read_records::<R>(&path)?
        };
        debug!(count = records.len(), "Journal::open: loaded records");

        Ok(Self {
            path,
            lock_path,
            records,
        })
    }

    /// Open an existing journal without creating or writing anything
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, JournalError> {
        let path = path.as_ref().to_path_buf();
        debug!(path = %path.display(), "Journal::open_existing: called");
        if !path.is_file() {
            return Err(JournalError::Missing(path));
        }

        let records = read_records::<R>(&path)?;
        let lock_path = lock_path_for(&path);

        Ok(Self {
            path,
            lock_path,
            records,
        })
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a record
    ///
    /// The on-disk document is re-read under the lock first so appends from
    /// other processes sharing the file are preserved.
    pub fn append(&mut self, record: R) -> Result<(), JournalError> {
        debug!(id = %record.record_id(), "Journal::append: called");
        let _guard = acquire_lock(&self.lock_path)?;

        let mut records = read_records::<R>(&self.path)?;
        if records.iter().any(|r| r.record_id() == record.record_id()) {
            debug!(id = %record.record_id(), "Journal::append: duplicate id");
            return Err(JournalError::DuplicateId(record.record_id().to_string()));
        }

        records.push(record);
        write_atomic(&self.path, &records)?;
        self.records = records;

        debug!(count = self.records.len(), "Journal::append: committed");
        Ok(())
    }

    /// All records in append order
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Re-read the document from disk
    pub fn reload(&mut self) -> Result<(), JournalError> {
        debug!("Journal::reload: called");
        self.records = read_records(&self.path)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether a record with exactly this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.record_id() == id)
    }

    /// Find a record by exact id or unique id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Option<&R>, JournalError> {
        debug!(%id_or_prefix, "Journal::resolve: called");
        if let Some(exact) = self.records.iter().find(|r| r.record_id() == id_or_prefix) {
            debug!("Journal::resolve: exact match");
            return Ok(Some(exact));
        }

        let matches: Vec<&R> = self
            .records
            .iter()
            .filter(|r| r.record_id().starts_with(id_or_prefix))
            .collect();

        match matches.len() {
            0 => Ok(None),
            1 => Ok(matches.into_iter().next()),
            count => Err(JournalError::AmbiguousId {
                prefix: id_or_prefix.to_string(),
                count,
            }),
        }
    }
}

fn acquire_lock(lock_path: &Path) -> Result<LockGuard, JournalError> {
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    FileExt::lock_exclusive(&file)?;
    Ok(LockGuard { file })
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn lock_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".lock");
    path.with_file_name(name)
}

fn read_records<R: Record>(path: &Path) -> Result<Vec<R>, JournalError> {
    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&content).map_err(|source| JournalError::Corrupt {
        path: path.to_path_buf(),
        source,
    })
}

fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), JournalError> {
    let mut tmp = tempfile::NamedTempFile::new_in(parent_dir(path))?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| JournalError::Io(e.error))?;
    Ok(())
}
