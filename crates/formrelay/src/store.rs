//! JSON document store for decoded entries.
//!
//! The whole history lives in one JSON object mapping timestamp keys to
//! records. Every merge reads the document in full, inserts one entry and
//! rewrites it. There is a single writer (the decoder loop), so no locking
//! is done here.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::record::Entry;

/// The in-memory form of the store document.
pub type Document = Map<String, Value>;

/// Handle to the on-disk store document.
///
/// Cheap to clone; it only carries the document path.
#[derive(Debug, Clone)]
pub struct Store {
    /// Path to the JSON document.
    path: PathBuf,
}

impl Store {
    /// Create a store backed by the document at `path`.
    ///
    /// Nothing touches the filesystem until the first merge.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the path to the document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merge one entry into the document and write it back.
    ///
    /// Creates the document (and its directory) if absent. An unreadable
    /// document is replaced by one containing only this entry. An entry
    /// with an existing timestamp overwrites the stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, the document, or its temporary
    /// sibling cannot be created, read or written.
    pub fn merge_and_persist(&self, entry: &Entry) -> Result<()> {
        self.ensure_exists()?;

        let mut document = self.load()?;
        let record = serde_json::to_value(&entry.record)?;
        if document.insert(entry.timestamp.clone(), record).is_some() {
            warn!("Overwriting existing entry {}", entry.timestamp);
        }

        self.write(&document)?;
        debug!(
            "Persisted entry {} ({} entries total)",
            entry.timestamp,
            document.len()
        );
        Ok(())
    }

    /// Read the current document.
    ///
    /// A missing document reads as empty. So does one that isn't valid
    /// JSON or whose top level isn't an object.
    ///
    /// # Errors
    ///
    /// Returns an error if the document exists but cannot be read.
    pub fn load(&self) -> Result<Document> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Document::new()),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(document)) => Ok(document),
            Ok(_) => {
                warn!(
                    "Store document {} is not a JSON object, starting empty",
                    self.path.display()
                );
                Ok(Document::new())
            }
            Err(e) => {
                warn!(
                    "Failed to parse store document {}: {e}; starting empty",
                    self.path.display()
                );
                Ok(Document::new())
            }
        }
    }

    fn ensure_exists(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        if !self.path.exists() {
            info!("Creating store document at {}", self.path.display());
            self.write(&Document::new())?;
        }
        Ok(())
    }

    /// Write the document to a sibling file, then rename it into place.
    fn write(&self, document: &Document) -> Result<()> {
        let json = serde_json::to_string_pretty(document)?;

        let temp = self.temp_path();
        fs::write(&temp, json).map_err(|source| Error::StoreWrite {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| Error::StoreWrite {
            path: self.path.clone(),
            source,
        })?;
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
