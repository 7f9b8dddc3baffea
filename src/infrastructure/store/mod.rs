//! Local record file store
//!
//! One directory per family under the data root, one flat text file
//! inside. All writers serialize on a per-family async mutex: appends
//! lock internally, while the merge-sync engine holds the same mutex
//! across its whole read-merge-write cycle via [`RecordStore::lock_owned`]
//! and the `*_raw` methods.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex as StdMutex};

use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::record::{Record, RecordFamily};

/// Record file storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record file I/O failed: {0}")]
    Io(#[from] io::Error),
}

/// The shared local store for every record file family.
pub struct RecordStore {
    root: PathBuf,
    locks: StdMutex<HashMap<RecordFamily, Arc<Mutex<()>>>>,
}

impl RecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            locks: StdMutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the family's record file
    pub fn file_path(&self, family: RecordFamily) -> PathBuf {
        self.root.join(family.dir_name()).join(family.file_name())
    }

    /// Acquire the family's write lock.
    ///
    /// Hold the guard across multi-step cycles; the `*_raw` methods assume
    /// the caller holds it.
    pub async fn lock_owned(&self, family: RecordFamily) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(family).or_default())
        };
        lock.lock_owned().await
    }

    /// Append one record under the family lock.
    pub async fn append(&self, family: RecordFamily, record: &Record) -> Result<(), StoreError> {
        let _guard = self.lock_owned(family).await;
        let path = self.file_path(family);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(format!("{}\n", record.to_line()).as_bytes())
            .await?;
        Ok(())
    }

    /// Read and parse every record, in file order.
    ///
    /// A missing file reads as empty; malformed lines (including a partial
    /// trailing line from a concurrent append) are skipped.
    pub async fn read_records(&self, family: RecordFamily) -> Result<Vec<Record>, StoreError> {
        let _guard = self.lock_owned(family).await;
        let text = self.read_text_raw(family).await?;
        Ok(text.lines().filter_map(Record::parse).collect())
    }

    /// Read the raw file body. Caller must hold the guard from
    /// [`RecordStore::lock_owned`].
    pub async fn read_text_raw(&self, family: RecordFamily) -> Result<String, StoreError> {
        match fs::read_to_string(self.file_path(family)).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the file body wholesale. Caller must hold the guard from
    /// [`RecordStore::lock_owned`].
    pub async fn write_text_raw(&self, family: RecordFamily, text: &str) -> Result<(), StoreError> {
        let path = self.file_path(family);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, text).await?;
        Ok(())
    }
}
