//! Merge-sync engine
//!
//! Reconciles each local record file with its remote counterpart:
//! download remote, merge by timestamp key (local wins per key), write
//! the merged text locally, upload it back, notify listeners. The
//! family's store lock is held across the whole cycle so appends cannot
//! interleave with the read-merge-write.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::application::notify::{ChangeEvent, ChangeFeed};
use crate::application::ports::{RemoteError, RemoteFileId, RemoteStore, SettingsStore};
use crate::domain::error::SettingsError;
use crate::domain::record::{merge_lines, remove_entry, RecordFamily};
use crate::infrastructure::store::{RecordStore, StoreError};

/// Merge-sync errors
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// What a sync invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sync is disabled in settings
    Disabled,
    /// Both sides were empty; nothing written anywhere
    NothingToSync,
    /// Merged content written locally and uploaded
    Merged,
}

/// Reconciles local record files with the remote store.
pub struct MergeSync {
    store: Arc<RecordStore>,
    remote: Arc<dyn RemoteStore>,
    settings: Arc<dyn SettingsStore>,
    feed: ChangeFeed,
    id_cache: Mutex<HashMap<String, RemoteFileId>>,
}

impl MergeSync {
    pub fn new(
        store: Arc<RecordStore>,
        remote: Arc<dyn RemoteStore>,
        settings: Arc<dyn SettingsStore>,
        feed: ChangeFeed,
    ) -> Self {
        Self {
            store,
            remote,
            settings,
            feed,
            id_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile one logical record file with its remote counterpart.
    pub async fn sync_and_merge(&self, family: RecordFamily) -> Result<SyncOutcome, SyncError> {
        if !self.settings.load().await?.sync_enabled {
            return Ok(SyncOutcome::Disabled);
        }

        let guard = self.store.lock_owned(family).await;

        let local = self.store.read_text_raw(family).await?;
        let id = self.ensure_remote_file(family).await?;

        // A failed download reads as "no remote data yet", never fatal.
        let remote_text = match self.remote.download(&id).await {
            Ok(text) => text,
            Err(e) => {
                warn!(file = %family, error = %e, "remote download failed; merging against empty");
                String::new()
            }
        };

        let merged = merge_lines(&remote_text, &local);
        if merged.is_empty() {
            // Do not clobber either side with emptiness
            debug!(file = %family, "merge produced no content; leaving both sides untouched");
            return Ok(SyncOutcome::NothingToSync);
        }

        self.store.write_text_raw(family, &merged).await?;
        self.remote.upload(&id, &merged).await?;
        drop(guard);

        self.feed.publish(ChangeEvent::for_family(family));
        info!(file = %family, "merged and uploaded");
        Ok(SyncOutcome::Merged)
    }

    /// Reconcile every record file family. Per-family errors are logged
    /// and do not stop the rest.
    pub async fn sync_all(&self) {
        for family in RecordFamily::all() {
            if let Err(e) = self.sync_and_merge(family).await {
                warn!(file = %family, error = %e, "sync failed");
            }
        }
    }

    /// Remove the record keyed by `timestamp` from every family, pushing
    /// each rewritten file to the remote when sync is enabled.
    ///
    /// Best effort, not atomic: a failure partway leaves some files
    /// updated and others not; the next sync repairs the remote copies.
    pub async fn delete_entry(&self, timestamp: u64) -> Result<(), SyncError> {
        let push_remote = self.settings.load().await?.sync_enabled;
        let mut first_err = None;

        for family in RecordFamily::all() {
            if let Err(e) = self.delete_from(family, timestamp, push_remote).await {
                warn!(file = %family, error = %e, "entry deletion failed");
                first_err.get_or_insert(e);
            }
        }

        self.feed.publish(ChangeEvent::Summaries);
        self.feed.publish(ChangeEvent::Transcripts);
        match first_err {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn delete_from(
        &self,
        family: RecordFamily,
        timestamp: u64,
        push_remote: bool,
    ) -> Result<(), SyncError> {
        let _guard = self.store.lock_owned(family).await;
        let text = self.store.read_text_raw(family).await?;
        let updated = remove_entry(&text, timestamp);
        if updated == text {
            return Ok(());
        }
        self.store.write_text_raw(family, &updated).await?;
        if push_remote {
            let id = self.ensure_remote_file(family).await?;
            self.remote.upload(&id, &updated).await?;
        }
        Ok(())
    }

    /// Resolve or create the remote id for a family. Consults the
    /// in-memory cache first and, for the base summaries file, the id
    /// persisted in settings.
    async fn ensure_remote_file(&self, family: RecordFamily) -> Result<RemoteFileId, SyncError> {
        let name = family.file_name();
        if let Some(id) = self.id_cache.lock().await.get(&name).cloned() {
            return Ok(id);
        }

        if family == RecordFamily::Summaries {
            if let Some(id) = self.settings.load().await?.summaries_file_id {
                let id = RemoteFileId(id);
                self.id_cache.lock().await.insert(name, id.clone());
                return Ok(id);
            }
        }

        let id = match self.remote.find_file(&name).await? {
            Some(id) => id,
            None => self.remote.create_file(&name).await?,
        };

        if family == RecordFamily::Summaries {
            let mut settings = self.settings.load().await?;
            settings.summaries_file_id = Some(id.0.clone());
            if let Err(e) = self.settings.save(&settings).await {
                warn!(error = %e, "could not persist summaries file id");
            }
        }

        self.id_cache.lock().await.insert(name, id.clone());
        Ok(id)
    }
}
