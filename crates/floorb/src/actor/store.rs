//! # Actor Store
//!
//! Directory-backed persistence for actor records. Every actor lives in its own
//! `<root>/<name>.json` document. Writes never truncate the live file: the new
//! document is written to a sibling temp file, synced, and renamed over the old
//! one, so a concurrent `load` sees either the previous or the next version.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::record::{validate_name, ActorRecord, PersistedActor};
use crate::errors::{FloorbError, Result};

const RECORD_EXTENSION: &str = "json";

/// # ActorStore
///
/// Sole reader and writer of the on-disk actor documents below `root`.
///
/// Saves for the same name are serialized through a per-name lock; saves for
/// different names run in parallel.
#[derive(Debug)]
pub struct ActorStore {
    root: PathBuf,
    write_locks: std::sync::Mutex<HashMap<String, Arc<Mutex<()>>>>,
    writes: AtomicU64,
}

impl ActorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_locks: std::sync::Mutex::new(HashMap::new()),
            writes: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the document holding `name`
    pub fn record_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", name, RECORD_EXTENSION))
    }

    /// Number of documents this store has successfully written.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Create and persist a brand new actor.
    ///
    /// Validation happens before anything touches the disk. An existing
    /// record under the same name is never overwritten.
    pub async fn create(
        &self,
        name: &str,
        summary: &str,
        actor_type: &str,
        iri: &str,
    ) -> Result<ActorRecord> {
        let record = ActorRecord::new(name, summary, actor_type, iri)?;

        let lock = self.lock_for(name);
        let _guard = lock.lock().await;

        if fs::try_exists(self.record_path(name))
            .await
            .map_err(|e| FloorbError::persistence(name, e))?
        {
            return Err(FloorbError::persistence(
                name,
                std::io::Error::new(ErrorKind::AlreadyExists, "actor already exists"),
            ));
        }

        self.write_record(&record).await?;
        info!("Created actor '{}' with IRI {}", record.name(), record.iri());
        Ok(record)
    }

    /// Load the actor stored under `name`.
    pub async fn load(&self, name: &str) -> Result<ActorRecord> {
        validate_name(name)?;
        let path = self.record_path(name);
        debug!("Loading actor '{}' from {:?}", name, path);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FloorbError::NotFound(name.to_string()))
            }
            Err(e) => return Err(FloorbError::persistence(name, e)),
        };

        let doc: PersistedActor =
            serde_json::from_slice(&bytes).map_err(|e| FloorbError::corrupt(name, e))?;
        ActorRecord::from_persisted(name, doc)
    }

    /// Overwrite the stored document for `record.name()`.
    pub async fn save(&self, record: &ActorRecord) -> Result<()> {
        let lock = self.lock_for(record.name());
        let _guard = lock.lock().await;
        self.write_record(record).await
    }

    /// Names of every actor with a document in this store, sorted.
    pub async fn list(&self) -> Result<Vec<String>> {
        let root_key = self.root.display().to_string();
        if !fs::try_exists(&self.root)
            .await
            .map_err(|e| FloorbError::persistence(&root_key, e))?
        {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&self.root)
            .await
            .map_err(|e| FloorbError::persistence(&root_key, e))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FloorbError::persistence(&root_key, e))?
        {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                // temp files start with '.', which is never a valid name
                if validate_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    fn lock_for(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self
            .write_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Caller must hold the lock for `record.name()`.
    async fn write_record(&self, record: &ActorRecord) -> Result<()> {
        let name = record.name();
        let json = serde_json::to_vec_pretty(&record.to_persisted())
            .map_err(|e| FloorbError::persistence(name, e.into()))?;

        let target = self.record_path(name);
        let temp = self
            .root
            .join(format!(".{}.{}.tmp", name, Uuid::new_v4().simple()));

        let result = async {
            fs::create_dir_all(&self.root).await?;
            let mut file = fs::File::create(&temp).await?;
            file.write_all(&json).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&temp, &target).await
        }
        .await;

        if let Err(e) = result {
            warn!("Failed to persist actor '{}': {}", name, e);
            let _ = fs::remove_file(&temp).await;
            return Err(FloorbError::persistence(name, e));
        }

        self.writes.fetch_add(1, Ordering::SeqCst);
        debug!("Persisted actor '{}' to {:?}", name, target);
        Ok(())
    }
}
