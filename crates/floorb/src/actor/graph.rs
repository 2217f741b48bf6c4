//! # Follow Graph
//!
//! The authoritative in-memory view of one actor's record. All graph changes go
//! through the record's lock, are persisted before the lock is released, and
//! are undone in memory if persisting fails.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::activity::{build_follow, Activity};
use crate::actor::record::ActorRecord;
use crate::actor::store::ActorStore;
use crate::errors::{FloorbError, Result};

/// Result of a follow request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowOutcome {
    /// Target was already in `following`; nothing changed
    AlreadyFollowing,
    /// Target was added and persisted; the activity still has to be delivered
    Requested(Activity),
}

impl FollowOutcome {
    pub fn already_following(&self) -> bool {
        matches!(self, FollowOutcome::AlreadyFollowing)
    }
}

/// # FollowGraph
///
/// Owns the in-memory `ActorRecord` for the lifetime of the actor and is the
/// only path through which its sets change.
#[derive(Debug)]
pub struct FollowGraph {
    record: Mutex<ActorRecord>,
    store: Arc<ActorStore>,
}

impl FollowGraph {
    pub fn new(record: ActorRecord, store: Arc<ActorStore>) -> Self {
        Self {
            record: Mutex::new(record),
            store,
        }
    }

    pub fn store(&self) -> &Arc<ActorStore> {
        &self.store
    }

    /// Record the intent to follow `target` and build the Follow activity.
    ///
    /// Repeated requests for the same target are no-ops. The record is saved
    /// before the activity is returned; if the save fails the target is taken
    /// back out and no activity is produced.
    pub async fn request_follow(&self, target: &Url) -> Result<FollowOutcome> {
        let key = target.as_str();
        let mut record = self.record.lock().await;

        if record.is_self(key) {
            return Err(FloorbError::SelfReference(key.to_string()));
        }
        if record.is_following(key) {
            debug!("'{}' already follows {}", record.name(), key);
            return Ok(FollowOutcome::AlreadyFollowing);
        }

        record.insert_following(key.to_string());
        if let Err(e) = self.store.save(&record).await {
            record.remove_following(key);
            warn!(
                "Rolled back follow of {} by '{}': {}",
                key,
                record.name(),
                e
            );
            return Err(e);
        }

        info!("'{}' now follows {}", record.name(), key);
        Ok(FollowOutcome::Requested(build_follow(
            record.parsed_iri(),
            target,
        )))
    }

    /// Add `remote` to the followers set once the engine has accepted its
    /// Follow. Returns `true` when the set changed.
    pub async fn accept_follower(&self, remote: &Url) -> Result<bool> {
        let key = remote.as_str();
        let mut record = self.record.lock().await;

        if record.is_self(key) {
            return Err(FloorbError::SelfReference(key.to_string()));
        }
        if !record.insert_follower(key.to_string()) {
            debug!("{} already follows '{}'", key, record.name());
            return Ok(false);
        }

        if let Err(e) = self.store.save(&record).await {
            record.remove_follower(key);
            warn!(
                "Rolled back follower {} of '{}': {}",
                key,
                record.name(),
                e
            );
            return Err(e);
        }

        info!("{} now follows '{}'", key, record.name());
        Ok(true)
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> ActorRecord {
        self.record.lock().await.clone()
    }

    pub async fn following(&self) -> Vec<String> {
        self.record.lock().await.following().iter().cloned().collect()
    }

    pub async fn followers(&self) -> Vec<String> {
        self.record.lock().await.followers().iter().cloned().collect()
    }
}
