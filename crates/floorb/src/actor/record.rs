//! # Actor Record
//!
//! The durable identity and social graph of a single local actor, and the
//! serialized shape it takes on disk.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use url::Url;

use crate::errors::{FloorbError, Result};
use crate::iri::parse_iri;

/// Empty marker value. Sets are persisted as `{"<iri>": {}}` objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Present {}

/// The on-disk document for one actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PersistedActor {
    pub name: String,
    pub summary: String,
    pub actor_type: String,
    #[serde(rename = "IRI")]
    pub iri: String,
    pub followers: BTreeMap<String, Present>,
    pub following: BTreeMap<String, Present>,
}

/// # ActorRecord
///
/// Identity fields plus the follower/following sets of a local actor.
///
/// The parsed form of `iri` is computed once at construction and never set
/// independently, so it always matches the string it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    name: String,
    summary: String,
    actor_type: String,
    iri: String,
    parsed_iri: Url,
    following: BTreeSet<String>,
    followers: BTreeSet<String>,
}

/// Check that a name can serve as both handle and storage key.
pub fn validate_name(name: &str) -> Result<()> {
    let bad = name.is_empty()
        || name.starts_with('.')
        || name
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_control());
    if bad {
        return Err(FloorbError::InvalidName(name.to_string()));
    }
    Ok(())
}

impl ActorRecord {
    /// Build a fresh record with empty social graph sets.
    pub fn new(name: &str, summary: &str, actor_type: &str, iri: &str) -> Result<Self> {
        validate_name(name)?;
        if actor_type.trim().is_empty() {
            return Err(FloorbError::InvalidActorType);
        }
        let parsed_iri = parse_iri(iri)?;

        Ok(Self {
            name: name.to_string(),
            summary: summary.to_string(),
            actor_type: actor_type.to_string(),
            iri: iri.to_string(),
            parsed_iri,
            following: BTreeSet::new(),
            followers: BTreeSet::new(),
        })
    }

    /// Rebuild a record from its stored document.
    ///
    /// Any violated invariant is reported as `CorruptRecord` so that a bad file
    /// fails the load instead of yielding an actor with an unusable identity.
    pub fn from_persisted(key: &str, doc: PersistedActor) -> Result<Self> {
        if doc.name != key {
            return Err(FloorbError::corrupt(
                key,
                format!("stored name '{}' does not match key", doc.name),
            ));
        }

        let mut record = ActorRecord::new(&doc.name, &doc.summary, &doc.actor_type, &doc.iri)
            .map_err(|e| FloorbError::corrupt(key, e))?;
        let own = record.parsed_iri.as_str().to_string();

        for (label, set, target) in [
            ("following", doc.following, &mut record.following),
            ("followers", doc.followers, &mut record.followers),
        ] {
            for id in set.into_keys() {
                let id = parse_iri(&id)
                    .map_err(|e| FloorbError::corrupt(key, format!("{} entry: {}", label, e)))?
                    .to_string();
                if id == own {
                    return Err(FloorbError::corrupt(
                        key,
                        format!("{} contains the actor's own IRI", label),
                    ));
                }
                target.insert(id);
            }
        }

        Ok(record)
    }

    pub fn to_persisted(&self) -> PersistedActor {
        let as_map = |set: &BTreeSet<String>| {
            set.iter()
                .map(|id| (id.clone(), Present {}))
                .collect::<BTreeMap<_, _>>()
        };

        PersistedActor {
            name: self.name.clone(),
            summary: self.summary.clone(),
            actor_type: self.actor_type.clone(),
            iri: self.iri.clone(),
            followers: as_map(&self.followers),
            following: as_map(&self.following),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn actor_type(&self) -> &str {
        &self.actor_type
    }

    pub fn iri(&self) -> &str {
        &self.iri
    }

    pub fn parsed_iri(&self) -> &Url {
        &self.parsed_iri
    }

    pub fn following(&self) -> &BTreeSet<String> {
        &self.following
    }

    pub fn followers(&self) -> &BTreeSet<String> {
        &self.followers
    }

    pub fn is_following(&self, key: &str) -> bool {
        self.following.contains(key)
    }

    pub fn is_self(&self, key: &str) -> bool {
        key == self.parsed_iri.as_str()
    }

    pub(crate) fn insert_following(&mut self, key: String) -> bool {
        self.following.insert(key)
    }

    pub(crate) fn remove_following(&mut self, key: &str) -> bool {
        self.following.remove(key)
    }

    pub(crate) fn insert_follower(&mut self, key: String) -> bool {
        self.followers.insert(key)
    }

    pub(crate) fn remove_follower(&mut self, key: &str) -> bool {
        self.followers.remove(key)
    }
}
