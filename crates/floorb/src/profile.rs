//! # Profile
//!
//! The public identity document of a local actor and the endpoint IRIs derived
//! from its name. Rendering is deterministic and reads nothing but the record
//! and the configured origin.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::activity::ACTIVITY_STREAMS_CONTEXT;
use crate::actor::record::ActorRecord;
use crate::errors::Result;
use crate::iri::parse_iri;

/// Where the actor endpoints are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileConfig {
    base_origin: String,
}

impl ProfileConfig {
    pub fn new(base_origin: &str) -> Self {
        Self {
            base_origin: base_origin.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_origin(&self) -> &str {
        &self.base_origin
    }

    pub fn actor_endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.base_origin, name)
    }

    pub fn collection_endpoint(&self, name: &str, collection: &str) -> String {
        format!("{}/{}/{}/", self.base_origin, name, collection)
    }

    /// IRI the federation engine resolves to the actor's current followers.
    pub fn followers_collection(&self, name: &str) -> Result<Url> {
        parse_iri(&self.collection_endpoint(name, "followers"))
    }
}

/// # ProfileDocument
///
/// What `who_am_i` returns and `GET /{name}/` serves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDocument {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type")]
    pub actor_type: String,
    pub id: String,
    pub name: String,
    pub preferred_username: String,
    pub summary: String,
    pub inbox: String,
    pub outbox: String,
    pub followers: String,
    pub following: String,
    pub liked: String,
}

impl ProfileDocument {
    pub fn render(record: &ActorRecord, config: &ProfileConfig) -> Self {
        let name = record.name();
        Self {
            context: ACTIVITY_STREAMS_CONTEXT.to_string(),
            actor_type: record.actor_type().to_string(),
            id: config.actor_endpoint(name),
            name: name.to_string(),
            preferred_username: name.to_string(),
            summary: record.summary().to_string(),
            inbox: config.collection_endpoint(name, "inbox"),
            outbox: config.collection_endpoint(name, "outbox"),
            followers: config.collection_endpoint(name, "followers"),
            following: config.collection_endpoint(name, "following"),
            liked: config.collection_endpoint(name, "liked"),
        }
    }
}

/// An `OrderedCollection` listing graph members, used for the followers and
/// following endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedCollection {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    pub total_items: usize,
    pub ordered_items: Vec<String>,
}

impl OrderedCollection {
    pub fn new(id: String, items: Vec<String>) -> Self {
        Self {
            context: ACTIVITY_STREAMS_CONTEXT.to_string(),
            kind: "OrderedCollection".to_string(),
            id,
            total_items: items.len(),
            ordered_items: items,
        }
    }
}
