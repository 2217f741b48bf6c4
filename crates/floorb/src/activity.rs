//! # Activity Builder
//!
//! Construction of the outbound ActivityStreams objects this actor emits.
//! Building is pure: nothing here touches the graph, the store or the network.
//! Callers validate IRIs before they get here.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// ActivityStreams JSON-LD context
pub const ACTIVITY_STREAMS_CONTEXT: &str = "https://www.w3.org/ns/activitystreams";

/// The special collection addressing everyone
pub const PUBLIC_AUDIENCE: &str = "https://www.w3.org/ns/activitystreams#Public";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Follow,
    Announce,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivityKind::Follow => write!(f, "Follow"),
            ActivityKind::Announce => write!(f, "Announce"),
        }
    }
}

/// An outbound activity, serialized in ActivityStreams shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    #[serde(rename = "@context")]
    pub context: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub actor: Url,
    pub object: Url,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<Url>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<Url>,
}

impl Activity {
    fn new(kind: ActivityKind, actor: &Url, object: &Url) -> Self {
        Self {
            context: ACTIVITY_STREAMS_CONTEXT.to_string(),
            kind,
            actor: actor.clone(),
            object: object.clone(),
            to: Vec::new(),
            cc: Vec::new(),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        // Url and String fields always serialize
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Follow `target`, addressed directly to it.
pub fn build_follow(from: &Url, target: &Url) -> Activity {
    let mut follow = Activity::new(ActivityKind::Follow, from, target);
    follow.to.push(target.clone());
    follow
}

/// Announce `object` publicly, copying the actor's followers collection.
///
/// The followers are referenced by collection IRI rather than enumerated; the
/// federation engine expands the collection at delivery time.
pub fn build_announce(
    from: &Url,
    object: &Url,
    public_audience: &Url,
    followers_collection: &Url,
) -> Activity {
    let mut announce = Activity::new(ActivityKind::Announce, from, object);
    announce.to.push(public_audience.clone());
    announce.cc.push(followers_collection.clone());
    announce
}
