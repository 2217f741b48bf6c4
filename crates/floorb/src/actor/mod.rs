//! # Actor
//!
//! A local actor: its persisted record, the store it lives in, the follow
//! graph guarding its mutations, and the service exposing it.

pub mod graph;
pub mod record;
pub mod service;
pub mod store;

pub use graph::{FollowGraph, FollowOutcome};
pub use record::{validate_name, ActorRecord, PersistedActor, Present};
pub use service::{ActorEnvironment, ActorService, Dispatch, FollowResult};
pub use store::ActorStore;
