//! # Floorb
//!
//! The local side of a federated social actor. Floorb keeps the durable
//! profile and follower/following graph of each local actor, builds the
//! outbound Follow and Announce activities, and routes inbox/outbox requests
//! to a pluggable federation engine that does the actual protocol work.
//!
//! ## Architecture
//!
//! * `ActorStore`: one JSON document per actor, replaced atomically on save
//! * `FollowGraph`: serialized, idempotent changes to an actor's sets, persisted before they count
//! * `activity`: pure construction of Follow and Announce activities
//! * `DeliveryPool`: supervised background delivery through the engine
//! * `ActorService`: the API handlers and engine callbacks use
//!
//! The federation engine is supplied by the embedding application through the
//! `FederationEngine` trait. It sees the actor only through `ActorCallbacks`.

pub mod activity;
pub mod actor;
pub mod config;
pub mod delivery;
pub mod errors;
pub mod federation;
pub mod iri;
pub mod logging;
pub mod profile;
pub mod shutdown;
pub mod utils;

pub use activity::{build_announce, build_follow, Activity, ActivityKind, PUBLIC_AUDIENCE};
pub use actor::{
    ActorEnvironment, ActorRecord, ActorService, ActorStore, Dispatch, FollowGraph, FollowOutcome,
    FollowResult,
};
pub use config::{DeliveryConfig, FloorbConfig, LoggingConfig};
pub use delivery::{DeliveryOutcome, DeliveryPool, DeliveryReport, DeliveryTicket, QUEUE_FULL};
pub use errors::{FloorbError, Result};
pub use federation::{
    ActorCallbacks, ContextDone, EngineFuture, FederationEngine, InboundRequest, RequestContext,
    ResponseWriter, Verb,
};
pub use iri::parse_iri;
pub use profile::{OrderedCollection, ProfileConfig, ProfileDocument};
pub use shutdown::{ShutdownController, ShutdownReceiver, ShutdownSignal, ShutdownType};
