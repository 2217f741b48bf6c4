//! # Floorb Server
//!
//! Serves the local actors of a floorb store over HTTP: profiles, the
//! follower/following collections, and inbox/outbox endpoints that are handed
//! to the configured federation engine.

pub mod commands;
pub mod engine;
pub mod registry;
pub mod routes;

pub use engine::LocalEngine;
pub use registry::ActorRegistry;
pub use routes::{router, ACTIVITY_JSON};
