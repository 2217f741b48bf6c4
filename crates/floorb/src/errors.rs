//! # Errors
//!
//! The error taxonomy shared by every component of the actor core. Validation
//! errors are raised before any mutation happens; persistence errors abort the
//! operation that triggered them after in-memory state has been rolled back.

use thiserror::Error;

/// # FloorbError
///
/// Represents everything that can go wrong while creating, loading, mutating
/// or dispatching on behalf of a local actor.
#[derive(Error, Debug)]
pub enum FloorbError {
    /// Input could not be parsed as an absolute URI
    #[error("Invalid IRI '{iri}': {reason}")]
    InvalidIri { iri: String, reason: String },

    /// Actor name is empty or cannot be used as a storage key
    #[error("Invalid actor name: {0:?}")]
    InvalidName(String),

    /// Actor type tag was empty
    #[error("Actor type must not be empty")]
    InvalidActorType,

    /// The actor's own IRI was offered as a follower or follow target
    #[error("Actor cannot reference itself in its social graph: {0}")]
    SelfReference(String),

    /// No record is stored under the requested name
    #[error("Actor not found: {0}")]
    NotFound(String),

    /// The stored document exists but does not describe a valid actor
    #[error("Corrupt record for actor '{name}': {reason}")]
    CorruptRecord { name: String, reason: String },

    /// I/O failure while reading or writing the backing storage
    #[error("Persistence error for actor '{name}': {source}")]
    Persistence {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Delivery reported failure, was cancelled, or timed out
    #[error("Delivery failed: {0}")]
    Delivery(String),

    /// The federation engine rejected an inbox or outbox request
    #[error("Federation engine error: {0}")]
    Engine(String),
}

impl FloorbError {
    pub fn invalid_iri(iri: &str, reason: impl ToString) -> Self {
        FloorbError::InvalidIri {
            iri: iri.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn persistence(name: &str, source: std::io::Error) -> Self {
        FloorbError::Persistence {
            name: name.to_string(),
            source,
        }
    }

    pub fn corrupt(name: &str, reason: impl ToString) -> Self {
        FloorbError::CorruptRecord {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FloorbError>;
