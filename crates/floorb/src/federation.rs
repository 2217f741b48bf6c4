//! # Federation Contract
//!
//! The seam between the local actor core and the federation protocol engine.
//! The engine does wire-level delivery, signature checks and inbox/outbox side
//! effects; the core only calls the capabilities declared here.
//!
//! The engine never holds a pointer back to the actor. Every inbox/outbox call
//! receives the acting actor as an explicit `&dyn ActorCallbacks`, which is the
//! full set of things the engine may ask of it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::activity::Activity;
use crate::errors::Result;

/// Boxed future returned by engine and callback methods.
pub type EngineFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Why a request context stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDone {
    Cancelled,
    DeadlineExceeded,
}

impl fmt::Display for ContextDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextDone::Cancelled => write!(f, "context cancelled"),
            ContextDone::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

/// # RequestContext
///
/// Request-scoped execution context. Cancelling it (or passing its deadline)
/// aborts in-flight deliveries started on its behalf. Already committed
/// persistence is not affected.
#[derive(Debug, Clone)]
pub struct RequestContext {
    id: Uuid,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        let mut ctx = Self::new();
        ctx.deadline = Some(Instant::now() + timeout);
        ctx
    }

    /// A context cancelled together with this one, optionally with a tighter deadline.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let deadline = match (self.deadline, timeout) {
            (Some(parent), Some(t)) => Some(parent.min(Instant::now() + t)),
            (None, Some(t)) => Some(Instant::now() + t),
            (parent, None) => parent,
        };
        Self {
            id: self.id,
            cancel: self.cancel.child_token(),
            deadline,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// A guard that cancels this context when dropped.
    pub fn drop_guard(&self) -> tokio_util::sync::DropGuard {
        self.cancel.clone().drop_guard()
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextDone {
        match self.deadline {
            Some(deadline) => tokio::select! {
                _ = self.cancel.cancelled() => ContextDone::Cancelled,
                _ = tokio::time::sleep_until(deadline) => ContextDone::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                ContextDone::Cancelled
            }
        }
    }
}

/// Which half of an inbox/outbox dispatch produced the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verb {
    Post,
    Get,
}

/// An HTTP request as handed to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The response the engine writes into. Starts out as an empty 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseWriter {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Default for ResponseWriter {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseWriter {
    pub fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
    }

    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }
}

/// Narrow capability set the engine may use on the actor it is serving.
pub trait ActorCallbacks: Send + Sync {
    fn actor_name(&self) -> String;

    fn actor_iri(&self) -> Url;

    fn followers<'a>(&'a self) -> EngineFuture<'a, Vec<String>>;

    fn following<'a>(&'a self) -> EngineFuture<'a, Vec<String>>;

    /// Record `remote` as a follower after the engine accepted its Follow.
    /// Resolves to `true` when the set changed.
    fn accept_follower<'a>(&'a self, remote: &'a Url) -> EngineFuture<'a, bool>;
}

/// # FederationEngine
///
/// The external protocol engine. Implementations must be safe to call from
/// background delivery tasks.
pub trait FederationEngine: Send + Sync + 'static {
    /// Deliver `activity` to `destination`.
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        destination: &'a Url,
        activity: &'a Activity,
    ) -> EngineFuture<'a, ()>;

    fn post_inbox<'a>(
        &'a self,
        ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool>;

    fn get_inbox<'a>(
        &'a self,
        ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool>;

    fn post_outbox<'a>(
        &'a self,
        ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool>;

    fn get_outbox<'a>(
        &'a self,
        ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool>;
}
