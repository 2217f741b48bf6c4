//! # Actor Service
//!
//! The actor-facing API. `ActorService` ties one actor's follow graph to the
//! store, the federation engine and the delivery pool, and is what HTTP
//! handlers and engine callbacks talk to.

use std::sync::Arc;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::activity::{build_announce, PUBLIC_AUDIENCE};
use crate::actor::graph::{FollowGraph, FollowOutcome};
use crate::actor::record::ActorRecord;
use crate::actor::store::ActorStore;
use crate::delivery::{DeliveryPool, DeliveryTicket};
use crate::errors::Result;
use crate::federation::{
    ActorCallbacks, EngineFuture, FederationEngine, InboundRequest, RequestContext,
    ResponseWriter, Verb,
};
use crate::iri::parse_iri;
use crate::profile::{ProfileConfig, ProfileDocument};

/// Shared collaborators every actor service is built from.
#[derive(Clone)]
pub struct ActorEnvironment {
    pub store: Arc<ActorStore>,
    pub engine: Arc<dyn FederationEngine>,
    pub delivery: Arc<DeliveryPool>,
    pub profile: ProfileConfig,
}

/// Result of `ActorService::follow`.
#[derive(Debug)]
pub enum FollowResult {
    AlreadyFollowing,
    /// Intent is persisted; delivery runs in the background
    Requested(DeliveryTicket),
}

impl FollowResult {
    pub fn already_following(&self) -> bool {
        matches!(self, FollowResult::AlreadyFollowing)
    }
}

/// Outcome of an inbox or outbox dispatch. `handled_by` is `None` when
/// neither the POST nor the GET handler claimed the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub writer: ResponseWriter,
    pub handled_by: Option<Verb>,
}

#[derive(Debug, Clone, Copy)]
enum Mailbox {
    Inbox,
    Outbox,
}

/// # ActorService
///
/// One local actor. Graph changes for this actor are serialized by its
/// `FollowGraph`; separate services share nothing but the store and pool.
pub struct ActorService {
    name: String,
    iri: Url,
    graph: FollowGraph,
    engine: Arc<dyn FederationEngine>,
    delivery: Arc<DeliveryPool>,
    profile: ProfileConfig,
}

impl ActorService {
    pub fn new(record: ActorRecord, env: &ActorEnvironment) -> Self {
        Self {
            name: record.name().to_string(),
            iri: record.parsed_iri().clone(),
            graph: FollowGraph::new(record, env.store.clone()),
            engine: env.engine.clone(),
            delivery: env.delivery.clone(),
            profile: env.profile.clone(),
        }
    }

    /// Create, persist and wrap a new actor.
    pub async fn create(
        env: &ActorEnvironment,
        name: &str,
        summary: &str,
        actor_type: &str,
        iri: &str,
    ) -> Result<Self> {
        let record = env.store.create(name, summary, actor_type, iri).await?;
        Ok(Self::new(record, env))
    }

    /// Wrap an actor already in the store.
    pub async fn load(env: &ActorEnvironment, name: &str) -> Result<Self> {
        let record = env.store.load(name).await?;
        debug!("Loaded actor '{}'", name);
        Ok(Self::new(record, env))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn iri(&self) -> &Url {
        &self.iri
    }

    pub fn graph(&self) -> &FollowGraph {
        &self.graph
    }

    pub fn profile_config(&self) -> &ProfileConfig {
        &self.profile
    }

    /// Follow the remote actor at `target`.
    ///
    /// Returns once the follow is persisted. Delivery of the Follow activity
    /// to the target happens in the background on the pool.
    #[instrument(skip(self, ctx), fields(actor = %self.name, request = %ctx.id()))]
    pub async fn follow(&self, ctx: &RequestContext, target: &str) -> Result<FollowResult> {
        let target = parse_iri(target)?;

        match self.graph.request_follow(&target).await? {
            FollowOutcome::AlreadyFollowing => Ok(FollowResult::AlreadyFollowing),
            FollowOutcome::Requested(activity) => {
                let ticket = self.delivery.submit(ctx, target, activity);
                Ok(FollowResult::Requested(ticket))
            }
        }
    }

    /// Boost `object` to the public and to the actor's followers.
    ///
    /// Nothing about announces is recorded locally.
    #[instrument(skip(self, ctx), fields(actor = %self.name, request = %ctx.id()))]
    pub async fn announce(
        &self,
        ctx: &RequestContext,
        object: &str,
        public_audience: &str,
        followers_collection: &str,
    ) -> Result<DeliveryTicket> {
        let object = parse_iri(object)?;
        let public_audience = parse_iri(public_audience)?;
        let followers_collection = parse_iri(followers_collection)?;

        let activity = build_announce(&self.iri, &object, &public_audience, &followers_collection);
        info!("'{}' announces {}", self.name, object);
        Ok(self.delivery.submit(ctx, followers_collection, activity))
    }

    /// `announce` addressed to the public audience and this actor's own
    /// followers collection.
    pub async fn announce_to_followers(
        &self,
        ctx: &RequestContext,
        object: &str,
    ) -> Result<DeliveryTicket> {
        let followers = self.profile.followers_collection(&self.name)?;
        self.announce(ctx, object, PUBLIC_AUDIENCE, followers.as_str())
            .await
    }

    /// Public identity document, rendered from in-memory state.
    pub async fn who_am_i(&self) -> ProfileDocument {
        let record = self.graph.snapshot().await;
        ProfileDocument::render(&record, &self.profile)
    }

    pub async fn handle_inbox(
        &self,
        ctx: &RequestContext,
        request: &InboundRequest,
    ) -> Result<Dispatch> {
        self.dispatch(ctx, request, Mailbox::Inbox).await
    }

    pub async fn handle_outbox(
        &self,
        ctx: &RequestContext,
        request: &InboundRequest,
    ) -> Result<Dispatch> {
        self.dispatch(ctx, request, Mailbox::Outbox).await
    }

    /// POST handling first; GET only if POST neither failed nor claimed the
    /// request.
    async fn dispatch(
        &self,
        ctx: &RequestContext,
        request: &InboundRequest,
        mailbox: Mailbox,
    ) -> Result<Dispatch> {
        let mut writer = ResponseWriter::default();

        let posted = match mailbox {
            Mailbox::Inbox => {
                self.engine
                    .post_inbox(ctx, self, &mut writer, request)
                    .await
            }
            Mailbox::Outbox => {
                self.engine
                    .post_outbox(ctx, self, &mut writer, request)
                    .await
            }
        };
        match posted {
            Err(e) => {
                error!("{:?} POST for '{}' failed: {}", mailbox, self.name, e);
                return Err(e);
            }
            Ok(true) => {
                return Ok(Dispatch {
                    writer,
                    handled_by: Some(Verb::Post),
                })
            }
            Ok(false) => {}
        }

        let got = match mailbox {
            Mailbox::Inbox => self.engine.get_inbox(ctx, self, &mut writer, request).await,
            Mailbox::Outbox => {
                self.engine
                    .get_outbox(ctx, self, &mut writer, request)
                    .await
            }
        };
        match got {
            Err(e) => {
                error!("{:?} GET for '{}' failed: {}", mailbox, self.name, e);
                Err(e)
            }
            Ok(handled) => {
                if !handled {
                    debug!("{:?} request for '{}' was not handled", mailbox, self.name);
                }
                Ok(Dispatch {
                    writer,
                    handled_by: handled.then_some(Verb::Get),
                })
            }
        }
    }
}

impl ActorCallbacks for ActorService {
    fn actor_name(&self) -> String {
        self.name.clone()
    }

    fn actor_iri(&self) -> Url {
        self.iri.clone()
    }

    fn followers<'a>(&'a self) -> EngineFuture<'a, Vec<String>> {
        Box::pin(async move { Ok(self.graph.followers().await) })
    }

    fn following<'a>(&'a self) -> EngineFuture<'a, Vec<String>> {
        Box::pin(async move { Ok(self.graph.following().await) })
    }

    fn accept_follower<'a>(&'a self, remote: &'a Url) -> EngineFuture<'a, bool> {
        Box::pin(self.graph.accept_follower(remote))
    }
}
