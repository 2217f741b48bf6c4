use tracing::{debug, info};
use url::Url;

use floorb::{
    Activity, ActorCallbacks, EngineFuture, FederationEngine, InboundRequest, RequestContext,
    ResponseWriter,
};

/// Stand-in engine for running without a federation backend: deliveries are
/// logged and acknowledged, inbox/outbox requests are never claimed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalEngine;

impl LocalEngine {
    fn decline<'a>(
        &'a self,
        mailbox: &'static str,
        actor: &'a dyn ActorCallbacks,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        Box::pin(async move {
            debug!(
                "LocalEngine declining {} {} for '{}'",
                request.method,
                mailbox,
                actor.actor_name()
            );
            Ok(false)
        })
    }
}

impl FederationEngine for LocalEngine {
    fn send<'a>(
        &'a self,
        ctx: &'a RequestContext,
        destination: &'a Url,
        activity: &'a Activity,
    ) -> EngineFuture<'a, ()> {
        Box::pin(async move {
            info!(
                request = %ctx.id(),
                "LocalEngine would deliver {} from {} to {}",
                activity.kind,
                activity.actor,
                destination
            );
            Ok(())
        })
    }

    fn post_inbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        _writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        self.decline("inbox", actor, request)
    }

    fn get_inbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        _writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        self.decline("inbox", actor, request)
    }

    fn post_outbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        _writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        self.decline("outbox", actor, request)
    }

    fn get_outbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        _writer: &'a mut ResponseWriter,
        request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        self.decline("outbox", actor, request)
    }
}
