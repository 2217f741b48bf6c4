//! One-shot actor operations behind the `follow` and `announce` subcommands.
//! Each waits for its delivery to finish so the outcome can be reported.

use tracing::info;

use floorb::{DeliveryReport, FollowResult, RequestContext, Result};

use crate::registry::ActorRegistry;

/// Have actor `name` follow `target`. `None` means it already did and nothing
/// was sent.
pub async fn follow(
    registry: &ActorRegistry,
    name: &str,
    target: &str,
) -> Result<Option<DeliveryReport>> {
    let service = registry.load(name).await?;
    match service.follow(&RequestContext::new(), target).await? {
        FollowResult::AlreadyFollowing => {
            info!("'{}' already follows {}", name, target);
            Ok(None)
        }
        FollowResult::Requested(ticket) => ticket.wait().await.map(Some),
    }
}

/// Announce `object` from actor `name` to the public and its followers.
pub async fn announce(
    registry: &ActorRegistry,
    name: &str,
    object: &str,
) -> Result<DeliveryReport> {
    let service = registry.load(name).await?;
    let ticket = service
        .announce_to_followers(&RequestContext::new(), object)
        .await?;
    ticket.wait().await
}
