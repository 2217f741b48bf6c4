//! # Routes
//!
//! HTTP endpoints for every actor in the registry:
//!
//! * `GET /{name}/` - profile document
//! * `GET|POST /{name}/inbox/`, `GET|POST /{name}/outbox/` - handed to the federation engine
//! * `GET /{name}/followers/`, `GET /{name}/following/` - graph collections
//!
//! Each path is also served without the trailing slash.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

use floorb::{Dispatch, FloorbError, InboundRequest, OrderedCollection, RequestContext};

use crate::registry::ActorRegistry;

pub const ACTIVITY_JSON: &str = "application/activity+json";

#[derive(Debug, Clone, Copy)]
enum Mailbox {
    Inbox,
    Outbox,
}

#[derive(Debug, Clone, Copy)]
enum Collection {
    Followers,
    Following,
}

pub fn router(registry: Arc<ActorRegistry>) -> Router {
    Router::new()
        .route("/{name}", get(who_am_i))
        .route("/{name}/", get(who_am_i))
        .route("/{name}/inbox", get(inbox).post(inbox))
        .route("/{name}/inbox/", get(inbox).post(inbox))
        .route("/{name}/outbox", get(outbox).post(outbox))
        .route("/{name}/outbox/", get(outbox).post(outbox))
        .route("/{name}/followers", get(followers))
        .route("/{name}/followers/", get(followers))
        .route("/{name}/following", get(following))
        .route("/{name}/following/", get(following))
        .with_state(registry)
}

async fn who_am_i(
    State(registry): State<Arc<ActorRegistry>>,
    Path(name): Path<String>,
) -> Response {
    match registry.require(&name).await {
        Ok(service) => activity_json(&service.who_am_i().await),
        Err(e) => error_response(&e),
    }
}

async fn inbox(
    State(registry): State<Arc<ActorRegistry>>,
    Path(name): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch(&registry, &name, Mailbox::Inbox, method, uri, headers, body).await
}

async fn outbox(
    State(registry): State<Arc<ActorRegistry>>,
    Path(name): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    dispatch(&registry, &name, Mailbox::Outbox, method, uri, headers, body).await
}

async fn followers(
    State(registry): State<Arc<ActorRegistry>>,
    Path(name): Path<String>,
) -> Response {
    collection(&registry, &name, Collection::Followers).await
}

async fn following(
    State(registry): State<Arc<ActorRegistry>>,
    Path(name): Path<String>,
) -> Response {
    collection(&registry, &name, Collection::Following).await
}

async fn dispatch(
    registry: &ActorRegistry,
    name: &str,
    mailbox: Mailbox,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let service = match registry.require(name).await {
        Ok(service) => service,
        Err(e) => return error_response(&e),
    };

    let request = InboundRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        headers: headers
            .iter()
            .filter_map(|(key, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (key.as_str().to_string(), value.to_string()))
            })
            .collect(),
        body: body.to_vec(),
    };

    // cancelled if the client goes away before we finish
    let ctx = RequestContext::new();
    let guard = ctx.drop_guard();
    let result = match mailbox {
        Mailbox::Inbox => service.handle_inbox(&ctx, &request).await,
        Mailbox::Outbox => service.handle_outbox(&ctx, &request).await,
    };
    guard.disarm();

    match result {
        Ok(Dispatch {
            writer,
            handled_by: Some(verb),
        }) => {
            debug!("{:?} {} for '{}' handled by {:?}", mailbox, method, name, verb);
            let status =
                StatusCode::from_u16(writer.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let mut builder = Response::builder().status(status);
            for (key, value) in &writer.headers {
                builder = builder.header(key.as_str(), value.as_str());
            }
            builder.body(Body::from(writer.body)).unwrap_or_else(|e| {
                error!("Engine produced an invalid response: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            })
        }
        Ok(Dispatch {
            handled_by: None, ..
        }) => (
            StatusCode::METHOD_NOT_ALLOWED,
            format!("{} {} not handled", method, uri.path()),
        )
            .into_response(),
        Err(e) => error_response(&e),
    }
}

async fn collection(registry: &ActorRegistry, name: &str, which: Collection) -> Response {
    let service = match registry.require(name).await {
        Ok(service) => service,
        Err(e) => return error_response(&e),
    };

    let (label, items) = match which {
        Collection::Followers => ("followers", service.graph().followers().await),
        Collection::Following => ("following", service.graph().following().await),
    };
    let id = service.profile_config().collection_endpoint(name, label);
    activity_json(&OrderedCollection::new(id, items))
}

fn activity_json<T: Serialize>(document: &T) -> Response {
    match serde_json::to_vec(document) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, ACTIVITY_JSON)],
            body,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to serialize document: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn error_response(e: &FloorbError) -> Response {
    let status = match e {
        FloorbError::NotFound(_) => StatusCode::NOT_FOUND,
        FloorbError::InvalidIri { .. }
        | FloorbError::InvalidName(_)
        | FloorbError::InvalidActorType
        | FloorbError::SelfReference(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        error!("Request failed: {}", e);
    }
    (status, e.to_string()).into_response()
}
