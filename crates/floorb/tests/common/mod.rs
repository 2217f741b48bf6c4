#![allow(dead_code)]

use floorb::{
    Activity, ActorCallbacks, ActorEnvironment, ActorStore, DeliveryConfig, DeliveryPool,
    EngineFuture, FederationEngine, FloorbError, InboundRequest, ProfileConfig, RequestContext,
    ResponseWriter,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

/// What a scripted inbox/outbox handler does when called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerScript {
    Handled,
    Unhandled,
    Fail,
}

/// What `send` does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendScript {
    Succeed,
    Fail,
    /// Never completes on its own
    Hang,
    Delay(Duration),
    Panic,
}

/// Federation engine double that records every call.
pub struct RecordingEngine {
    pub sent: Mutex<Vec<(Url, Activity)>>,
    pub calls: Mutex<Vec<&'static str>>,
    pub send_script: Mutex<SendScript>,
    pub post_script: Mutex<HandlerScript>,
    pub get_script: Mutex<HandlerScript>,
}

impl RecordingEngine {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            send_script: Mutex::new(SendScript::Succeed),
            post_script: Mutex::new(HandlerScript::Unhandled),
            get_script: Mutex::new(HandlerScript::Unhandled),
        })
    }

    pub fn script_send(&self, script: SendScript) {
        *self.send_script.lock().unwrap() = script;
    }

    pub fn script_handlers(&self, post: HandlerScript, get: HandlerScript) {
        *self.post_script.lock().unwrap() = post;
        *self.get_script.lock().unwrap() = get;
    }

    pub fn sent(&self) -> Vec<(Url, Activity)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn handle<'a>(
        &'a self,
        name: &'static str,
        script: HandlerScript,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
    ) -> EngineFuture<'a, bool> {
        self.calls.lock().unwrap().push(name);
        Box::pin(async move {
            match script {
                HandlerScript::Handled => {
                    writer.set_status(if name.starts_with("post") { 201 } else { 200 });
                    writer.write(format!("{} {}", name, actor.actor_name()).as_bytes());
                    Ok(true)
                }
                HandlerScript::Unhandled => Ok(false),
                HandlerScript::Fail => Err(FloorbError::Engine(format!("{} exploded", name))),
            }
        })
    }
}

impl FederationEngine for RecordingEngine {
    fn send<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        destination: &'a Url,
        activity: &'a Activity,
    ) -> EngineFuture<'a, ()> {
        let script = *self.send_script.lock().unwrap();
        Box::pin(async move {
            match script {
                SendScript::Succeed => {}
                SendScript::Fail => {
                    return Err(FloorbError::Delivery(format!("{} unreachable", destination)))
                }
                SendScript::Hang => std::future::pending::<()>().await,
                SendScript::Delay(delay) => tokio::time::sleep(delay).await,
                SendScript::Panic => panic!("send to {} blew up", destination),
            }
            self.sent
                .lock()
                .unwrap()
                .push((destination.clone(), activity.clone()));
            Ok(())
        })
    }

    fn post_inbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        _request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        let script = *self.post_script.lock().unwrap();
        self.handle("post_inbox", script, actor, writer)
    }

    fn get_inbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        _request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        let script = *self.get_script.lock().unwrap();
        self.handle("get_inbox", script, actor, writer)
    }

    fn post_outbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        _request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        let script = *self.post_script.lock().unwrap();
        self.handle("post_outbox", script, actor, writer)
    }

    fn get_outbox<'a>(
        &'a self,
        _ctx: &'a RequestContext,
        actor: &'a dyn ActorCallbacks,
        writer: &'a mut ResponseWriter,
        _request: &'a InboundRequest,
    ) -> EngineFuture<'a, bool> {
        let script = *self.get_script.lock().unwrap();
        self.handle("get_outbox", script, actor, writer)
    }
}

pub const ORIGIN: &str = "https://floorb.example";
pub const ALICE_IRI: &str = "https://example.org/alice";
pub const BOB_IRI: &str = "https://remote.example/users/bob";

pub fn environment_with(
    engine: Arc<RecordingEngine>,
    dir: &Path,
    delivery: &DeliveryConfig,
) -> ActorEnvironment {
    let engine: Arc<dyn FederationEngine> = engine;
    ActorEnvironment {
        store: Arc::new(ActorStore::new(dir.join("actors"))),
        delivery: Arc::new(DeliveryPool::new(engine.clone(), delivery)),
        engine,
        profile: ProfileConfig::new(ORIGIN),
    }
}

pub fn environment(engine: Arc<RecordingEngine>, dir: &Path) -> ActorEnvironment {
    environment_with(engine, dir, &DeliveryConfig::default())
}

/// Replace the store directory with a plain file so every write fails.
pub fn break_store(store: &ActorStore) {
    std::fs::remove_dir_all(store.root()).unwrap();
    std::fs::write(store.root(), b"not a directory").unwrap();
}
