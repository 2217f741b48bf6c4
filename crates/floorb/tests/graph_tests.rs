mod common;

use common::{break_store, ALICE_IRI, BOB_IRI};
use floorb::{ActivityKind, ActorStore, FloorbError, FollowGraph, FollowOutcome};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::tempdir;
use url::Url;

async fn alice_graph(dir: &std::path::Path) -> (FollowGraph, Arc<ActorStore>) {
    let store = Arc::new(ActorStore::new(dir.join("actors")));
    let record = store.create("alice", "", "Person", ALICE_IRI).await.unwrap();
    (FollowGraph::new(record, store.clone()), store)
}

fn bob() -> Url {
    Url::parse(BOB_IRI).unwrap()
}

#[tokio::test]
async fn test_first_follow_persists_and_builds_activity() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;

    let outcome = graph.request_follow(&bob()).await.unwrap();

    let FollowOutcome::Requested(activity) = outcome else {
        panic!("expected a follow activity");
    };
    assert_eq!(activity.kind, ActivityKind::Follow);
    assert_eq!(activity.actor.as_str(), ALICE_IRI);
    assert_eq!(activity.object, bob());
    assert_eq!(activity.to, vec![bob()]);

    let persisted = store.load("alice").await.unwrap();
    assert!(persisted.is_following(BOB_IRI));
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_repeated_follow_is_a_no_op() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;

    graph.request_follow(&bob()).await.unwrap();
    let writes_after_first = store.write_count();
    let second = graph.request_follow(&bob()).await.unwrap();

    assert!(second.already_following());
    assert_eq!(store.write_count(), writes_after_first);
    assert_eq!(graph.following().await, vec![BOB_IRI.to_string()]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_follows_add_target_once() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;
    let graph = Arc::new(graph);

    let mut tasks = Vec::new();
    for _ in 0..16 {
        let graph = graph.clone();
        tasks.push(tokio::spawn(async move {
            graph.request_follow(&bob()).await.unwrap()
        }));
    }

    let mut requested = 0;
    for task in tasks {
        if !task.await.unwrap().already_following() {
            requested += 1;
        }
    }

    assert_eq!(requested, 1);
    // one write for create, one for the follow
    assert_eq!(store.write_count(), 2);
    assert_eq!(
        store.load("alice").await.unwrap().following().len(),
        1
    );
}

#[tokio::test]
async fn test_failed_save_rolls_back_follow() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;
    break_store(&store);

    let result = graph.request_follow(&bob()).await;

    assert!(matches!(result, Err(FloorbError::Persistence { .. })));
    assert!(graph.following().await.is_empty());
    assert!(!graph.snapshot().await.is_following(BOB_IRI));
}

#[tokio::test]
async fn test_follow_after_rollback_is_not_treated_as_duplicate() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;
    break_store(&store);
    assert!(graph.request_follow(&bob()).await.is_err());

    std::fs::remove_file(store.root()).unwrap();
    let retry = graph.request_follow(&bob()).await.unwrap();

    assert!(!retry.already_following());
    assert!(store.load("alice").await.unwrap().is_following(BOB_IRI));
}

#[tokio::test]
async fn test_cannot_follow_self() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;

    let result = graph.request_follow(&Url::parse(ALICE_IRI).unwrap()).await;

    assert!(matches!(result, Err(FloorbError::SelfReference(_))));
    assert_eq!(store.write_count(), 1);
}

#[tokio::test]
async fn test_accept_follower_is_idempotent_and_persisted() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;

    assert!(graph.accept_follower(&bob()).await.unwrap());
    assert!(!graph.accept_follower(&bob()).await.unwrap());

    let persisted = store.load("alice").await.unwrap();
    assert_eq!(
        persisted.followers().iter().cloned().collect::<Vec<_>>(),
        vec![BOB_IRI.to_string()]
    );
    assert!(persisted.following().is_empty());
    assert_eq!(store.write_count(), 2);
}

#[tokio::test]
async fn test_failed_follower_save_rolls_back() {
    let temp_dir = tempdir().unwrap();
    let (graph, store) = alice_graph(temp_dir.path()).await;
    break_store(&store);

    assert!(graph.accept_follower(&bob()).await.is_err());
    assert!(graph.followers().await.is_empty());
}
