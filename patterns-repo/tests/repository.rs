use std::sync::{Arc, Mutex};

use patterns_core::shape::{SerializedShape, ShapeBounds};
use patterns_repo::errors::{RepositoryError, TransportError};
use patterns_repo::protocol::WireMethod;
use patterns_repo::{
    InMemoryPatternStore, Pattern, PatternId, PatternRepository, RepositoryEvent, TreeNodeId,
};

const NAMESPACE: &str = "http://b3mn.org/stencilset/bpmn2.0#";

fn sample(name: &str) -> Pattern {
    Pattern::new(
        name,
        vec![SerializedShape::node("task", ShapeBounds::from_coords(0.0, 0.0, 100.0, 80.0))],
    )
}

#[tokio::test]
async fn add_pattern_returns_server_identity() {
    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());

    let created = repo.add_pattern(&sample("Approval")).await.unwrap();
    assert_eq!(created.id, Some(PatternId::new("1")));
    assert_eq!(created.name, "Approval");
    assert_eq!(created.ser_pattern.len(), 1);
    assert!(repo.owns(&created));
    // 新增的模式只通过事件交出
    assert!(repo.patterns().is_empty());

    match events.try_recv().unwrap() {
        RepositoryEvent::Added(pattern) => assert_eq!(pattern, created),
        other => panic!("unexpected event {other:?}"),
    }

    let requests = repo.transport().requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method(), Some(WireMethod::Create));
    assert_eq!(requests[0].namespace(), Some(NAMESPACE));
    assert_eq!(requests[0].url, "/oryx/pattern");
}

#[tokio::test]
async fn loading_twice_appends_duplicates() {
    let store = InMemoryPatternStore::new();
    let writer = PatternRepository::new(NAMESPACE, "/oryx", store);
    writer.add_pattern(&sample("a")).await.unwrap();
    writer.add_pattern(&sample("b")).await.unwrap();

    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    assert!(repo.load_patterns().await.unwrap().is_empty());

    let first = writer.load_patterns().await.unwrap();
    assert_eq!(first.len(), 2);
    let second = writer.load_patterns().await.unwrap();
    assert_eq!(second.len(), 4);
    assert!(second.iter().all(|pattern| writer.owns(pattern)));

    assert!(matches!(events.try_recv().unwrap(), RepositoryEvent::Loaded(list) if list.is_empty()));
}

#[tokio::test]
async fn added_pattern_is_delivered_once_after_a_later_load() {
    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    let created = repo.add_pattern(&sample("Approval")).await.unwrap();
    assert!(matches!(events.try_recv().unwrap(), RepositoryEvent::Added(_)));

    let loaded = repo.load_patterns().await.unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].id, created.id);
    match events.try_recv().unwrap() {
        RepositoryEvent::Loaded(list) => assert_eq!(list.len(), 1),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn namespaces_are_isolated() {
    let repo = PatternRepository::new("ns-a", "/oryx", InMemoryPatternStore::new());
    repo.add_pattern(&sample("a")).await.unwrap();
    assert_eq!(repo.transport().pattern_count("ns-a"), 1);
    assert_eq!(repo.transport().pattern_count("ns-b"), 0);
}

#[tokio::test]
async fn removing_one_of_two_equally_named_patterns_keeps_the_other() {
    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    let mut first = repo.add_pattern(&sample("Same")).await.unwrap();
    let mut second = repo.add_pattern(&sample("Same")).await.unwrap();
    assert_eq!(repo.load_patterns().await.unwrap().len(), 2);
    // 只有面板上的副本带节点标识，列表中的记录按 id 匹配
    first.tree_node = Some(TreeNodeId(1));
    second.tree_node = Some(TreeNodeId(2));
    while events.try_recv().is_ok() {}

    repo.remove_pattern(&second).await.unwrap();
    match events.try_recv().unwrap() {
        RepositoryEvent::Removed(removed) => {
            assert_eq!(removed.tree_node, Some(TreeNodeId(2)));
            assert_eq!(removed.id, second.id);
        }
        other => panic!("unexpected event {other:?}"),
    }

    let remaining = repo.patterns();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, first.id);
    assert_eq!(repo.transport().stored_names(NAMESPACE), vec!["Same"]);
}

#[tokio::test]
async fn unowned_patterns_cannot_be_renamed_or_removed() {
    let repo = PatternRepository::new(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    let mut loose = sample("loose");
    assert!(!repo.rename_pattern(&mut loose, "other").await.unwrap());
    assert_eq!(loose.name, "loose");
    assert!(repo.transport().requests().is_empty());

    let foreign_repo = PatternRepository::new("elsewhere", "/oryx", InMemoryPatternStore::new());
    let mut foreign = foreign_repo.add_pattern(&sample("foreign")).await.unwrap();
    assert!(matches!(
        repo.rename_pattern(&mut foreign, "x").await,
        Err(RepositoryError::NotOwned { .. })
    ));
    assert!(matches!(
        repo.remove_pattern(&foreign).await,
        Err(RepositoryError::NotOwned { .. })
    ));
}

#[tokio::test]
async fn rename_saves_and_updates_the_list() {
    let repo = PatternRepository::new(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    let mut created = repo.add_pattern(&sample("old")).await.unwrap();
    repo.load_patterns().await.unwrap();

    assert!(repo.rename_pattern(&mut created, "new").await.unwrap());
    assert_eq!(created.name, "new");
    assert_eq!(repo.patterns()[0].name, "new");
    assert_eq!(repo.transport().stored_names(NAMESPACE), vec!["new"]);
    assert_eq!(
        repo.transport().requests().last().and_then(|r| r.method()),
        Some(WireMethod::Update)
    );
}

#[tokio::test]
async fn failure_without_handler_raises_notification() {
    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    repo.transport().set_offline(true);

    let err = repo.add_pattern(&sample("a")).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Transport(TransportError::Offline)));
    assert!(repo.patterns().is_empty());
    match events.try_recv().unwrap() {
        RepositoryEvent::Notification(note) => assert_eq!(note.title, "Pattern Repository"),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn supplied_failure_handler_replaces_default_path() {
    let (repo, mut events) =
        PatternRepository::with_channel(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    repo.transport().set_offline(true);

    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let result = repo
        .send_request(
            WireMethod::FetchAll,
            Default::default(),
            Some(Box::new(move |err: &TransportError| {
                *sink.lock().unwrap() = Some(err.clone());
            })),
        )
        .await;

    assert!(result.is_err());
    assert_eq!(*seen.lock().unwrap(), Some(TransportError::Offline));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn save_failure_is_reported_and_list_is_untouched() {
    let repo = PatternRepository::new(NAMESPACE, "/oryx", InMemoryPatternStore::new());
    let mut created = repo.add_pattern(&sample("kept")).await.unwrap();
    repo.load_patterns().await.unwrap();
    repo.transport().set_offline(true);

    created.name = "lost".to_string();
    assert!(repo.save_pattern(&created).await.is_err());
    assert_eq!(repo.patterns()[0].name, "kept");
}
