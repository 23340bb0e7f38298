//! Interleaved mutations from two surfaces, and durability.

use std::sync::Arc;

use apinav_core::config::SyncConfig;
use apinav_core::types::id::CollectionId;
use apinav_entity::{Collection, FolderPath};
use apinav_realtime::SurfaceKind;
use apinav_service::Mutation;
use apinav_storage::SnapshotVersion;
use apinav_storage::providers::LocalStateBackend;

use crate::helpers::{STATE_KEY, SlowReads, TestHost};

fn add_folder(name: &str) -> Mutation {
    Mutation::AddFolder {
        collection_id: CollectionId::new("c1"),
        path: FolderPath::root(),
        name: name.to_string(),
    }
}

async fn racing_host(optimistic: bool) -> TestHost {
    let sync = SyncConfig {
        optimistic_concurrency: optimistic,
        ..Default::default()
    };
    let host = TestHost::with_backend(Arc::new(SlowReads::default()), sync);
    host.seed(vec![Collection::new(CollectionId::new("c1"), "Demo")])
        .await;
    host
}

#[tokio::test(start_paused = true)]
async fn test_interleaved_surfaces_keep_both_changes() {
    let host = racing_host(true).await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    let from_sidebar = sidebar.model_issue(add_folder("Auth"));
    let from_editor = editor.model_issue(add_folder("Users"));
    tokio::join!(sidebar.send(&from_sidebar), editor.send(&from_editor));
    sidebar.pump();
    editor.pump();

    let stored = host.stored().await;
    let mut names: Vec<_> = stored.collections()[0]
        .folders
        .iter()
        .map(|f| f.name.as_str())
        .collect();
    names.sort_unstable();
    assert_eq!(names, vec!["Auth", "Users"]);
    assert_eq!(host.store.current_version().await, SnapshotVersion::new(3));
    assert_eq!(host.engine.metrics().snapshot().conflicts_retried, 1);

    // Both surfaces end on the last broadcast.
    assert_eq!(sidebar.model.confirmed(), &stored);
    assert_eq!(editor.model.confirmed(), &stored);
}

#[tokio::test(start_paused = true)]
async fn test_last_writer_wins_without_version_check() {
    let host = racing_host(false).await;
    let sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let editor = host.open_ready("edit", SurfaceKind::Editor).await;

    let (a, b) = tokio::join!(
        host.engine.apply(add_folder("Auth")),
        host.engine.apply(add_folder("Users"))
    );
    assert!(a.unwrap().changed);
    assert!(b.unwrap().changed);
    drop((sidebar, editor));

    // One of the two folders was silently lost.
    assert_eq!(host.stored().await.collections()[0].folders.len(), 1);
}

#[tokio::test]
async fn test_snapshot_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().to_str().unwrap();

    let host = TestHost::with_backend(
        Arc::new(LocalStateBackend::new(root).await.unwrap()),
        SyncConfig::default(),
    );
    host.engine
        .apply(Mutation::AddCollection {
            name: "Persisted".to_string(),
        })
        .await
        .unwrap();
    let before = host.stored().await;
    drop(host);

    let restarted = TestHost::with_backend(
        Arc::new(LocalStateBackend::new(root).await.unwrap()),
        SyncConfig::default(),
    );
    assert_eq!(restarted.stored().await, before);

    let raw = std::fs::read_to_string(dir.path().join(format!("{STATE_KEY}.json"))).unwrap();
    assert!(raw.trim_start().starts_with('['));
}
