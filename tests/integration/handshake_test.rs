//! Ready/pending handshake across the whole engine.

use apinav_core::types::id::{CollectionId, RequestId};
use apinav_entity::{FolderPath, RequestRecord};
use apinav_realtime::{OutboundMessage, SurfaceKind};
use apinav_service::Mutation;
use apinav_storage::SnapshotVersion;

use crate::helpers::{TestHost, commands};

fn add_collection(name: &str) -> Mutation {
    Mutation::AddCollection {
        name: name.to_string(),
    }
}

fn version_of(msg: &OutboundMessage) -> SnapshotVersion {
    match msg {
        OutboundMessage::Snapshot { version, .. } => *version,
        other => panic!("expected snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn test_broadcast_before_ready_arrives_once() {
    let host = TestHost::new().await;
    let mut late = host.open("late", SurfaceKind::Sidebar).await;

    host.engine.apply(add_collection("First")).await.unwrap();
    host.engine.apply(add_collection("Second")).await.unwrap();
    assert!(late.pump().is_empty());

    let flushed = late.ready().await;
    assert_eq!(commands(&flushed), vec!["snapshot"]);
    // Latest wins: the seed was v1, then two saves.
    assert_eq!(version_of(&flushed[0]), SnapshotVersion::new(3));
    assert_eq!(late.model.confirmed().len(), 3);

    // Nothing is delivered twice.
    assert!(late.pump().is_empty());
    let again = late.ready().await;
    assert_eq!(commands(&again), vec!["snapshot"]);
    assert_eq!(version_of(&again[0]), SnapshotVersion::new(3));
}

#[tokio::test]
async fn test_fresh_surface_gets_current_state_on_ready() {
    let host = TestHost::new().await;
    let mut surface = host.open("side", SurfaceKind::Sidebar).await;
    let flushed = surface.ready().await;
    assert_eq!(commands(&flushed), vec!["snapshot"]);
    assert_eq!(surface.model.confirmed(), &host.stored().await);
}

#[tokio::test]
async fn test_edit_intent_flushed_after_snapshot() {
    let host = TestHost::new().await;
    let c1 = CollectionId::new("c1");
    let outcome = host
        .engine
        .apply(Mutation::AddRequest {
            collection_id: c1.clone(),
            path: FolderPath::root(),
            draft: Default::default(),
        })
        .await
        .unwrap();
    let request_id = RequestId::new(outcome.created.unwrap());

    // No editor yet: the intent is parked.
    let report = host.engine.open_editor(&c1, &request_id).await.unwrap();
    assert_eq!(report.buffered, 1);

    let mut editor = host.open("edit", SurfaceKind::Editor).await;
    assert!(editor.pump().is_empty());

    let flushed = editor.ready().await;
    assert_eq!(commands(&flushed), vec!["snapshot", "editRequest"]);
    let OutboundMessage::EditRequest { request, folder_path, .. } = &flushed[1] else {
        panic!("expected editRequest");
    };
    assert_eq!(request.id, request_id);
    assert!(folder_path.is_root());
    let target = editor.model.edit_target().unwrap();
    assert_eq!(target.request_id.as_ref(), Some(&request_id));
    assert_eq!(target.breadcrumb, "Demo");
}

#[tokio::test]
async fn test_latest_edit_intent_wins() {
    let host = TestHost::new().await;
    let c1 = CollectionId::new("c1");
    let mut editor = host.open("edit", SurfaceKind::Editor).await;

    host.engine
        .open_add_request(&c1, FolderPath::root())
        .await
        .unwrap();
    let outcome = host
        .engine
        .apply(Mutation::AddRequest {
            collection_id: c1.clone(),
            path: FolderPath::root(),
            draft: Default::default(),
        })
        .await
        .unwrap();
    let request_id = RequestId::new(outcome.created.unwrap());
    host.engine.open_editor(&c1, &request_id).await.unwrap();

    let flushed = editor.ready().await;
    assert_eq!(commands(&flushed), vec!["snapshot", "editRequest"]);
}

#[tokio::test]
async fn test_direct_replies_are_not_held() {
    let host = TestHost::new().await;
    let mut surface = host.open("side", SurfaceKind::Sidebar).await;
    let received = surface.issue(add_collection("Eager")).await;
    // The originator's result arrives immediately; the broadcast waits.
    assert_eq!(commands(&received), vec!["mutationResult"]);
    assert_eq!(surface.model.pending_count(), 0);

    let flushed = surface.ready().await;
    assert_eq!(commands(&flushed), vec!["snapshot"]);
    assert_eq!(surface.model.confirmed().collections()[0].name, "Eager");
}

#[tokio::test]
async fn test_open_request_from_sidebar_reaches_editor() {
    let host = TestHost::new().await;
    let c1 = CollectionId::new("c1");
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    let mut record = RequestRecord::new(RequestId::new("r-seeded"), "GET", "https://x/seed");
    record.name = "Seeded".to_string();
    let mut demo = host.stored().await.into_inner().remove(0);
    demo.requests.push(record);
    host.seed(vec![demo]).await;

    sidebar
        .send(&apinav_realtime::InboundMessage::OpenRequest {
            collection_id: c1,
            request_id: RequestId::new("r-seeded"),
        })
        .await;
    assert!(sidebar.pump().is_empty());
    let received = editor.pump();
    assert_eq!(commands(&received), vec!["editRequest"]);
}
