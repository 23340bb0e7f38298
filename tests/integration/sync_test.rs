//! End-to-end mutation and broadcast flows.

use apinav_core::error::ErrorKind;
use apinav_core::types::id::{CollectionId, FolderId, RequestId};
use apinav_entity::{Encoded, FolderPath, RequestPatch, TreeContainer};
use apinav_realtime::{OutboundMessage, SurfaceController, SurfaceKind};
use apinav_service::{Mutation, PathResolver};

use crate::helpers::{TestHost, commands};

fn c1() -> CollectionId {
    CollectionId::new("c1")
}

fn draft(method: &str, url: &str, name: &str) -> RequestPatch {
    RequestPatch {
        method: Some(method.to_string()),
        url: Some(url.to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_folder_request_delete_scenario() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;

    sidebar
        .issue(Mutation::AddFolder {
            collection_id: c1(),
            path: FolderPath::root(),
            name: "Auth".to_string(),
        })
        .await;
    let snapshot = host.stored().await;
    let demo = snapshot.collection(&c1()).unwrap();
    assert_eq!(demo.folders.len(), 1);
    let f1 = demo.folders[0].id.clone();
    assert_eq!(demo.folders[0].name, "Auth");
    assert!(demo.folders[0].folders.is_empty());
    assert!(demo.folders[0].requests.is_empty());

    let path = FolderPath::new(vec![f1.clone()]);
    sidebar
        .issue(Mutation::AddRequest {
            collection_id: c1(),
            path: path.clone(),
            draft: draft("GET", "https://x/y", "Login"),
        })
        .await;
    let snapshot = host.stored().await;
    assert_eq!(PathResolver::build_path_label(&snapshot, &c1(), &path), "Demo / Auth");
    let demo = snapshot.collection(&c1()).unwrap();
    let request_id = demo.folders[0].requests[0].id.clone();
    assert_eq!(PathResolver::resolve_folder(demo, &path).unwrap().id, f1);

    sidebar
        .issue(Mutation::DeleteFolder {
            collection_id: c1(),
            folder_id: f1,
            path: None,
        })
        .await;
    let snapshot = host.stored().await;
    let demo = snapshot.collection(&c1()).unwrap();
    assert_eq!(
        PathResolver::resolve_folder(demo, &path).unwrap_err().kind,
        ErrorKind::NotFound
    );
    assert_eq!(PathResolver::find_path_for_request(demo, &request_id), None);

    // The surface converged on the stored state.
    assert_eq!(sidebar.model.confirmed(), &snapshot);
    assert_eq!(sidebar.model.pending_count(), 0);
}

#[tokio::test]
async fn test_every_ready_surface_converges() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    let received = sidebar
        .issue(Mutation::AddRequest {
            collection_id: c1(),
            path: FolderPath::root(),
            draft: draft("POST", "https://x/login", "Login"),
        })
        .await;
    assert_eq!(commands(&received), vec!["mutationResult", "snapshot"]);

    let received = editor.pump();
    assert_eq!(commands(&received), vec!["snapshot"]);
    assert_eq!(editor.model.confirmed(), sidebar.model.confirmed());
    assert_eq!(editor.model.version(), sidebar.model.version());
}

#[tokio::test]
async fn test_hidden_request_only_hidden_in_sidebar() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    sidebar
        .issue(Mutation::AddRequest {
            collection_id: c1(),
            path: FolderPath::root(),
            draft: draft("GET", "https://x/health", "Health"),
        })
        .await;
    let request_id = host.stored().await.collections()[0].requests[0].id.clone();

    sidebar
        .issue(Mutation::SetRequestHidden {
            collection_id: c1(),
            request_id,
            path: None,
            hidden: true,
        })
        .await;
    editor.pump();

    assert_eq!(sidebar.model.visible_tree().collections()[0].total_requests(), 0);
    assert_eq!(editor.model.visible_tree().collections()[0].total_requests(), 1);
}

#[tokio::test]
async fn test_duplicate_then_delete_request() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;

    for (name, url) in [("B", "https://x/b"), ("A", "https://x/a")] {
        sidebar
            .issue(Mutation::AddRequest {
                collection_id: c1(),
                path: FolderPath::root(),
                draft: draft("GET", url, name),
            })
            .await;
    }
    // New requests go to the front: [A, B].
    let original = host.stored().await.collections()[0].requests[0].clone();
    assert_eq!(original.name, "A");

    sidebar
        .issue(Mutation::DuplicateRequest {
            collection_id: c1(),
            request_id: original.id.clone(),
            path: Some(FolderPath::root()),
        })
        .await;
    let requests = host.stored().await.collections()[0].requests.clone();
    assert_eq!(requests.len(), 3);
    let copy = &requests[1];
    assert_ne!(copy.id, original.id);
    assert_eq!(copy.name, "A (Copy)");
    assert_eq!(copy.url, original.url);
    assert_eq!(copy.method, original.method);

    sidebar
        .issue(Mutation::DeleteRequest {
            collection_id: c1(),
            request_id: original.id.clone(),
            path: None,
        })
        .await;
    let snapshot = host.stored().await;
    let demo = snapshot.collection(&c1()).unwrap();
    assert_eq!(demo.requests.len(), 2);
    assert_eq!(PathResolver::find_path_for_request(demo, &original.id), None);
}

#[tokio::test]
async fn test_update_merges_and_clears() {
    let host = TestHost::new().await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    let mut first = draft("GET", "https://x/old", "Users");
    first.headers = Some(Encoded::new(
        [("Accept".to_string(), "application/json".to_string())].into(),
    ));
    first.description = Some("List users".to_string());
    editor
        .issue(Mutation::AddRequest {
            collection_id: c1(),
            path: FolderPath::root(),
            draft: first,
        })
        .await;
    let request_id = host.stored().await.collections()[0].requests[0].id.clone();

    editor
        .issue(Mutation::UpdateRequest {
            collection_id: c1(),
            request_id: request_id.clone(),
            path: None,
            patch: RequestPatch {
                url: Some("https://x/new".to_string()),
                description: Some(String::new()),
                ..Default::default()
            },
        })
        .await;

    let stored = host.stored().await.collections()[0].requests[0].clone();
    assert_eq!(stored.url, "https://x/new");
    assert_eq!(stored.headers.get("Accept").map(String::as_str), Some("application/json"));
    assert_eq!(stored.description, "");
}

#[tokio::test]
async fn test_unknown_target_reports_failure_and_keeps_state() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let before = host.stored().await;

    let received = sidebar
        .issue(Mutation::RenameFolder {
            collection_id: c1(),
            folder_id: FolderId::new("ghost"),
            path: None,
            name: "Nope".to_string(),
        })
        .await;
    assert_eq!(commands(&received), vec!["mutationResult"]);
    assert!(matches!(&received[0], OutboundMessage::MutationResult { ok: false, .. }));
    assert_eq!(host.stored().await, before);
    assert_eq!(sidebar.model.overlay(), sidebar.model.confirmed());
    assert_eq!(
        sidebar.model.last_error().map(|e| e.code.as_str()),
        Some("NOT_FOUND")
    );
}

#[tokio::test]
async fn test_folder_op_with_stale_path_is_rejected() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    sidebar
        .issue(Mutation::SaveRequestAtNames {
            collection_id: c1(),
            folder_names: vec!["Outer".to_string(), "Inner".to_string()],
            draft: draft("GET", "https://x/inner", "Inner"),
        })
        .await;
    let before = host.stored().await;
    let inner = before.collections()[0].folders[0].folders[0].id.clone();

    // The surface still believes Inner sits at the collection root.
    let received = sidebar
        .issue(Mutation::DeleteFolder {
            collection_id: c1(),
            folder_id: inner,
            path: Some(FolderPath::root()),
        })
        .await;
    assert_eq!(commands(&received), vec!["mutationResult"]);
    assert!(matches!(&received[0], OutboundMessage::MutationResult { ok: false, .. }));
    assert_eq!(host.stored().await, before);
    assert_eq!(
        sidebar.model.last_error().map(|e| e.code.as_str()),
        Some("NOT_FOUND")
    );
}

#[tokio::test]
async fn test_editor_breadcrumb_follows_rename() {
    let host = TestHost::new().await;
    let mut sidebar = host.open_ready("side", SurfaceKind::Sidebar).await;
    let mut editor = host.open_ready("edit", SurfaceKind::Editor).await;

    sidebar
        .issue(Mutation::SaveRequestAtNames {
            collection_id: c1(),
            folder_names: vec!["Users".to_string()],
            draft: draft("GET", "https://x/users", "List"),
        })
        .await;
    let snapshot = host.stored().await;
    let folder = &snapshot.collections()[0].folders[0];
    let request_id: RequestId = folder.requests[0].id.clone();
    let folder_id = folder.id.clone();

    host.engine.open_editor(&c1(), &request_id).await.unwrap();
    editor.pump();
    assert_eq!(editor.model.edit_target().unwrap().breadcrumb, "Demo / Users");

    sidebar
        .issue(Mutation::RenameFolder {
            collection_id: c1(),
            folder_id,
            path: None,
            name: "People".to_string(),
        })
        .await;
    editor.pump();
    let target = editor.model.edit_target().unwrap();
    assert_eq!(target.request_id.as_ref(), Some(&request_id));
    assert_eq!(target.breadcrumb, "Demo / People");
}
