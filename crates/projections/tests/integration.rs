//! Integration tests: UserService commands → ProjectionProcessor → UserView.

use std::sync::Arc;
use std::time::Duration;

use common::EntityKey;
use domain::{
    AddDevice, ChangeStatus, CreateUser, DeleteUser, DeviceId, RenameUser, UpdateUser, User,
    UserService,
};
use entity_store::{ChangeEnvelope, CommitOptions, EntityStore, InMemoryEntityStore, Version};
use projections::{Projection, ProjectionProcessor, ReadModel, UserRow, UserView};

/// Helper to set up service, processor, and view.
fn setup() -> (
    UserService<InMemoryEntityStore>,
    ProjectionProcessor<InMemoryEntityStore>,
    UserView,
) {
    let store = InMemoryEntityStore::new();
    let service = UserService::new(store.clone());

    let view = UserView::new();
    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(view.clone()));

    (service, processor, view)
}

/// Polls the view until the row for `key` satisfies `done`.
async fn eventually(view: &UserView, key: &str, done: impl Fn(Option<&UserRow>) -> bool) {
    let key = EntityKey::new(key);
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if done(view.get_row(&key).await.as_ref()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("view did not converge");
}

#[tokio::test]
async fn test_view_row_matches_latest_commit_after_catch_up() {
    let (service, processor, view) = setup();

    service
        .update_user(UpdateUser::new("u1", User::new("A", "active", [])))
        .await
        .unwrap();
    service
        .update_user(UpdateUser::new("u1", User::new("B", "active", [])))
        .await
        .unwrap();

    processor.run_catch_up().await.unwrap();

    let row = view.get_row(&EntityKey::new("u1")).await.unwrap();
    assert_eq!(row.to_user(), User::new("B", "active", []));
    assert_eq!(row.version, Version::new(2));
}

#[tokio::test]
async fn test_live_view_eventually_shows_latest_record() {
    let (service, processor, view) = setup();
    let handle = Arc::new(processor).spawn_live();

    service
        .update_user(UpdateUser::new("u1", User::new("A", "active", [])))
        .await
        .unwrap();
    service
        .update_user(UpdateUser::new("u1", User::new("B", "active", [])))
        .await
        .unwrap();

    eventually(&view, "u1", |row| {
        row.is_some_and(|r| r.to_user() == User::new("B", "active", []))
    })
    .await;

    handle.abort();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_live_view_tracks_many_users() {
    let (service, processor, view) = setup();
    let service = Arc::new(service);
    let handle = Arc::new(processor).spawn_live();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let service = Arc::clone(&service);
        tasks.push(tokio::spawn(async move {
            let key = format!("u{i}");
            service
                .create_user(CreateUser::new(key.as_str(), "A", "active"))
                .await
                .unwrap();
            service
                .rename_user(RenameUser::new(key.as_str(), format!("name-{i}")))
                .await
                .unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    for i in 0..20 {
        let expected = format!("name-{i}");
        eventually(&view, &format!("u{i}"), |row| {
            row.is_some_and(|r| r.name == expected && r.version == Version::new(2))
        })
        .await;
    }
    assert_eq!(ReadModel::count(&view), 20);

    handle.abort();
}

#[tokio::test]
async fn test_patches_and_deletion_flow_into_view() {
    let (service, processor, view) = setup();

    service
        .create_user(CreateUser::new("u1", "A", "new"))
        .await
        .unwrap();
    service
        .change_status(ChangeStatus::new("u1", "active"))
        .await
        .unwrap();
    service
        .add_device(AddDevice::new("u1", "phone"))
        .await
        .unwrap();
    processor.run_catch_up().await.unwrap();

    let row = view.get_row(&EntityKey::new("u1")).await.unwrap();
    assert_eq!(row.status, "active");
    assert_eq!(row.devices, vec![DeviceId::new("phone")]);
    assert_eq!(view.rows_by_device(&DeviceId::new("phone")).await.len(), 1);

    service.delete_user(DeleteUser::new("u1")).await.unwrap();
    processor.run_catch_up().await.unwrap();

    assert!(view.get_row(&EntityKey::new("u1")).await.is_none());
}

#[tokio::test]
async fn test_rebuild_produces_same_rows() {
    let (service, processor, view) = setup();

    for key in ["u1", "u2", "u3"] {
        service
            .create_user(CreateUser::new(key, "A", "active"))
            .await
            .unwrap();
    }
    service.delete_user(DeleteUser::new("u2")).await.unwrap();
    processor.run_catch_up().await.unwrap();
    let before = view.all_rows().await;

    processor.rebuild_all().await.unwrap();

    assert_eq!(view.all_rows().await, before);
    assert_eq!(before.len(), 2);
}

/// Commits a raw User change, bypassing the service's validation.
async fn commit_raw(
    store: &InMemoryEntityStore,
    key: &str,
    version: i64,
    state: serde_json::Value,
) {
    let change = ChangeEnvelope::builder()
        .entity_type("User")
        .key(key)
        .version(Version::new(version))
        .state_raw(state)
        .build();
    store.commit(change, CommitOptions::new()).await.unwrap();
}

#[tokio::test]
async fn test_undecodable_change_does_not_stall_catch_up_or_live() {
    let store = InMemoryEntityStore::new();
    commit_raw(&store, "u1", 1, serde_json::json!({"unexpected": 1})).await;
    commit_raw(
        &store,
        "u1",
        2,
        serde_json::json!({"name": "A", "status": "active", "devices": []}),
    )
    .await;

    let view = UserView::new();
    let mut processor = ProjectionProcessor::new(store.clone());
    processor.register(Box::new(view.clone()));
    let processor = Arc::new(processor);

    processor.run_catch_up().await.unwrap();
    let row = view.get_row(&EntityKey::new("u1")).await.unwrap();
    assert_eq!(row.name, "A");
    assert_eq!(view.position().await.last_sequence, 2);

    let handle = Arc::clone(&processor).spawn_live();
    commit_raw(&store, "u2", 1, serde_json::json!({"unexpected": 1})).await;
    commit_raw(
        &store,
        "u2",
        2,
        serde_json::json!({"name": "B", "status": "active", "devices": []}),
    )
    .await;

    eventually(&view, "u2", |row| row.is_some_and(|r| r.name == "B")).await;
    assert_eq!(view.position().await.last_sequence, 4);

    handle.abort();
}
