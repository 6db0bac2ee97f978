//! Tests for ResourceComponent
//!
//! Validates list / create / update / delete round trips, the local record
//! cache and `failed` events.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;

use panelbus_admin::components::resource::FAILED;
use panelbus_admin::{AdminApi, ResourceComponent, ResourceKind, ResourceOperation};
use panelbus_core::EventEnvelope;
use tests::events::wait_for;
use tests::fixtures::{mediator, seeded_api};
use tests::mocks::UnavailableAdminApi;
use tests::{Recorder, SharedMediator};

fn attach_role_admin(
    mediator: &SharedMediator,
    api: Arc<dyn AdminApi>,
) -> (Arc<ResourceComponent>, Arc<Recorder>, UnboundedReceiver<EventEnvelope>) {
    tests::init_test_logging();
    let mut listener = Recorder::new("RoleList", "list1").subscribe("role", FAILED);
    for operation in ResourceOperation::ALL {
        listener = listener.subscribe("role", operation.result_event());
    }
    let listener = Arc::new(listener);
    let rx = listener.take_receiver().unwrap();
    let admin = Arc::new(ResourceComponent::new(ResourceKind::Role, "role1", mediator.clone(), api));

    mediator.attach(&listener).unwrap();
    mediator.attach(&admin).unwrap();
    (admin, listener, rx)
}

fn request(mediator: &SharedMediator, event: &str, data: Value) {
    mediator.publish("RoleList", "list1", "role", event, data, panelbus_core::now_millis());
}

fn names(records: &[panelbus_admin::Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|r| r.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[tokio::test]
async fn list_returns_backend_records() {
    let mediator = mediator();
    let (admin, _listener, mut rx) = attach_role_admin(&mediator, Arc::new(seeded_api()));

    request(&mediator, "listRequested", json!({}));
    let listed = wait_for(&mut rx, "listed").await.unwrap();

    assert_eq!(listed.component_name, "RoleAdmin");
    assert_eq!(listed.data["records"].as_array().unwrap().len(), 2);
    assert_eq!(names(&admin.records()), vec!["administrator", "operator"]);
}

#[tokio::test]
async fn create_update_delete_round_trip() {
    let mediator = mediator();
    let api = Arc::new(seeded_api());
    let (admin, _listener, mut rx) = attach_role_admin(&mediator, api.clone());

    request(&mediator, "listRequested", json!({}));
    wait_for(&mut rx, "listed").await.unwrap();

    request(&mediator, "createRequested", json!({ "record": { "name": "auditor" } }));
    let created = wait_for(&mut rx, "created").await.unwrap();
    let id = created.data["record"]["id"].as_str().unwrap().to_string();
    assert_eq!(api.count(ResourceKind::Role), 3);

    request(
        &mediator,
        "updateRequested",
        json!({ "id": id, "record": { "name": "reviewer" } }),
    );
    let updated = wait_for(&mut rx, "updated").await.unwrap();
    assert_eq!(updated.data["record"], json!({ "name": "reviewer", "id": id }));

    request(&mediator, "deleteRequested", json!({ "id": "r2" }));
    let deleted = wait_for(&mut rx, "deleted").await.unwrap();
    assert_eq!(deleted.data, json!({ "id": "r2" }));

    assert_eq!(names(&admin.records()), vec!["administrator", "reviewer"]);
    assert_eq!(api.count(ResourceKind::Role), 2);
}

#[tokio::test]
async fn backend_rejection_publishes_failed() {
    let mediator = mediator();
    let (admin, _listener, mut rx) = attach_role_admin(&mediator, Arc::new(seeded_api()));

    request(&mediator, "createRequested", json!({ "record": { "name": "operator" } }));
    let failed = wait_for(&mut rx, FAILED).await.unwrap();
    assert_eq!(failed.data["operation"], "create");
    assert_eq!(failed.data["reason"], "conflict: role named operator already exists");

    request(&mediator, "deleteRequested", json!({ "id": "missing" }));
    let failed = wait_for(&mut rx, FAILED).await.unwrap();
    assert_eq!(
        failed.data,
        json!({ "operation": "delete", "reason": "role missing not found" })
    );
    assert!(admin.records().is_empty());
}

#[tokio::test]
async fn unreachable_backend_publishes_failed() {
    let mediator = mediator();
    let api = Arc::new(UnavailableAdminApi::new());
    let (_admin, _listener, mut rx) = attach_role_admin(&mediator, api.clone());

    request(&mediator, "listRequested", json!({}));
    let failed = wait_for(&mut rx, FAILED).await.unwrap();

    assert_eq!(failed.data["operation"], "list");
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn malformed_request_is_a_handler_failure() {
    let mediator = mediator();
    let api = Arc::new(UnavailableAdminApi::new());
    let (_admin, listener, _rx) = attach_role_admin(&mediator, api.clone());

    let report = mediator.publish("RoleList", "list1", "role", "updateRequested", json!({ "id": 3 }), 1);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "RoleAdmin");
    assert_eq!(api.calls(), 0);
    assert_eq!(listener.count(), 0);
}

#[tokio::test]
async fn kinds_do_not_cross_channels() {
    let mediator = mediator();
    let api: Arc<dyn AdminApi> = Arc::new(seeded_api());
    let (_roles, _listener, mut rx) = attach_role_admin(&mediator, api.clone());
    let users = Arc::new(ResourceComponent::new(ResourceKind::User, "user1", mediator.clone(), api));
    mediator.attach(&users).unwrap();

    let report = mediator.publish("UserList", "list1", "user", "listRequested", json!({}), 1);
    assert_eq!(report.delivered.len(), 1);

    request(&mediator, "listRequested", json!({}));
    let listed = wait_for(&mut rx, "listed").await.unwrap();
    assert_eq!(listed.channel, "role");
    assert_eq!(listed.component_name, "RoleAdmin");
}
