//! Tests for AuthComponent
//!
//! Validates login / logout round trips and failure events.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use panelbus_admin::components::auth::events;
use panelbus_admin::{AdminApi, AuthComponent, InMemoryAdminApi};
use panelbus_core::{Component, EventEnvelope};
use tests::events::wait_for;
use tests::fixtures::{mediator, seeded_api};
use tests::mocks::UnavailableAdminApi;
use tests::{Recorder, SharedMediator};

struct Harness {
    mediator: SharedMediator,
    auth: Arc<AuthComponent>,
    // Held so the recorder stays registered
    _listener: Arc<Recorder>,
    rx: UnboundedReceiver<EventEnvelope>,
}

fn harness(api: Arc<dyn AdminApi>) -> Harness {
    tests::init_test_logging();
    let mediator = mediator();
    let listener = Arc::new(
        Recorder::new("Login", "login1")
            .subscribe(events::CHANNEL, events::LOGIN_SUCCEEDED)
            .subscribe(events::CHANNEL, events::LOGIN_FAILED)
            .subscribe(events::CHANNEL, events::LOGOUT_COMPLETED)
            .publishes(events::CHANNEL, events::LOGIN_REQUESTED),
    );
    let rx = listener.take_receiver().unwrap();
    let auth = Arc::new(AuthComponent::new("auth1", mediator.clone(), api));
    mediator.attach(&listener).unwrap();
    mediator.attach(&auth).unwrap();

    Harness {
        mediator,
        auth,
        _listener: listener,
        rx,
    }
}

fn request_login(mediator: &SharedMediator, username: &str, password: &str) {
    mediator.publish(
        "Login",
        "login1",
        events::CHANNEL,
        events::LOGIN_REQUESTED,
        json!({ "username": username, "password": password }),
        panelbus_core::now_millis(),
    );
}

#[tokio::test]
async fn login_and_logout_round_trip() {
    let api = Arc::new(seeded_api());
    let mut h = harness(api.clone());

    request_login(&h.mediator, "admin", "secret");
    let succeeded = wait_for(&mut h.rx, events::LOGIN_SUCCEEDED).await.unwrap();

    assert_eq!(succeeded.component_name, "Auth");
    assert_eq!(succeeded.component_code, "auth1");
    assert_eq!(succeeded.data["username"], "admin");
    let token = succeeded.data["token"].as_str().unwrap().to_string();
    assert_eq!(h.auth.session().unwrap().token, token);
    assert_eq!(api.active_sessions(), 1);

    h.mediator.publish("Menu", "menu1", events::CHANNEL, events::LOGOUT_REQUESTED, json!({}), 2);
    let completed = wait_for(&mut h.rx, events::LOGOUT_COMPLETED).await.unwrap();

    assert_eq!(completed.data, json!({ "username": "admin" }));
    assert!(h.auth.session().is_none());
    assert_eq!(api.active_sessions(), 0);
}

#[tokio::test]
async fn wrong_password_publishes_login_failed() {
    let mut h = harness(Arc::new(seeded_api()));

    request_login(&h.mediator, "admin", "guess");
    let failed = wait_for(&mut h.rx, events::LOGIN_FAILED).await.unwrap();

    assert_eq!(
        failed.data,
        json!({ "username": "admin", "reason": "invalid credentials" })
    );
    assert!(h.auth.session().is_none());
}

#[tokio::test]
async fn unreachable_backend_publishes_login_failed() {
    let api = Arc::new(UnavailableAdminApi::new());
    let mut h = harness(api.clone());

    request_login(&h.mediator, "admin", "secret");
    let failed = wait_for(&mut h.rx, events::LOGIN_FAILED).await.unwrap();

    assert_eq!(failed.data["reason"], "backend unavailable: connection refused");
    assert_eq!(api.calls(), 1);
}

#[tokio::test]
async fn detach_clears_session() {
    let h = harness(Arc::new(InMemoryAdminApi::new().with_account("u", "p")));
    let mut rx = h.rx;

    request_login(&h.mediator, "u", "p");
    wait_for(&mut rx, events::LOGIN_SUCCEEDED).await.unwrap();
    assert!(h.auth.session().is_some());

    assert!(h.mediator.detach(h.auth.as_ref()));
    assert!(h.auth.session().is_none());
    assert!(!h.mediator.is_registered(&h.auth.key()));
}

#[test]
fn declares_its_events() {
    let mediator = mediator();
    let auth = AuthComponent::new("auth1", mediator, Arc::new(InMemoryAdminApi::new()));

    let subscriptions = auth.subscription_spec();
    assert!(subscriptions.contains("authen", "loginRequested"));
    assert!(subscriptions.contains("authen", "logoutRequested"));

    let publications = auth.publication_spec();
    for event in ["loginSucceeded", "loginFailed", "logoutCompleted"] {
        assert!(publications.contains("authen", event), "missing {event}");
    }
}
