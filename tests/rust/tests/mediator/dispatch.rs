//! Tests for publish / dispatch
//!
//! Validates delivery order, envelope contents and per-subscriber isolation.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use panelbus_core::{Component, ComponentKey, EventEnvelope, HandleOutcome, SubscriptionSpec};
use tests::fixtures::mediator;
use tests::{Behavior, Journal, Recorder};

fn order_subscriber(code: &str, journal: &Journal) -> Arc<Recorder> {
    Arc::new(
        Recorder::new("OrderWatcher", code)
            .subscribe("order", "created")
            .with_journal(journal.clone()),
    )
}

#[test]
fn three_subscribers_receive_in_registration_order() {
    let mediator = mediator();
    let journal = Journal::new();
    let subscribers: Vec<_> = ["w1", "w2", "w3"]
        .into_iter()
        .map(|code| order_subscriber(code, &journal))
        .collect();
    for subscriber in &subscribers {
        mediator.attach(subscriber).unwrap();
    }

    let report = mediator.publish("Shop", "shop1", "order", "created", json!({ "id": 1 }), 1000);

    assert_eq!(report.candidates, 3);
    assert_eq!(
        journal.entries(),
        vec![
            "initialize:OrderWatcher#w1",
            "initialize:OrderWatcher#w2",
            "initialize:OrderWatcher#w3",
            "handle:OrderWatcher#w1:order/created",
            "handle:OrderWatcher#w2:order/created",
            "handle:OrderWatcher#w3:order/created",
        ]
    );
    for subscriber in &subscribers {
        let seen = subscriber.events();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].data, json!({ "id": 1 }));
        assert_eq!(seen[0].timestamp, 1000);
    }
}

#[test]
fn failing_subscriber_does_not_stop_the_others() {
    let mediator = mediator();
    let first = Arc::new(Recorder::new("A", "a1").subscribe("order", "created"));
    let second = Arc::new(
        Recorder::new("B", "b1")
            .subscribe("order", "created")
            .with_behavior(Behavior::Fail("inventory offline")),
    );
    let third = Arc::new(Recorder::new("C", "c1").subscribe("order", "created"));
    for component in [&first, &second, &third] {
        mediator.attach(component).unwrap();
    }

    let report = mediator.publish("Shop", "shop1", "order", "created", json!({ "id": 1 }), 1000);

    assert_eq!(first.count(), 1);
    assert_eq!(third.count(), 1);
    assert_eq!(
        report.delivered,
        vec![ComponentKey::new("A", "a1"), ComponentKey::new("C", "c1")]
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].name, "B");
    assert_eq!(report.failures[0].reason, "inventory offline");
}

#[test]
fn panicking_subscriber_is_isolated() {
    tests::init_test_logging();
    let mediator = mediator();
    let panicking = Arc::new(
        Recorder::new("P", "p1")
            .subscribe("order", "created")
            .with_behavior(Behavior::Panic("index out of range")),
    );
    let healthy = Arc::new(Recorder::new("H", "h1").subscribe("order", "created"));
    mediator.attach(&panicking).unwrap();
    mediator.attach(&healthy).unwrap();

    let report = mediator.publish("Shop", "shop1", "order", "created", json!({}), 1);

    assert_eq!(healthy.count(), 1);
    assert_eq!(report.failures[0].reason, "panicked: index out of range");
    assert!(mediator.is_registered(&ComponentKey::new("P", "p1")));
}

#[test]
fn auth_scenario_delivers_exact_envelope() {
    let mediator = mediator();
    let auth = Arc::new(Recorder::new("Auth", "auth1").subscribe("authen", "loginRequested"));
    mediator.attach(&auth).unwrap();

    mediator.publish(
        "Login",
        "login1",
        "authen",
        "loginRequested",
        json!({ "username": "u" }),
        1_717_171_717_000,
    );

    assert_eq!(
        auth.events(),
        vec![EventEnvelope {
            component_name: "Login".into(),
            component_code: "login1".into(),
            channel: "authen".into(),
            event: "loginRequested".into(),
            data: json!({ "username": "u" }),
            timestamp: 1_717_171_717_000,
        }]
    );
}

#[test]
fn envelope_serializes_in_camel_case() {
    let envelope = EventEnvelope {
        component_name: "Auth".into(),
        component_code: "auth1".into(),
        channel: "authen".into(),
        event: "loginRequested".into(),
        data: json!({ "username": "u" }),
        timestamp: 5,
    };
    assert_eq!(
        serde_json::to_value(&envelope).unwrap(),
        json!({
            "componentName": "Auth",
            "componentCode": "auth1",
            "channel": "authen",
            "event": "loginRequested",
            "data": { "username": "u" },
            "timestamp": 5
        })
    );
}

#[test]
fn publish_without_subscribers_is_a_no_op() {
    let mediator = mediator();
    let bystander = Arc::new(Recorder::new("X", "x1").subscribe("order", "created"));
    mediator.attach(&bystander).unwrap();

    let report = mediator.publish("Shop", "shop1", "order", "cancelled", json!({}), 1);

    assert_eq!(report.candidates, 0);
    assert_eq!(bystander.count(), 0);
}

#[test]
fn keys_are_exact_and_case_sensitive() {
    let mediator = mediator();
    let recorder = Arc::new(Recorder::new("X", "x1").subscribe("order:created", "x"));
    mediator.attach(&recorder).unwrap();

    mediator.publish("P", "p", "order", "created:x", json!({}), 1);
    mediator.publish("P", "p", "Order:Created", "x", json!({}), 1);
    assert_eq!(recorder.count(), 0);

    mediator.publish("P", "p", "order:created", "x", json!({}), 1);
    assert_eq!(recorder.count(), 1);
}

#[test]
fn declared_but_unwired_event_is_reported_not_failed() {
    let mediator = mediator();
    let decliner = Arc::new(
        Recorder::new("D", "d1")
            .subscribe("order", "created")
            .with_behavior(Behavior::Decline),
    );
    mediator.attach(&decliner).unwrap();

    let report = mediator.publish("Shop", "shop1", "order", "created", json!({}), 1);

    assert!(report.failures.is_empty());
    assert_eq!(report.unhandled.len(), 1);
    assert_eq!(report.unhandled[0].code, "d1");
    assert!(!report.is_clean());
}

/// Republishes `ping` as `pong` from inside its handler
struct Echo {
    mediator: tests::SharedMediator,
}

impl Component for Echo {
    fn name(&self) -> &str {
        "Echo"
    }

    fn code(&self) -> &str {
        "echo1"
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec::new().with_event("net", panelbus_core::EventDescriptor::new("ping"))
    }

    fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        self.mediator.publish(
            self.name(),
            self.code(),
            "net",
            "pong",
            envelope.data.clone(),
            envelope.timestamp + 1,
        );
        Ok(HandleOutcome::Handled)
    }
}

#[test]
fn handler_may_publish_reentrantly() {
    let mediator = mediator();
    let echo = Arc::new(Echo {
        mediator: mediator.clone(),
    });
    let listener = Arc::new(Recorder::new("L", "l1").subscribe("net", "pong"));
    mediator.attach(&echo).unwrap();
    mediator.attach(&listener).unwrap();

    let report = mediator.publish("P", "p1", "net", "ping", json!({ "seq": 7 }), 10);

    assert!(report.is_clean());
    let pongs = listener.events();
    assert_eq!(pongs.len(), 1);
    assert_eq!(pongs[0].component_name, "Echo");
    assert_eq!(pongs[0].data, json!({ "seq": 7 }));
    assert_eq!(pongs[0].timestamp, 11);
}

#[tokio::test]
async fn publishes_from_spawned_tasks_are_delivered() {
    let mediator = mediator();
    let recorder = Arc::new(Recorder::new("R", "r1").subscribe("job", "done"));
    let mut rx = recorder.take_receiver().unwrap();
    mediator.attach(&recorder).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|n| {
            let mediator = mediator.clone();
            tokio::spawn(async move {
                mediator.publish("Worker", &format!("w{n}"), "job", "done", json!({ "n": n }), n);
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let mut seen = Vec::new();
    while let Ok(envelope) = rx.try_recv() {
        seen.push(envelope.data["n"].as_i64().unwrap());
    }
    seen.sort();
    assert_eq!(seen, vec![0, 1, 2, 3]);
}

#[test]
fn publisher_receives_its_own_event() {
    let mediator = mediator();
    let chatty = Arc::new(
        Recorder::new("Chat", "chat1")
            .subscribe("chat", "message")
            .publishes("chat", "message"),
    );
    mediator.attach(&chatty).unwrap();

    mediator.publish("Chat", "chat1", "chat", "message", json!({ "text": "hi" }), 1);

    assert_eq!(chatty.count(), 1);
    assert_eq!(chatty.events()[0].publisher(), ComponentKey::new("Chat", "chat1"));
}

/// Detaches `target` when it hears `order/created`
struct Canceller {
    mediator: tests::SharedMediator,
    target: ComponentKey,
}

impl Component for Canceller {
    fn name(&self) -> &str {
        "Canceller"
    }

    fn code(&self) -> &str {
        "cancel1"
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec::new().with_event("order", panelbus_core::EventDescriptor::new("created"))
    }

    fn handle_event(&self, _envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        self.mediator.unregister(&self.target);
        Ok(HandleOutcome::Handled)
    }
}

#[test]
fn subscriber_detached_mid_dispatch_is_not_called() {
    let mediator = mediator();
    let journal = Journal::new();
    let late = order_subscriber("late1", &journal);
    let canceller = Arc::new(Canceller {
        mediator: mediator.clone(),
        target: late.key(),
    });
    mediator.attach(&canceller).unwrap();
    mediator.attach(&late).unwrap();

    let report = mediator.publish("Shop", "shop1", "order", "created", json!({}), 1);

    assert_eq!(report.candidates, 2);
    assert_eq!(report.delivered, vec![ComponentKey::new("Canceller", "cancel1")]);
    assert_eq!(report.detached, vec![ComponentKey::new("OrderWatcher", "late1")]);
    assert_eq!(late.count(), 0);
    assert_eq!(
        journal.entries(),
        vec!["initialize:OrderWatcher#late1", "destroy:OrderWatcher#late1"]
    );
}
