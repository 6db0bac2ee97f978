//! Tests for spec merging
//!
//! Validates identity, union without duplicates, extension precedence and
//! malformed input reporting.

use std::collections::HashSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use panelbus_core::{
    merge_publication_specs, merge_subscription_specs, merge_subscription_values, EventDescriptor,
    EventKey, MediatorError, PublicationDescriptor, PublicationSpec, SpecError, SpecExtension,
    SpecSide, SubscriptionSpec,
};
use tests::fixtures::mediator;
use tests::Recorder;

fn base() -> SubscriptionSpec {
    SubscriptionSpec::new()
        .with_event("x", EventDescriptor::new("y").with_description("from base"))
        .with_event("x", EventDescriptor::new("z"))
        .with_event("system", EventDescriptor::new("start"))
}

fn extension() -> SubscriptionSpec {
    SubscriptionSpec::new()
        .with_event("x", EventDescriptor::new("y").with_description("from extension"))
        .with_event("ui", EventDescriptor::new("windowSizeChange"))
}

#[test]
fn merging_with_empty_is_identity() {
    let merged = merge_subscription_specs(&base(), &SubscriptionSpec::new()).unwrap();
    assert_eq!(merged, base());

    let publications = PublicationSpec::new()
        .with_publication(PublicationDescriptor::new("role", "listed"));
    assert_eq!(
        merge_publication_specs(&publications, &PublicationSpec::new()).unwrap(),
        publications
    );
}

#[test]
fn merge_is_a_union_without_duplicates() {
    let merged = merge_subscription_specs(&base(), &extension()).unwrap();

    let expected: HashSet<EventKey> = base().keys().into_iter().chain(extension().keys()).collect();
    let keys = merged.keys();
    let unique: HashSet<EventKey> = keys.iter().cloned().collect();

    assert_eq!(unique, expected);
    assert_eq!(keys.len(), unique.len());
    assert_eq!(
        merged
            .subscriptions
            .iter()
            .map(|s| s.channel.as_str())
            .collect::<Vec<_>>(),
        vec!["x", "system", "ui"]
    );
}

#[test]
fn extension_description_wins() {
    let merged = merge_subscription_specs(&base(), &extension()).unwrap();
    let descriptor = merged.channel("x").unwrap().event("y").unwrap();
    assert_eq!(descriptor.description, "from extension");
}

#[test]
fn inputs_are_not_mutated() {
    let base = base();
    let extension = extension();
    let _ = merge_subscription_specs(&base, &extension).unwrap();
    assert_eq!(base, self::base());
    assert_eq!(extension, self::extension());
}

#[test]
fn document_missing_events_names_side_and_field() {
    let err = merge_subscription_values(
        &json!({ "subscriptions": [{ "channel": "x", "events": [] }] }),
        &json!({ "subscriptions": [{ "channel": "y" }] }),
    )
    .unwrap_err();

    assert_eq!(
        err,
        SpecError::Malformed {
            side: SpecSide::Extension,
            field: "subscriptions[0].events".into()
        }
    );
}

#[test]
fn attach_with_extension_registers_merged_spec() {
    let mediator = mediator();
    let component = Arc::new(Recorder::new("RoleList", "list1").subscribe("role", "listed"));
    let extension = SpecExtension::new().with_event("role", EventDescriptor::new("failed"));

    mediator.attach_with(&component, &extension).unwrap();
    mediator.publish("RoleAdmin", "role1", "role", "failed", json!({}), 1);

    let listing = mediator.list_components();
    assert!(listing[0].subscription_spec.contains("role", "listed"));
    assert!(listing[0].subscription_spec.contains("role", "failed"));
    assert_eq!(component.count(), 1);
}

#[test]
fn malformed_extension_aborts_attach() {
    let mediator = mediator();
    let component = Arc::new(Recorder::new("A", "a1").subscribe("x", "y"));
    let extension = SpecExtension::new().with_event("", EventDescriptor::new("y"));

    let err = mediator.attach_with(&component, &extension).unwrap_err();

    assert!(matches!(
        err,
        MediatorError::MalformedSpec(SpecError::Malformed {
            side: SpecSide::Extension,
            ..
        })
    ));
    assert_eq!(mediator.component_count(), 0);
}
