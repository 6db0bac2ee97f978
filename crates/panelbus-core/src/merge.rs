//! Spec merger - fold an extension spec into a base spec
//!
//! Components build their own specification and let the caller that attaches
//! them extend it (extra channels, richer descriptions). Both inputs are
//! borrowed and never mutated; the result is a fresh canonical spec:
//!
//! - one entry per channel, base channels first in their original order,
//!   extension-only channels appended in extension order
//! - within a channel, one descriptor per event name; when both sides declare
//!   the same (channel, event) the extension's descriptor wins
//! - publications are folded the same way, keyed by (channel, event)
//!
//! Inputs are validated before anything is merged, so a malformed side never
//! produces a partial result.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::{SpecError, SpecSide};
use crate::schema::{
    ChannelSubscription, EventDescriptor, EventKey, PublicationDescriptor, PublicationSpec,
    SubscriptionSpec,
};

// ============================================================================
// TYPED MERGE
// ============================================================================

/// Merge two subscription specs, extension winning on (channel, event) collisions
pub fn merge_subscription_specs(
    base: &SubscriptionSpec,
    extension: &SubscriptionSpec,
) -> Result<SubscriptionSpec, SpecError> {
    validate_subscription_spec(base, SpecSide::Base)?;
    validate_subscription_spec(extension, SpecSide::Extension)?;

    let mut merged: Vec<ChannelSubscription> = Vec::new();
    let mut slots: HashMap<&str, usize> = HashMap::new();

    for sub in base.subscriptions.iter().chain(&extension.subscriptions) {
        let slot = *slots.entry(sub.channel.as_str()).or_insert_with(|| {
            merged.push(ChannelSubscription::new(&sub.channel));
            merged.len() - 1
        });
        fold_events(&mut merged[slot].events, &sub.events);
    }

    Ok(SubscriptionSpec {
        subscriptions: merged,
    })
}

/// Merge two publication specs, extension winning on (channel, event) collisions
pub fn merge_publication_specs(
    base: &PublicationSpec,
    extension: &PublicationSpec,
) -> Result<PublicationSpec, SpecError> {
    validate_publication_spec(base, SpecSide::Base)?;
    validate_publication_spec(extension, SpecSide::Extension)?;

    let mut merged: Vec<PublicationDescriptor> = Vec::new();
    let mut slots: HashMap<EventKey, usize> = HashMap::new();

    for publication in base.publications.iter().chain(&extension.publications) {
        match slots.get(&publication.key()) {
            Some(&slot) => merged[slot] = publication.clone(),
            None => {
                slots.insert(publication.key(), merged.len());
                merged.push(publication.clone());
            }
        }
    }

    Ok(PublicationSpec {
        publications: merged,
    })
}

fn fold_events(target: &mut Vec<EventDescriptor>, incoming: &[EventDescriptor]) {
    for event in incoming {
        match target.iter_mut().find(|e| e.name == event.name) {
            Some(existing) => *existing = event.clone(),
            None => target.push(event.clone()),
        }
    }
}

fn validate_subscription_spec(spec: &SubscriptionSpec, side: SpecSide) -> Result<(), SpecError> {
    for (i, sub) in spec.subscriptions.iter().enumerate() {
        if sub.channel.is_empty() {
            return Err(SpecError::malformed(side, format!("subscriptions[{i}].channel")));
        }
        for (j, event) in sub.events.iter().enumerate() {
            if event.name.is_empty() {
                return Err(SpecError::malformed(
                    side,
                    format!("subscriptions[{i}].events[{j}].name"),
                ));
            }
        }
    }
    Ok(())
}

fn validate_publication_spec(spec: &PublicationSpec, side: SpecSide) -> Result<(), SpecError> {
    for (i, publication) in spec.publications.iter().enumerate() {
        if publication.channel.is_empty() {
            return Err(SpecError::malformed(side, format!("publications[{i}].channel")));
        }
        if publication.event.is_empty() {
            return Err(SpecError::malformed(side, format!("publications[{i}].event")));
        }
    }
    Ok(())
}

// ============================================================================
// JSON MERGE
// ============================================================================

/// Merge untyped subscription documents (e.g. extensions read from config)
///
/// `null` and `{}` stand for the empty spec. Any other document must carry a
/// `subscriptions` array whose entries have a string `channel` and an
/// `events` array of objects with a string `name`.
pub fn merge_subscription_values(
    base: &Value,
    extension: &Value,
) -> Result<SubscriptionSpec, SpecError> {
    let base = parse_subscription_value(base, SpecSide::Base)?;
    let extension = parse_subscription_value(extension, SpecSide::Extension)?;
    merge_subscription_specs(&base, &extension)
}

/// Merge untyped publication documents
///
/// `null` and `{}` stand for the empty spec. Any other document must carry a
/// `publications` array whose entries have string `channel` and `event`.
pub fn merge_publication_values(
    base: &Value,
    extension: &Value,
) -> Result<PublicationSpec, SpecError> {
    let base = parse_publication_value(base, SpecSide::Base)?;
    let extension = parse_publication_value(extension, SpecSide::Extension)?;
    merge_publication_specs(&base, &extension)
}

fn is_empty_document(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn require_array<'a>(
    value: &'a Value,
    key: &str,
    side: SpecSide,
    path: &str,
) -> Result<&'a Vec<Value>, SpecError> {
    value
        .get(key)
        .and_then(Value::as_array)
        .ok_or_else(|| SpecError::malformed(side, path))
}

fn require_str(value: &Value, key: &str, side: SpecSide, path: &str) -> Result<(), SpecError> {
    match value.get(key).and_then(Value::as_str) {
        Some(_) => Ok(()),
        None => Err(SpecError::malformed(side, path)),
    }
}

fn parse_subscription_value(value: &Value, side: SpecSide) -> Result<SubscriptionSpec, SpecError> {
    if is_empty_document(value) {
        return Ok(SubscriptionSpec::default());
    }

    let subscriptions = require_array(value, "subscriptions", side, "subscriptions")?;
    for (i, sub) in subscriptions.iter().enumerate() {
        require_str(sub, "channel", side, &format!("subscriptions[{i}].channel"))?;
        let events = require_array(sub, "events", side, &format!("subscriptions[{i}].events"))?;
        for (j, event) in events.iter().enumerate() {
            require_str(event, "name", side, &format!("subscriptions[{i}].events[{j}].name"))?;
        }
    }

    serde_json::from_value(value.clone())
        .map_err(|_| SpecError::malformed(side, "subscriptions"))
}

fn parse_publication_value(value: &Value, side: SpecSide) -> Result<PublicationSpec, SpecError> {
    if is_empty_document(value) {
        return Ok(PublicationSpec::default());
    }

    let publications = require_array(value, "publications", side, "publications")?;
    for (i, publication) in publications.iter().enumerate() {
        require_str(publication, "channel", side, &format!("publications[{i}].channel"))?;
        require_str(publication, "event", side, &format!("publications[{i}].event"))?;
    }

    serde_json::from_value(value.clone())
        .map_err(|_| SpecError::malformed(side, "publications"))
}
