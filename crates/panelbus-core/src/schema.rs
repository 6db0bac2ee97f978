//! Specification schema - declarations of what a component consumes and emits
//!
//! Plain data only. A component describes the (channel, event) pairs it wants
//! delivered in a [`SubscriptionSpec`] and the pairs it may emit in a
//! [`PublicationSpec`]. Publication specs are documentation: the mediator never
//! checks a publish against them.
//!
//! All types serialize in camelCase so snapshots can be handed to external
//! debugging panels unchanged:
//!
//! ```json
//! { "subscriptions": [ { "channel": "authen", "events": [ { "name": "loginRequested", ... } ] } ] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form documentation schema (field name -> type/format string)
///
/// Never validated against actual payloads.
pub type DataFormat = Value;

fn empty_object() -> Value {
    Value::Object(Map::new())
}

// ============================================================================
// KEYS
// ============================================================================

/// Dispatch key: an exact, case-sensitive (channel, event) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub channel: String,
    pub event: String,
}

impl EventKey {
    pub fn new(channel: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
        }
    }

    pub fn matches(&self, channel: &str, event: &str) -> bool {
        self.channel == channel && self.event == event
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.channel, self.event)
    }
}

/// Identity of a registered component instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    pub name: String,
    pub code: String,
}

impl ComponentKey {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.name, self.code)
    }
}

// ============================================================================
// SUBSCRIPTIONS
// ============================================================================

/// One event a component wants delivered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "empty_object")]
    pub data_format: DataFormat,
}

impl EventDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            data_format: empty_object(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }
}

/// Events subscribed to on a single channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSubscription {
    pub channel: String,
    pub events: Vec<EventDescriptor>,
}

impl ChannelSubscription {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            events: Vec::new(),
        }
    }

    pub fn event(&self, name: &str) -> Option<&EventDescriptor> {
        self.events.iter().find(|e| e.name == name)
    }
}

/// Everything a component wants delivered to it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSpec {
    pub subscriptions: Vec<ChannelSubscription>,
}

impl SubscriptionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an event under `channel`, creating the channel entry on first use
    pub fn with_event(mut self, channel: impl Into<String>, event: EventDescriptor) -> Self {
        let channel = channel.into();
        match self.subscriptions.iter_mut().find(|s| s.channel == channel) {
            Some(existing) => existing.events.push(event),
            None => {
                let mut sub = ChannelSubscription::new(channel);
                sub.events.push(event);
                self.subscriptions.push(sub);
            }
        }
        self
    }

    pub fn channel(&self, channel: &str) -> Option<&ChannelSubscription> {
        self.subscriptions.iter().find(|s| s.channel == channel)
    }

    /// Whether (channel, event) is declared
    pub fn contains(&self, channel: &str, event: &str) -> bool {
        self.channel(channel)
            .map(|c| c.event(event).is_some())
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<EventKey> {
        self.subscriptions
            .iter()
            .flat_map(|s| s.events.iter().map(|e| EventKey::new(&s.channel, &e.name)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.iter().all(|s| s.events.is_empty())
    }
}

// ============================================================================
// PUBLICATIONS
// ============================================================================

/// One (channel, event) pair a component may emit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationDescriptor {
    pub channel: String,
    pub event: String,
    #[serde(default)]
    pub description: String,
    /// When the event is emitted, in prose
    #[serde(default)]
    pub condition: String,
    #[serde(default = "empty_object")]
    pub data_format: DataFormat,
    #[serde(default = "empty_object")]
    pub example_data: Value,
}

impl PublicationDescriptor {
    pub fn new(channel: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            event: event.into(),
            description: String::new(),
            condition: String::new(),
            data_format: empty_object(),
            example_data: empty_object(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_condition(mut self, condition: impl Into<String>) -> Self {
        self.condition = condition.into();
        self
    }

    pub fn with_data_format(mut self, data_format: DataFormat) -> Self {
        self.data_format = data_format;
        self
    }

    pub fn with_example_data(mut self, example_data: Value) -> Self {
        self.example_data = example_data;
        self
    }

    pub fn key(&self) -> EventKey {
        EventKey::new(&self.channel, &self.event)
    }
}

/// Everything a component may emit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationSpec {
    pub publications: Vec<PublicationDescriptor>,
}

impl PublicationSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_publication(mut self, publication: PublicationDescriptor) -> Self {
        self.publications.push(publication);
        self
    }

    pub fn contains(&self, channel: &str, event: &str) -> bool {
        self.publications
            .iter()
            .any(|p| p.channel == channel && p.event == event)
    }

    pub fn keys(&self) -> Vec<EventKey> {
        self.publications.iter().map(PublicationDescriptor::key).collect()
    }
}

// ============================================================================
// COMPONENT SPEC & ENVELOPE
// ============================================================================

/// The public description of a component, as shown by the registry browser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentSpec {
    pub name: String,
    pub code: String,
    pub description: String,
    pub subscription_spec: SubscriptionSpec,
    pub publication_spec: PublicationSpec,
}

impl ComponentSpec {
    pub fn key(&self) -> ComponentKey {
        ComponentKey::new(&self.name, &self.code)
    }
}

/// Message delivered to a subscriber
///
/// `component_name` / `component_code` identify the publisher, not the receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub component_name: String,
    pub component_code: String,
    pub channel: String,
    pub event: String,
    pub data: Value,
    /// Sender-supplied milliseconds since epoch
    pub timestamp: i64,
}

impl EventEnvelope {
    pub fn key(&self) -> EventKey {
        EventKey::new(&self.channel, &self.event)
    }

    pub fn publisher(&self) -> ComponentKey {
        ComponentKey::new(&self.component_name, &self.component_code)
    }
}
