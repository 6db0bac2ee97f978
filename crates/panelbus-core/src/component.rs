//! Component contract - what every participant on the bus implements
//!
//! A component is owned by whoever controls its lifetime (the host, a page,
//! a test). The mediator only keeps a [`Weak`] reference, so components may
//! freely hold a [`SharedMediator`](crate::SharedMediator) without creating a
//! reference cycle.

use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::error::SpecError;
use crate::merge::{
    merge_publication_specs, merge_publication_values, merge_subscription_specs,
    merge_subscription_values,
};
use crate::schema::{
    ComponentKey, ComponentSpec, EventDescriptor, EventEnvelope, PublicationDescriptor,
    PublicationSpec, SubscriptionSpec,
};

/// Result of offering an envelope to a component
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleOutcome {
    /// A local handler ran
    Handled,
    /// The component declared the event but has no local handler for it
    Unhandled,
}

/// A participant on the bus
///
/// `name` + `code` identify one instance and must be unique among registered
/// components. `handle_event` is called synchronously on the publisher's
/// thread; long-running work belongs on a spawned task that publishes its
/// result when done.
pub trait Component: Send + Sync {
    fn name(&self) -> &str;

    fn code(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn subscription_spec(&self) -> SubscriptionSpec;

    fn publication_spec(&self) -> PublicationSpec {
        PublicationSpec::default()
    }

    fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome>;

    /// Called once, right after registration succeeds
    ///
    /// Returning an error (or panicking) rolls the registration back.
    fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called just before the component is removed from the registry
    fn destroy(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn key(&self) -> ComponentKey {
        ComponentKey::new(self.name(), self.code())
    }

    fn full_spec(&self) -> ComponentSpec {
        ComponentSpec {
            name: self.name().to_string(),
            code: self.code().to_string(),
            description: self.description().to_string(),
            subscription_spec: self.subscription_spec(),
            publication_spec: self.publication_spec(),
        }
    }
}

/// Caller-supplied additions merged into a component's own spec at attach time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpecExtension {
    pub subscriptions: SubscriptionSpec,
    pub publications: PublicationSpec,
}

impl SpecExtension {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_event(mut self, channel: impl Into<String>, event: EventDescriptor) -> Self {
        self.subscriptions = self.subscriptions.with_event(channel, event);
        self
    }

    pub fn with_publication(mut self, publication: PublicationDescriptor) -> Self {
        self.publications = self.publications.with_publication(publication);
        self
    }

    /// Build an extension from untyped documents, validating them as extensions
    pub fn from_values(subscriptions: &Value, publications: &Value) -> Result<Self, SpecError> {
        Ok(Self {
            subscriptions: merge_subscription_values(&Value::Null, subscriptions)?,
            publications: merge_publication_values(&Value::Null, publications)?,
        })
    }
}

/// Everything the registry keeps about one component instance
#[derive(Clone)]
pub struct ComponentRegistration {
    pub key: ComponentKey,
    pub description: String,
    pub subscription_spec: SubscriptionSpec,
    pub publication_spec: PublicationSpec,
    pub component: Weak<dyn Component>,
}

impl ComponentRegistration {
    /// Snapshot a component's spec merged with `extension`
    pub fn from_component<C: Component + 'static>(
        component: &Arc<C>,
        extension: &SpecExtension,
    ) -> Result<Self, SpecError> {
        let subscription_spec =
            merge_subscription_specs(&component.subscription_spec(), &extension.subscriptions)?;
        let publication_spec =
            merge_publication_specs(&component.publication_spec(), &extension.publications)?;
        let weak: Weak<C> = Arc::downgrade(component);
        let weak: Weak<dyn Component> = weak;

        Ok(Self {
            key: component.key(),
            description: component.description().to_string(),
            subscription_spec,
            publication_spec,
            component: weak,
        })
    }

    pub fn spec(&self) -> ComponentSpec {
        ComponentSpec {
            name: self.key.name.clone(),
            code: self.key.code.clone(),
            description: self.description.clone(),
            subscription_spec: self.subscription_spec.clone(),
            publication_spec: self.publication_spec.clone(),
        }
    }
}

impl std::fmt::Debug for ComponentRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistration")
            .field("key", &self.key)
            .field("description", &self.description)
            .field("subscription_spec", &self.subscription_spec)
            .field("publication_spec", &self.publication_spec)
            .field("alive", &(self.component.strong_count() > 0))
            .finish()
    }
}
