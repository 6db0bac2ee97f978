//! Mediator - synchronous publish/subscribe over the component registry
//!
//! The mediator is the one shared piece every component talks through. It is
//! created explicitly by the host and handed to components by reference.
//!
//! # Dispatch
//!
//! ```text
//! publish(name, code, channel, event, data, ts)
//!     │
//!     ▼
//! EventEnvelope ──► candidates = registry entries subscribed to (channel, event)
//!                        │ (registration order, fixed when publish starts)
//!                        ▼
//!                  handle_event(&envelope) on each, on the caller's thread
//!                        │
//!                        ├─ Ok(Handled)    -> delivered
//!                        ├─ Ok(Unhandled)  -> UnhandledEventWarning (logged)
//!                        └─ Err / panic    -> SubscriberHandlerError (logged)
//! ```
//!
//! Failures are isolated per subscriber and never reach the publisher. No lock
//! is held while handlers run, so a handler may publish, attach or detach.
//!
//! # Usage
//!
//! ```ignore
//! let mediator = Mediator::create(MediatorConfig::default());
//! let auth = Arc::new(AuthComponent::new(mediator.clone(), api));
//! mediator.attach(&auth)?;
//!
//! mediator.publish("Login", "login1", "authen", "loginRequested", json!({ "username": "u" }), now_millis());
//!
//! mediator.detach(auth.as_ref());
//! mediator.shutdown();
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::component::{Component, ComponentRegistration, HandleOutcome, SpecExtension};
use crate::config::MediatorConfig;
use crate::error::{MediatorError, Result, SubscriberHandlerError, UnhandledEventWarning};
use crate::guard::run_guarded;
use crate::introspection::{build_status, PubSubActivity, PubSubStatus};
use crate::registry::ComponentRegistry;
use crate::schema::{ComponentKey, ComponentSpec, EventEnvelope, EventKey};

/// What happened during one `publish`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub key: EventKey,
    /// Subscribers selected when the publish started
    pub candidates: usize,
    /// Subscribers whose local handler ran successfully, in delivery order
    pub delivered: Vec<ComponentKey>,
    pub unhandled: Vec<UnhandledEventWarning>,
    pub failures: Vec<SubscriberHandlerError>,
    /// Subscribers dropped by their owner without being detached
    pub skipped: Vec<ComponentKey>,
    /// Subscribers detached by an earlier handler of this same publish
    pub detached: Vec<ComponentKey>,
}

impl DispatchReport {
    fn new(key: EventKey, candidates: usize) -> Self {
        Self {
            key,
            candidates,
            delivered: Vec::new(),
            unhandled: Vec::new(),
            failures: Vec::new(),
            skipped: Vec::new(),
            detached: Vec::new(),
        }
    }

    /// Subscribers whose `handle_event` was invoked
    pub fn invoked(&self) -> usize {
        self.delivered.len() + self.unhandled.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.unhandled.is_empty() && self.failures.is_empty()
    }
}

/// Shared mediator handed to every component
pub type SharedMediator = Arc<Mediator>;

pub struct Mediator {
    registry: ComponentRegistry,
    activity: Mutex<PubSubActivity>,
    config: MediatorConfig,
    shut_down: AtomicBool,
}

impl Mediator {
    pub fn new(config: MediatorConfig) -> Self {
        Self {
            registry: ComponentRegistry::new(config.catch_panics),
            activity: Mutex::new(PubSubActivity::new(config.history_capacity)),
            config,
            shut_down: AtomicBool::new(false),
        }
    }

    /// Create the process-wide mediator
    pub fn create(config: MediatorConfig) -> SharedMediator {
        info!(?config, "[Mediator] Created");
        Arc::new(Self::new(config))
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.config
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// Detach every component (most recent first) and refuse new registrations
    pub fn shutdown(&self) {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            debug!("[Mediator] Already shut down");
            return;
        }
        let removed = self.registry.unregister_all();
        info!(removed, "[Mediator] Shut down");
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Register a component with its own spec
    pub fn attach<C: Component + 'static>(&self, component: &Arc<C>) -> Result<ComponentKey> {
        self.attach_with(component, &SpecExtension::default())
    }

    /// Register a component with its spec merged with `extension`
    pub fn attach_with<C: Component + 'static>(
        &self,
        component: &Arc<C>,
        extension: &SpecExtension,
    ) -> Result<ComponentKey> {
        let registration = ComponentRegistration::from_component(component, extension)?;
        let key = registration.key.clone();
        self.register(registration)?;
        info!(component = %key, "[Mediator] Attached component");
        Ok(key)
    }

    /// Unregister a component; a no-op if it is not attached
    pub fn detach<C: Component + ?Sized>(&self, component: &C) -> bool {
        let key = component.key();
        let removed = self.unregister(&key);
        if removed {
            info!(component = %key, "[Mediator] Detached component");
        }
        removed
    }

    pub fn register(&self, registration: ComponentRegistration) -> Result<()> {
        if self.is_shut_down() {
            return Err(MediatorError::ShutDown);
        }
        self.registry.register(registration)
    }

    pub fn unregister(&self, key: &ComponentKey) -> bool {
        self.registry.unregister(key)
    }

    pub fn is_registered(&self, key: &ComponentKey) -> bool {
        self.registry.contains(key)
    }

    pub fn component_count(&self) -> usize {
        self.registry.len()
    }

    // ========================================================================
    // DISPATCH
    // ========================================================================

    /// Deliver an event to every subscriber of (channel, event)
    ///
    /// `component_name` / `component_code` identify the publisher and
    /// `timestamp` is passed through untouched. Never fails: subscriber
    /// problems are logged and reported.
    pub fn publish(
        &self,
        component_name: &str,
        component_code: &str,
        channel: &str,
        event: &str,
        data: Value,
        timestamp: i64,
    ) -> DispatchReport {
        let envelope = EventEnvelope {
            component_name: component_name.to_string(),
            component_code: component_code.to_string(),
            channel: channel.to_string(),
            event: event.to_string(),
            data,
            timestamp,
        };
        self.dispatch(&envelope)
    }

    /// Deliver a pre-built envelope
    pub fn dispatch(&self, envelope: &EventEnvelope) -> DispatchReport {
        let key = envelope.key();

        if self.is_shut_down() {
            warn!(
                channel = %envelope.channel,
                event = %envelope.event,
                publisher = %envelope.publisher(),
                "[Mediator] Publish after shutdown dropped"
            );
            return DispatchReport::new(key, 0);
        }

        let candidates = self.registry.candidates(&key);
        let mut report = DispatchReport::new(key, candidates.len());

        for candidate in candidates {
            // Detached by an earlier subscriber during this dispatch
            if !self.registry.is_current(&candidate) {
                report.detached.push(candidate.key);
                continue;
            }
            let Some(component) = candidate.component.upgrade() else {
                report.skipped.push(candidate.key);
                continue;
            };

            let outcome = run_guarded(self.config.catch_panics, || component.handle_event(envelope));
            match outcome {
                Ok(HandleOutcome::Handled) => {
                    debug!(
                        subscriber = %candidate.key,
                        channel = %envelope.channel,
                        event = %envelope.event,
                        "[Mediator] Delivered event"
                    );
                    report.delivered.push(candidate.key);
                }
                Ok(HandleOutcome::Unhandled) => {
                    let warning = UnhandledEventWarning {
                        name: candidate.key.name,
                        code: candidate.key.code,
                        channel: envelope.channel.clone(),
                        event: envelope.event.clone(),
                    };
                    if self.config.warn_on_unhandled {
                        warn!("[Mediator] {}", warning);
                    }
                    report.unhandled.push(warning);
                }
                Err(reason) => {
                    let failure = SubscriberHandlerError {
                        name: candidate.key.name,
                        code: candidate.key.code,
                        channel: envelope.channel.clone(),
                        event: envelope.event.clone(),
                        reason,
                    };
                    error!("[Mediator] {}", failure);
                    report.failures.push(failure);
                }
            }
        }

        if !report.skipped.is_empty() {
            self.registry.prune_dropped(&report.skipped);
        }

        self.activity.lock().record(
            envelope,
            report.delivered.len(),
            report.unhandled.len(),
            report.failures.len(),
        );

        debug!(
            channel = %envelope.channel,
            event = %envelope.event,
            publisher = %envelope.publisher(),
            candidates = report.candidates,
            delivered = report.delivered.len(),
            "[Mediator] Published event"
        );

        report
    }

    // ========================================================================
    // INTROSPECTION
    // ========================================================================

    /// Snapshot of every registered component's public spec
    pub fn list_components(&self) -> Vec<ComponentSpec> {
        self.registry.list_components()
    }

    /// Snapshot of subscriptions, declared publications and publish activity
    pub fn pubsub_status(&self) -> PubSubStatus {
        let components = self.registry.list_components();
        let activity = self.activity.lock();
        build_status(&components, &activity)
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new(MediatorConfig::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================
