//! Event Router - a component's local (channel, event) -> handler table
//!
//! Used inside [`Component::handle_event`](crate::Component::handle_event) to
//! pick the local handler for an envelope. Keys are exact, case-sensitive
//! tuples; there are no wildcards.
//!
//! ```ignore
//! let router = EventRouter::new()
//!     .on("authen", "loginRequested", |auth: &AuthComponent, env| auth.login(env))
//!     .on("authen", "logoutRequested", |auth: &AuthComponent, env| auth.logout(env));
//!
//! fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
//!     self.router.route(self, envelope)
//! }
//! ```

use std::collections::HashMap;

use crate::component::HandleOutcome;
use crate::schema::{EventEnvelope, EventKey, SubscriptionSpec};

type Handler<S> = Box<dyn Fn(&S, &EventEnvelope) -> anyhow::Result<()> + Send + Sync>;

pub struct EventRouter<S> {
    routes: HashMap<EventKey, Handler<S>>,
}

impl<S> EventRouter<S> {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    /// Wire a handler; a later handler for the same key replaces the earlier one
    pub fn on<F>(mut self, channel: impl Into<String>, event: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &EventEnvelope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.routes
            .insert(EventKey::new(channel, event), Box::new(handler));
        self
    }

    /// Run the handler wired for the envelope's key
    ///
    /// Returns `Unhandled` when nothing is wired; errors from the handler are
    /// passed through to the mediator.
    pub fn route(&self, state: &S, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        match self.routes.get(&envelope.key()) {
            Some(handler) => {
                handler(state, envelope)?;
                Ok(HandleOutcome::Handled)
            }
            None => Ok(HandleOutcome::Unhandled),
        }
    }

    pub fn handles(&self, key: &EventKey) -> bool {
        self.routes.contains_key(key)
    }

    /// Wired keys, sorted
    pub fn keys(&self) -> Vec<EventKey> {
        let mut keys: Vec<EventKey> = self.routes.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Keys declared in `spec` that have no handler wired
    pub fn unwired(&self, spec: &SubscriptionSpec) -> Vec<EventKey> {
        spec.keys()
            .into_iter()
            .filter(|key| !self.handles(key))
            .collect()
    }
}

impl<S> Default for EventRouter<S> {
    fn default() -> Self {
        Self::new()
    }
}
