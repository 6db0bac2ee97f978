//! Feature components
//!
//! Each component declares what it consumes and emits, forwards requests to
//! the [`AdminApi`](crate::api::AdminApi) on a spawned task, and republishes
//! the result (or a failure event) through the mediator under its own
//! (name, code).
//!
//! ```text
//!   publisher ──► mediator ──► Component::handle_event (sync)
//!                                   │ spawn
//!                                   ▼
//!                             AdminApi call (async)
//!                                   │
//!                                   ▼
//!            mediator.publish(result event) ──► interested components
//! ```

pub mod auth;
pub mod resource;
pub mod shell;

pub use auth::AuthComponent;
pub use resource::{ResourceComponent, ResourceOperation};
pub use shell::{PageShell, ShellState, WindowSize};

use std::future::Future;

use panelbus_core::{now_millis, ComponentKey, DispatchReport, SharedMediator};
use serde_json::Value;

/// Publishes on behalf of one component
///
/// Cheaply cloneable so spawned tasks can report their results.
#[derive(Clone)]
pub struct ComponentSender {
    mediator: SharedMediator,
    key: ComponentKey,
}

impl ComponentSender {
    pub fn new(mediator: SharedMediator, key: ComponentKey) -> Self {
        Self { mediator, key }
    }

    /// Publish with this component as publisher and the current time
    pub fn publish(&self, channel: &str, event: &str, data: Value) -> DispatchReport {
        self.mediator.publish(
            &self.key.name,
            &self.key.code,
            channel,
            event,
            data,
            now_millis(),
        )
    }

    pub fn key(&self) -> &ComponentKey {
        &self.key
    }
}

/// Run backend work on the current tokio runtime
///
/// Fails when called outside a runtime; callers report that as a failure event.
pub(crate) fn spawn_request<F>(task: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let handle = tokio::runtime::Handle::try_current()
        .map_err(|_| anyhow::anyhow!("no async runtime available"))?;
    handle.spawn(task);
    Ok(())
}
