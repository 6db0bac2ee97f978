//! Page shell
//!
//! Tracks the application lifecycle and the host window size, and announces
//! itself on the `shell` channel.

use panelbus_core::channels::{system, ui};
use panelbus_core::{
    Component, ComponentKey, EventDescriptor, EventEnvelope, EventRouter, HandleOutcome,
    PublicationDescriptor, PublicationSpec, SharedMediator, SubscriptionSpec,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::ComponentSender;

pub mod events {
    pub const CHANNEL: &str = "shell";
    pub const READY: &str = "ready";
    pub const LAYOUT_CHANGED: &str = "layoutChanged";
}

const NAME: &str = "PageShell";

/// Widths below this use the compact layout
pub const COMPACT_BREAKPOINT: u32 = 768;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

impl WindowSize {
    pub fn is_compact(&self) -> bool {
        self.width < COMPACT_BREAKPOINT
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShellState {
    pub running: bool,
    pub started_at: Option<String>,
    pub stopped_at: Option<String>,
    pub window_size: Option<WindowSize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowSizeChange {
    window_size: WindowSize,
}

fn lifecycle_timestamp(envelope: &EventEnvelope) -> Option<String> {
    envelope
        .data
        .get("timestamp")
        .and_then(|ts| ts.as_str())
        .map(str::to_string)
}

pub struct PageShell {
    code: String,
    sender: ComponentSender,
    state: RwLock<ShellState>,
    router: EventRouter<PageShell>,
}

impl PageShell {
    pub fn new(code: impl Into<String>, mediator: SharedMediator) -> Self {
        let code = code.into();
        let router = EventRouter::new()
            .on(system::CHANNEL, system::START, |shell: &PageShell, env| {
                shell.on_start(env);
                Ok(())
            })
            .on(system::CHANNEL, system::STOP, |shell: &PageShell, env| {
                shell.on_stop(env);
                Ok(())
            })
            .on(ui::CHANNEL, ui::WINDOW_SIZE_CHANGE, |shell: &PageShell, env| {
                shell.on_window_size_change(env)
            });

        Self {
            sender: ComponentSender::new(mediator, ComponentKey::new(NAME, &code)),
            code,
            state: RwLock::new(ShellState::default()),
            router,
        }
    }

    pub fn state(&self) -> ShellState {
        self.state.read().clone()
    }

    fn on_start(&self, envelope: &EventEnvelope) {
        let mut state = self.state.write();
        state.running = true;
        state.started_at = lifecycle_timestamp(envelope);
        state.stopped_at = None;
        info!(started_at = ?state.started_at, "[PageShell] Application started");
    }

    fn on_stop(&self, envelope: &EventEnvelope) {
        let mut state = self.state.write();
        state.running = false;
        state.stopped_at = lifecycle_timestamp(envelope);
        info!(stopped_at = ?state.stopped_at, "[PageShell] Application stopped");
    }

    fn on_window_size_change(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let change: WindowSizeChange = serde_json::from_value(envelope.data.clone())?;
        let size = change.window_size;

        let previous = self.state.write().window_size.replace(size);
        if previous != Some(size) {
            self.sender.publish(
                events::CHANNEL,
                events::LAYOUT_CHANGED,
                json!({
                    "width": size.width,
                    "height": size.height,
                    "compact": size.is_compact(),
                }),
            );
        }
        Ok(())
    }
}

impl Component for PageShell {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn description(&self) -> &str {
        "Application frame: lifecycle and layout"
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec::new()
            .with_event(
                system::CHANNEL,
                EventDescriptor::new(system::START)
                    .with_description("Application started")
                    .with_data_format(json!({ "timestamp": "ISO-8601" })),
            )
            .with_event(
                system::CHANNEL,
                EventDescriptor::new(system::STOP)
                    .with_description("Application stopping")
                    .with_data_format(json!({ "timestamp": "ISO-8601" })),
            )
            .with_event(
                ui::CHANNEL,
                EventDescriptor::new(ui::WINDOW_SIZE_CHANGE)
                    .with_description("Host window resized")
                    .with_data_format(json!({ "windowSize": { "width": "number", "height": "number" } })),
            )
    }

    fn publication_spec(&self) -> PublicationSpec {
        PublicationSpec::new()
            .with_publication(
                PublicationDescriptor::new(events::CHANNEL, events::READY)
                    .with_condition("shell registered with the mediator")
                    .with_data_format(json!({ "code": "string" })),
            )
            .with_publication(
                PublicationDescriptor::new(events::CHANNEL, events::LAYOUT_CHANGED)
                    .with_condition("window size changed")
                    .with_data_format(json!({ "width": "number", "height": "number", "compact": "boolean" }))
                    .with_example_data(json!({ "width": 1280, "height": 720, "compact": false })),
            )
    }

    fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        self.router.route(self, envelope)
    }

    fn initialize(&self) -> anyhow::Result<()> {
        self.sender
            .publish(events::CHANNEL, events::READY, json!({ "code": self.code }));
        Ok(())
    }
}
