//! Authentication component
//!
//! Consumes `authen/loginRequested` and `authen/logoutRequested`, emits
//! `loginSucceeded`, `loginFailed` and `logoutCompleted`.

use std::sync::Arc;

use panelbus_core::{
    Component, ComponentKey, EventDescriptor, EventEnvelope, EventRouter, HandleOutcome,
    PublicationDescriptor, PublicationSpec, SharedMediator, SubscriptionSpec,
};
use parking_lot::RwLock;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use super::{spawn_request, ComponentSender};
use crate::api::{AdminApi, Session};

pub mod events {
    pub const CHANNEL: &str = "authen";
    pub const LOGIN_REQUESTED: &str = "loginRequested";
    pub const LOGOUT_REQUESTED: &str = "logoutRequested";
    pub const LOGIN_SUCCEEDED: &str = "loginSucceeded";
    pub const LOGIN_FAILED: &str = "loginFailed";
    pub const LOGOUT_COMPLETED: &str = "logoutCompleted";
}

const NAME: &str = "Auth";

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    #[serde(default)]
    password: String,
}

pub struct AuthComponent {
    code: String,
    sender: ComponentSender,
    api: Arc<dyn AdminApi>,
    session: Arc<RwLock<Option<Session>>>,
    router: EventRouter<AuthComponent>,
}

impl AuthComponent {
    pub fn new(code: impl Into<String>, mediator: SharedMediator, api: Arc<dyn AdminApi>) -> Self {
        let code = code.into();
        let router = EventRouter::new()
            .on(events::CHANNEL, events::LOGIN_REQUESTED, |auth: &AuthComponent, env| {
                auth.login(env)
            })
            .on(events::CHANNEL, events::LOGOUT_REQUESTED, |auth: &AuthComponent, _| {
                auth.logout()
            });

        Self {
            sender: ComponentSender::new(mediator, ComponentKey::new(NAME, &code)),
            code,
            api,
            session: Arc::new(RwLock::new(None)),
            router,
        }
    }

    /// Currently logged-in session, if any
    pub fn session(&self) -> Option<Session> {
        self.session.read().clone()
    }

    fn login(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let request: LoginRequest = serde_json::from_value(envelope.data.clone())?;
        let username = request.username.clone();

        let api = self.api.clone();
        let sender = self.sender.clone();
        let session = self.session.clone();
        let spawned = spawn_request(async move {
            match api.login(&request.username, &request.password).await {
                Ok(issued) => {
                    info!(username = %issued.username, "[Auth] Login succeeded");
                    let token = issued.token.clone();
                    *session.write() = Some(issued);
                    sender.publish(
                        events::CHANNEL,
                        events::LOGIN_SUCCEEDED,
                        json!({ "username": request.username, "token": token }),
                    );
                }
                Err(e) => {
                    warn!(username = %request.username, error = %e, "[Auth] Login failed");
                    sender.publish(
                        events::CHANNEL,
                        events::LOGIN_FAILED,
                        json!({ "username": request.username, "reason": e.to_string() }),
                    );
                }
            }
        });

        if let Err(e) = spawned {
            self.sender.publish(
                events::CHANNEL,
                events::LOGIN_FAILED,
                json!({ "username": username, "reason": e.to_string() }),
            );
        }
        Ok(())
    }

    fn logout(&self) -> anyhow::Result<()> {
        let taken = self.session.write().take();
        let Some(current) = taken else {
            self.sender.publish(
                events::CHANNEL,
                events::LOGOUT_COMPLETED,
                json!({ "username": null }),
            );
            return Ok(());
        };

        let api = self.api.clone();
        let sender = self.sender.clone();
        let username = current.username.clone();
        let spawned = spawn_request(async move {
            if let Err(e) = api.logout(&current.token).await {
                warn!(username = %current.username, error = %e, "[Auth] Backend logout failed");
            }
            sender.publish(
                events::CHANNEL,
                events::LOGOUT_COMPLETED,
                json!({ "username": current.username }),
            );
        });

        if spawned.is_err() {
            self.sender.publish(
                events::CHANNEL,
                events::LOGOUT_COMPLETED,
                json!({ "username": username }),
            );
        }
        Ok(())
    }
}

impl Component for AuthComponent {
    fn name(&self) -> &str {
        NAME
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn description(&self) -> &str {
        "Logs users in and out against the administration backend"
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        SubscriptionSpec::new()
            .with_event(
                events::CHANNEL,
                EventDescriptor::new(events::LOGIN_REQUESTED)
                    .with_description("User submitted the login form")
                    .with_data_format(json!({ "username": "string", "password": "string" })),
            )
            .with_event(
                events::CHANNEL,
                EventDescriptor::new(events::LOGOUT_REQUESTED)
                    .with_description("User asked to log out"),
            )
    }

    fn publication_spec(&self) -> PublicationSpec {
        PublicationSpec::new()
            .with_publication(
                PublicationDescriptor::new(events::CHANNEL, events::LOGIN_SUCCEEDED)
                    .with_condition("backend accepted the credentials")
                    .with_data_format(json!({ "username": "string", "token": "string" }))
                    .with_example_data(json!({ "username": "admin", "token": "2f1c..." })),
            )
            .with_publication(
                PublicationDescriptor::new(events::CHANNEL, events::LOGIN_FAILED)
                    .with_condition("backend rejected the credentials or was unreachable")
                    .with_data_format(json!({ "username": "string", "reason": "string" })),
            )
            .with_publication(
                PublicationDescriptor::new(events::CHANNEL, events::LOGOUT_COMPLETED)
                    .with_condition("local session cleared")
                    .with_data_format(json!({ "username": "string | null" })),
            )
    }

    fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        self.router.route(self, envelope)
    }

    fn destroy(&self) -> anyhow::Result<()> {
        self.session.write().take();
        Ok(())
    }
}
