//! Resource administration component
//!
//! One instance per [`ResourceKind`]; the kind's channel carries both the
//! requests and the results.

use std::future::Future;
use std::sync::Arc;

use panelbus_core::{
    Component, ComponentKey, EventDescriptor, EventEnvelope, EventRouter, HandleOutcome,
    PublicationDescriptor, PublicationSpec, SharedMediator, SubscriptionSpec,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{spawn_request, ComponentSender};
use crate::api::{AdminApi, ApiResult, Record, ResourceKind};

/// Published when any operation fails
pub const FAILED: &str = "failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceOperation {
    List,
    Create,
    Update,
    Delete,
}

impl ResourceOperation {
    pub const ALL: [ResourceOperation; 4] = [
        ResourceOperation::List,
        ResourceOperation::Create,
        ResourceOperation::Update,
        ResourceOperation::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// Event a client publishes to ask for the operation
    pub fn request_event(&self) -> &'static str {
        match self {
            Self::List => "listRequested",
            Self::Create => "createRequested",
            Self::Update => "updateRequested",
            Self::Delete => "deleteRequested",
        }
    }

    /// Event the component publishes when the operation succeeds
    pub fn result_event(&self) -> &'static str {
        match self {
            Self::List => "listed",
            Self::Create => "created",
            Self::Update => "updated",
            Self::Delete => "deleted",
        }
    }

    fn request_format(&self) -> Value {
        match self {
            Self::List => json!({}),
            Self::Create => json!({ "record": "object" }),
            Self::Update => json!({ "id": "string", "record": "object" }),
            Self::Delete => json!({ "id": "string" }),
        }
    }

    fn result_format(&self) -> Value {
        match self {
            Self::List => json!({ "records": "object[]" }),
            Self::Create | Self::Update => json!({ "record": "object" }),
            Self::Delete => json!({ "id": "string" }),
        }
    }
}

impl std::fmt::Display for ResourceOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    record: Record,
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    id: String,
    record: Record,
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    id: String,
}

/// Successful backend result, applied to the local cache then published
enum Completed {
    Listed(Vec<Record>),
    Created(Record),
    Updated(Record),
    Deleted(String),
}

impl Completed {
    fn apply(&self, cache: &mut Vec<Record>) {
        match self {
            Self::Listed(records) => *cache = records.clone(),
            Self::Created(record) => cache.push(record.clone()),
            Self::Updated(record) => {
                let id = record.get("id");
                match cache.iter_mut().find(|r| r.get("id") == id) {
                    Some(slot) => *slot = record.clone(),
                    None => cache.push(record.clone()),
                }
            }
            Self::Deleted(id) => cache.retain(|r| r.get("id").and_then(Value::as_str) != Some(id)),
        }
    }

    fn into_payload(self) -> Value {
        match self {
            Self::Listed(records) => json!({ "records": records }),
            Self::Created(record) | Self::Updated(record) => json!({ "record": record }),
            Self::Deleted(id) => json!({ "id": id }),
        }
    }
}

pub struct ResourceComponent {
    kind: ResourceKind,
    code: String,
    sender: ComponentSender,
    api: Arc<dyn AdminApi>,
    records: Arc<RwLock<Vec<Record>>>,
    router: EventRouter<ResourceComponent>,
}

impl ResourceComponent {
    pub fn new(
        kind: ResourceKind,
        code: impl Into<String>,
        mediator: SharedMediator,
        api: Arc<dyn AdminApi>,
    ) -> Self {
        let code = code.into();
        let channel = kind.channel();
        let router = EventRouter::new()
            .on(channel, ResourceOperation::List.request_event(), |c: &Self, _| c.list())
            .on(channel, ResourceOperation::Create.request_event(), |c: &Self, env| c.create(env))
            .on(channel, ResourceOperation::Update.request_event(), |c: &Self, env| c.update(env))
            .on(channel, ResourceOperation::Delete.request_event(), |c: &Self, env| c.delete(env));

        Self {
            kind,
            sender: ComponentSender::new(mediator, ComponentKey::new(kind.component_name(), &code)),
            code,
            api,
            records: Arc::new(RwLock::new(Vec::new())),
            router,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Records as of the last successful result
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    fn list(&self) -> anyhow::Result<()> {
        self.run(ResourceOperation::List, |api, kind| async move {
            api.list(kind).await.map(Completed::Listed)
        })
    }

    fn create(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let request: CreateRequest = serde_json::from_value(envelope.data.clone())?;
        self.run(ResourceOperation::Create, move |api, kind| async move {
            api.create(kind, request.record).await.map(Completed::Created)
        })
    }

    fn update(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let request: UpdateRequest = serde_json::from_value(envelope.data.clone())?;
        self.run(ResourceOperation::Update, move |api, kind| async move {
            api.update(kind, &request.id, request.record)
                .await
                .map(Completed::Updated)
        })
    }

    fn delete(&self, envelope: &EventEnvelope) -> anyhow::Result<()> {
        let request: DeleteRequest = serde_json::from_value(envelope.data.clone())?;
        self.run(ResourceOperation::Delete, move |api, kind| async move {
            api.delete(kind, &request.id)
                .await
                .map(|()| Completed::Deleted(request.id))
        })
    }

    /// Spawn the backend call and publish its outcome
    fn run<F, Fut>(&self, operation: ResourceOperation, call: F) -> anyhow::Result<()>
    where
        F: FnOnce(Arc<dyn AdminApi>, ResourceKind) -> Fut,
        Fut: Future<Output = ApiResult<Completed>> + Send + 'static,
    {
        let kind = self.kind;
        let sender = self.sender.clone();
        let records = self.records.clone();
        let pending = call(self.api.clone(), kind);

        let spawned = spawn_request(async move {
            match pending.await {
                Ok(completed) => {
                    completed.apply(&mut records.write());
                    debug!(%kind, %operation, "[ResourceComponent] Operation completed");
                    sender.publish(kind.channel(), operation.result_event(), completed.into_payload());
                }
                Err(e) => {
                    warn!(%kind, %operation, error = %e, "[ResourceComponent] Operation failed");
                    publish_failure(&sender, kind, operation, &e.to_string());
                }
            }
        });

        if let Err(e) = spawned {
            publish_failure(&self.sender, kind, operation, &e.to_string());
        }
        Ok(())
    }
}

fn publish_failure(
    sender: &ComponentSender,
    kind: ResourceKind,
    operation: ResourceOperation,
    reason: &str,
) {
    sender.publish(
        kind.channel(),
        FAILED,
        json!({ "operation": operation, "reason": reason }),
    );
}

impl Component for ResourceComponent {
    fn name(&self) -> &str {
        self.kind.component_name()
    }

    fn code(&self) -> &str {
        &self.code
    }

    fn description(&self) -> &str {
        "Lists, creates, updates and deletes administration records"
    }

    fn subscription_spec(&self) -> SubscriptionSpec {
        ResourceOperation::ALL
            .iter()
            .fold(SubscriptionSpec::new(), |spec, operation| {
                spec.with_event(
                    self.kind.channel(),
                    EventDescriptor::new(operation.request_event())
                        .with_description(format!("{operation} {} records", self.kind))
                        .with_data_format(operation.request_format()),
                )
            })
    }

    fn publication_spec(&self) -> PublicationSpec {
        let channel = self.kind.channel();
        ResourceOperation::ALL
            .iter()
            .fold(PublicationSpec::new(), |spec, operation| {
                spec.with_publication(
                    PublicationDescriptor::new(channel, operation.result_event())
                        .with_condition(format!("{operation} succeeded"))
                        .with_data_format(operation.result_format()),
                )
            })
            .with_publication(
                PublicationDescriptor::new(channel, FAILED)
                    .with_condition("backend rejected the request or was unreachable")
                    .with_data_format(json!({ "operation": "string", "reason": "string" }))
                    .with_example_data(json!({ "operation": "delete", "reason": "not found" })),
            )
    }

    fn handle_event(&self, envelope: &EventEnvelope) -> anyhow::Result<HandleOutcome> {
        self.router.route(self, envelope)
    }
}
