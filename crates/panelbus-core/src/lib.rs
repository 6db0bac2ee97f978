//! # PanelBus Core
//!
//! The in-process mediator every PanelBus component talks through.
//!
//! ## Modules
//!
//! - `schema` - Subscription / publication declarations, envelope, keys
//! - `merge` - Folding an extension spec into a base spec
//! - `component` - The `Component` contract and registrations
//! - `registry` - Live table of attached components
//! - `mediator` - Publish / dispatch with per-subscriber isolation
//! - `router` - Per-component (channel, event) handler tables
//! - `introspection` - Read-only registry and pub/sub snapshots
//! - `channels` - Conventional `system` / `ui` channels
//! - `config` - Mediator settings
//! - `error` - Error taxonomy

pub mod channels;
pub mod component;
pub mod config;
pub mod error;
pub mod introspection;
pub mod mediator;
pub mod merge;
pub mod registry;
pub mod router;
pub mod schema;

mod guard;

pub use channels::now_millis;
pub use component::{Component, ComponentRegistration, HandleOutcome, SpecExtension};
pub use config::MediatorConfig;
pub use error::{
    MediatorError, Result, SpecError, SpecSide, SubscriberHandlerError, UnhandledEventWarning,
};
pub use introspection::{PubSubRow, PubSubStatus, PublishRecord};
pub use mediator::{DispatchReport, Mediator, SharedMediator};
pub use merge::{
    merge_publication_specs, merge_publication_values, merge_subscription_specs,
    merge_subscription_values,
};
pub use registry::ComponentRegistry;
pub use router::EventRouter;
pub use schema::*;
