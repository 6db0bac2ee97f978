//! PanelBus administration feature layer
//!
//! Thin components over the [`panelbus_core`] mediator:
//! - `api`: the [`AdminApi`] backend boundary and an in-memory backend
//! - `components`: authentication, per-kind resource CRUD, page shell
//! - `catalog`: builds and attaches the standard component set

pub mod api;
pub mod catalog;
pub mod components;

pub use api::{AdminApi, ApiError, ApiResult, InMemoryAdminApi, Record, ResourceKind, Session};
pub use catalog::{AdminComponents, AdminComponentsBuilder};
pub use components::{
    AuthComponent, ComponentSender, PageShell, ResourceComponent, ResourceOperation, ShellState,
    WindowSize,
};
