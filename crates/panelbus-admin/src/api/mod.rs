//! Administration backend boundary
//!
//! Feature components never talk HTTP themselves; they call an [`AdminApi`].
//! A REST client is one implementation, [`InMemoryAdminApi`] is another.
//! Records are plain JSON objects carrying a string `id`.

mod memory;

pub use memory::InMemoryAdminApi;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// A backend record (role, user, ...) as a JSON object
pub type Record = Map<String, Value>;

/// Result type for backend operations
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{kind} {id} not found")]
    NotFound { kind: ResourceKind, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Administrable resource families, one channel each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKind {
    Role,
    Permission,
    User,
    UiItem,
    UiPermission,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Role,
        ResourceKind::Permission,
        ResourceKind::User,
        ResourceKind::UiItem,
        ResourceKind::UiPermission,
    ];

    /// Channel the kind's component listens and publishes on
    pub fn channel(&self) -> &'static str {
        match self {
            Self::Role => "role",
            Self::Permission => "permission",
            Self::User => "user",
            Self::UiItem => "uiItem",
            Self::UiPermission => "uiPermission",
        }
    }

    /// Component name of the kind's administration component
    pub fn component_name(&self) -> &'static str {
        match self {
            Self::Role => "RoleAdmin",
            Self::Permission => "PermissionAdmin",
            Self::User => "UserAdmin",
            Self::UiItem => "UiItemAdmin",
            Self::UiPermission => "UiPermissionAdmin",
        }
    }

    pub fn from_channel(channel: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.channel() == channel)
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.channel())
    }
}

/// Authenticated session returned by `login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

/// Backend operations used by the feature components
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// Exchange credentials for a session
    async fn login(&self, username: &str, password: &str) -> ApiResult<Session>;

    /// Invalidate a session token
    async fn logout(&self, token: &str) -> ApiResult<()>;

    /// All records of a kind, in creation order
    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Record>>;

    /// Create a record; the backend assigns `id` when absent
    async fn create(&self, kind: ResourceKind, record: Record) -> ApiResult<Record>;

    /// Patch the fields of an existing record
    async fn update(&self, kind: ResourceKind, id: &str, record: Record) -> ApiResult<Record>;

    /// Delete a record
    async fn delete(&self, kind: ResourceKind, id: &str) -> ApiResult<()>;
}
