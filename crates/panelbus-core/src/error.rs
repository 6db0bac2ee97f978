//! Mediator error taxonomy
//!
//! Registration errors are returned to the caller and abort the registration.
//! Dispatch problems never reach the publisher: they are logged and recorded
//! in the [`DispatchReport`](crate::DispatchReport) as
//! [`SubscriberHandlerError`] or [`UnhandledEventWarning`] values.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which input of a merge was invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecSide {
    Base,
    Extension,
}

impl fmt::Display for SpecSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecSide::Base => f.write_str("base"),
            SpecSide::Extension => f.write_str("extension"),
        }
    }
}

/// Structurally invalid specification handed to the merger
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("malformed {side} spec: invalid field `{field}`")]
    Malformed { side: SpecSide, field: String },
}

impl SpecError {
    pub(crate) fn malformed(side: SpecSide, field: impl Into<String>) -> Self {
        SpecError::Malformed {
            side,
            field: field.into(),
        }
    }
}

/// Errors returned by registry and mediator operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediatorError {
    #[error("component {name}#{code} is already registered")]
    DuplicateComponent { name: String, code: String },

    #[error(transparent)]
    MalformedSpec(#[from] SpecError),

    #[error("component {name}#{code} failed to initialize: {reason}")]
    InitializeFailed {
        name: String,
        code: String,
        reason: String,
    },

    #[error("mediator has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, MediatorError>;

/// A subscriber's `handle_event` returned an error or panicked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("subscriber {name}#{code} failed on ({channel}, {event}): {reason}")]
pub struct SubscriberHandlerError {
    pub name: String,
    pub code: String,
    pub channel: String,
    pub event: String,
    pub reason: String,
}

/// A subscriber declared (channel, event) but has no local handler wired
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("subscriber {name}#{code} has no handler for ({channel}, {event})")]
pub struct UnhandledEventWarning {
    pub name: String,
    pub code: String,
    pub channel: String,
    pub event: String,
}
