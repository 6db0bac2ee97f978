//! Conventional channels every host is expected to publish
//!
//! The mediator gives these no special treatment; they are ordinary
//! (channel, event) pairs. Payload helpers keep senders consistent.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// Application lifecycle
pub mod system {
    use super::*;

    pub const CHANNEL: &str = "system";
    pub const START: &str = "start";
    pub const STOP: &str = "stop";

    /// `{ "timestamp": "<ISO-8601>" }`
    pub fn lifecycle_payload(at: DateTime<Utc>) -> Value {
        json!({ "timestamp": at.to_rfc3339_opts(SecondsFormat::Millis, true) })
    }
}

/// Host user interface
pub mod ui {
    use super::*;

    pub const CHANNEL: &str = "ui";
    pub const WINDOW_SIZE_CHANGE: &str = "windowSizeChange";

    /// `{ "windowSize": { "width": .., "height": .. } }`
    pub fn window_size_payload(width: u32, height: u32) -> Value {
        json!({ "windowSize": { "width": width, "height": height } })
    }
}

/// Milliseconds since epoch, for the sender-supplied publish timestamp
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
