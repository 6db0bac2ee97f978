//! Scripted publish sessions
//!
//! A script is a JSON array of steps:
//!
//! ```json
//! [
//!   { "channel": "authen", "event": "loginRequested",
//!     "data": { "username": "admin", "password": "admin" } },
//!   { "channel": "role", "event": "listRequested", "settleMs": 100 }
//! ]
//! ```
//!
//! `data` defaults to `{}`. `publisher` defaults to `Script#script1`.

use std::path::Path;

use anyhow::Context;
use panelbus_core::ComponentKey;
use serde::Deserialize;
use serde_json::{json, Value};

/// How long to wait after a step for spawned backend work to report back
pub const DEFAULT_SETTLE_MS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    pub channel: String,
    pub event: String,
    #[serde(default = "empty_object")]
    pub data: Value,
    #[serde(default)]
    pub publisher: Option<ComponentKey>,
    #[serde(default)]
    pub settle_ms: Option<u64>,
}

fn empty_object() -> Value {
    json!({})
}

impl ScriptStep {
    pub fn publisher(&self) -> ComponentKey {
        self.publisher
            .clone()
            .unwrap_or_else(|| ComponentKey::new("Script", "script1"))
    }

    pub fn settle_ms(&self) -> u64 {
        self.settle_ms.unwrap_or(DEFAULT_SETTLE_MS)
    }
}

pub fn parse(source: &str) -> anyhow::Result<Vec<ScriptStep>> {
    let steps: Vec<ScriptStep> = serde_json::from_str(source)?;
    if let Some(index) = steps
        .iter()
        .position(|s| s.channel.is_empty() || s.event.is_empty())
    {
        anyhow::bail!("step {index}: channel and event must be non-empty");
    }
    Ok(steps)
}

pub fn load(path: &Path) -> anyhow::Result<Vec<ScriptStep>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    parse(&source).with_context(|| format!("Invalid script {}", path.display()))
}

/// Session replayed when no script is given
pub fn demo() -> Vec<ScriptStep> {
    let step = |channel: &str, event: &str, data: Value| ScriptStep {
        channel: channel.to_string(),
        event: event.to_string(),
        data,
        publisher: None,
        settle_ms: None,
    };

    vec![
        step("ui", "windowSizeChange", json!({ "windowSize": { "width": 1280, "height": 720 } })),
        step("authen", "loginRequested", json!({ "username": "admin", "password": "admin" })),
        step("role", "createRequested", json!({ "record": { "name": "auditor" } })),
        step("role", "listRequested", json!({})),
        step("user", "deleteRequested", json!({ "id": "missing" })),
        step("authen", "logoutRequested", json!({})),
    ]
}
