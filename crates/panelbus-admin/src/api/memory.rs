//! In-memory administration backend
//!
//! Process-local stand-in for the REST backend, used by the shell binary and
//! tests. Records of each kind keep their creation order.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use super::{AdminApi, ApiError, ApiResult, Record, ResourceKind, Session};

#[derive(Default)]
pub struct InMemoryAdminApi {
    accounts: RwLock<HashMap<String, String>>,
    sessions: RwLock<HashMap<String, String>>,
    records: RwLock<HashMap<ResourceKind, Vec<Record>>>,
}

impl InMemoryAdminApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account that `login` accepts
    pub fn with_account(self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.accounts.write().insert(username.into(), password.into());
        self
    }

    /// Seed a record; an `id` is assigned when missing
    pub fn with_record(self, kind: ResourceKind, mut record: Record) -> Self {
        ensure_id(&mut record);
        self.records.write().entry(kind).or_default().push(record);
        self
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn count(&self, kind: ResourceKind) -> usize {
        self.records.read().get(&kind).map(Vec::len).unwrap_or(0)
    }
}

fn ensure_id(record: &mut Record) -> String {
    match record.get("id").and_then(Value::as_str) {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => {
            let id = Uuid::new_v4().to_string();
            record.insert("id".to_string(), Value::String(id.clone()));
            id
        }
    }
}

fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

fn record_name(record: &Record) -> Option<&str> {
    record
        .get("name")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
}

#[async_trait]
impl AdminApi for InMemoryAdminApi {
    async fn login(&self, username: &str, password: &str) -> ApiResult<Session> {
        let accepted = self
            .accounts
            .read()
            .get(username)
            .map(|expected| expected == password)
            .unwrap_or(false);
        if !accepted {
            return Err(ApiError::Unauthorized);
        }

        let session = Session {
            username: username.to_string(),
            token: Uuid::new_v4().to_string(),
            issued_at: Utc::now(),
        };
        self.sessions
            .write()
            .insert(session.token.clone(), session.username.clone());
        debug!(username, "[InMemoryAdminApi] Session issued");
        Ok(session)
    }

    async fn logout(&self, token: &str) -> ApiResult<()> {
        match self.sessions.write().remove(token) {
            Some(_) => Ok(()),
            None => Err(ApiError::Unauthorized),
        }
    }

    async fn list(&self, kind: ResourceKind) -> ApiResult<Vec<Record>> {
        Ok(self.records.read().get(&kind).cloned().unwrap_or_default())
    }

    async fn create(&self, kind: ResourceKind, mut record: Record) -> ApiResult<Record> {
        let name = record_name(&record)
            .ok_or_else(|| ApiError::InvalidInput("`name` is required".to_string()))?
            .to_string();

        let mut records = self.records.write();
        let existing = records.entry(kind).or_default();
        if existing.iter().any(|r| record_name(r) == Some(name.as_str())) {
            return Err(ApiError::Conflict(format!("{kind} named {name} already exists")));
        }

        let id = ensure_id(&mut record);
        if existing.iter().any(|r| record_id(r) == Some(id.as_str())) {
            return Err(ApiError::Conflict(format!("{kind} {id} already exists")));
        }
        existing.push(record.clone());
        Ok(record)
    }

    async fn update(&self, kind: ResourceKind, id: &str, record: Record) -> ApiResult<Record> {
        let mut records = self.records.write();
        let existing = records
            .get_mut(&kind)
            .and_then(|list| list.iter_mut().find(|r| record_id(r) == Some(id)))
            .ok_or_else(|| ApiError::NotFound {
                kind,
                id: id.to_string(),
            })?;

        for (field, value) in record {
            if field != "id" {
                existing.insert(field, value);
            }
        }
        Ok(existing.clone())
    }

    async fn delete(&self, kind: ResourceKind, id: &str) -> ApiResult<()> {
        let mut records = self.records.write();
        let list = records.entry(kind).or_default();
        let before = list.len();
        list.retain(|r| record_id(r) != Some(id));
        if list.len() == before {
            return Err(ApiError::NotFound {
                kind,
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
