//! The record client seam
//!
//! Everything above the transport talks to the platform through
//! [`RecordClient`]: five model operations plus external-id helpers that are
//! expressed in terms of them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{Domain, Filter};
use super::external_id::{ExternalId, REGISTRY_MODEL};

/// Numeric database id of a record
pub type RecordId = i64;

/// Field values of a record, as sent to `create`/`write` or returned by `read`
pub type RecordValues = Map<String, Value>;

/// Failure of a single remote call
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallError {
    pub model: String,
    pub method: String,
    pub message: String,
}

impl RemoteCallError {
    pub fn new(model: impl Into<String>, method: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RemoteCallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{} failed: {}", self.model, self.method, self.message)
    }
}

impl std::error::Error for RemoteCallError {}

/// Field description returned by `fields_get`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    /// Human-readable label
    #[serde(default)]
    pub string: String,
    /// Platform field type (`char`, `float`, `many2one`, ...)
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub required: bool,
    /// Comodel for relational fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

/// Request/response access to platform records
///
/// Calls are awaited one at a time by the importer; implementations do not
/// retry and do not time out.
#[async_trait]
pub trait RecordClient: Send + Sync {
    /// Ids of records matching `domain`, optionally limited
    async fn search(
        &self,
        model: &str,
        domain: &Domain,
        limit: Option<usize>,
    ) -> Result<Vec<RecordId>, RemoteCallError>;

    /// Read `fields` of the given records (`id` is always included)
    async fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        fields: &[&str],
    ) -> Result<Vec<RecordValues>, RemoteCallError>;

    async fn create(&self, model: &str, values: &RecordValues) -> Result<RecordId, RemoteCallError>;

    async fn write(
        &self,
        model: &str,
        ids: &[RecordId],
        values: &RecordValues,
    ) -> Result<bool, RemoteCallError>;

    /// Model introspection
    async fn fields_get(&self, model: &str) -> Result<BTreeMap<String, FieldInfo>, RemoteCallError>;

    async fn search_count(&self, model: &str, domain: &Domain) -> Result<usize, RemoteCallError> {
        Ok(self.search(model, domain, None).await?.len())
    }

    /// Record id an external id points at, if it is registered
    async fn resolve_external_id(&self, xid: &ExternalId) -> Result<Option<RecordId>, RemoteCallError> {
        let ids = self
            .search(REGISTRY_MODEL, &registry_domain(xid), Some(1))
            .await?;
        let Some(entry) = ids.first() else {
            return Ok(None);
        };

        let rows = self.read(REGISTRY_MODEL, &[*entry], &["res_id"]).await?;
        Ok(rows
            .first()
            .and_then(|row| row.get("res_id"))
            .and_then(|v| v.as_i64()))
    }

    /// Register `xid` for a record; returns false when the id was already registered
    ///
    /// An existing registration is left untouched even if it points elsewhere.
    async fn assign_external_id(
        &self,
        id: RecordId,
        model: &str,
        xid: &ExternalId,
    ) -> Result<bool, RemoteCallError> {
        let existing = self
            .search(REGISTRY_MODEL, &registry_domain(xid), Some(1))
            .await?;
        if !existing.is_empty() {
            return Ok(false);
        }

        let mut values = RecordValues::new();
        values.insert("module".into(), Value::String(xid.namespace.clone()));
        values.insert("name".into(), Value::String(xid.name.clone()));
        values.insert("model".into(), Value::String(model.to_string()));
        values.insert("res_id".into(), Value::from(id));
        values.insert("noupdate".into(), Value::Bool(true));
        self.create(REGISTRY_MODEL, &values).await?;
        Ok(true)
    }
}

/// Domain selecting the registry entry of an external id
pub fn registry_domain(xid: &ExternalId) -> Domain {
    Domain::new()
        .with(Filter::eq("module", xid.namespace.as_str()))
        .with(Filter::eq("name", xid.name.as_str()))
}
