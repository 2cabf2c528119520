//! Dry-run wrapper
//!
//! Forwards every read to the wrapped client and replaces every mutation
//! with a log line, so a dry run performs all resolution and mapping work
//! without changing the remote system.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use log::info;

use super::client::{FieldInfo, RecordClient, RecordId, RecordValues, RemoteCallError};
use super::domain::Domain;
use super::external_id::ExternalId;
use super::operation::Mutation;

/// Id returned for records a dry run pretends to create; never a real record id
pub const DRY_RUN_PLACEHOLDER_ID: RecordId = 0;

pub struct DryRunClient<C> {
    inner: C,
    suppressed: Mutex<Vec<Mutation>>,
}

impl<C: RecordClient> DryRunClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            suppressed: Mutex::new(Vec::new()),
        }
    }

    /// Mutations that would have been sent, in order
    pub fn suppressed(&self) -> Vec<Mutation> {
        self.suppressed
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> C {
        self.inner
    }

    fn record(&self, mutation: Mutation) {
        info!("[DRY RUN] Would {}", mutation.describe());
        if let Ok(mut suppressed) = self.suppressed.lock() {
            suppressed.push(mutation);
        }
    }
}

#[async_trait]
impl<C: RecordClient> RecordClient for DryRunClient<C> {
    async fn search(
        &self,
        model: &str,
        domain: &Domain,
        limit: Option<usize>,
    ) -> Result<Vec<RecordId>, RemoteCallError> {
        self.inner.search(model, domain, limit).await
    }

    async fn read(
        &self,
        model: &str,
        ids: &[RecordId],
        fields: &[&str],
    ) -> Result<Vec<RecordValues>, RemoteCallError> {
        // placeholder ids only exist in this run's imagination
        let real: Vec<RecordId> = ids
            .iter()
            .copied()
            .filter(|id| *id != DRY_RUN_PLACEHOLDER_ID)
            .collect();
        self.inner.read(model, &real, fields).await
    }

    async fn create(&self, model: &str, values: &RecordValues) -> Result<RecordId, RemoteCallError> {
        self.record(Mutation::create(model, values.clone()));
        Ok(DRY_RUN_PLACEHOLDER_ID)
    }

    async fn write(
        &self,
        model: &str,
        ids: &[RecordId],
        values: &RecordValues,
    ) -> Result<bool, RemoteCallError> {
        self.record(Mutation::write(model, ids, values.clone()));
        Ok(true)
    }

    async fn fields_get(&self, model: &str) -> Result<BTreeMap<String, FieldInfo>, RemoteCallError> {
        self.inner.fields_get(model).await
    }

    async fn search_count(&self, model: &str, domain: &Domain) -> Result<usize, RemoteCallError> {
        self.inner.search_count(model, domain).await
    }

    async fn resolve_external_id(&self, xid: &ExternalId) -> Result<Option<RecordId>, RemoteCallError> {
        self.inner.resolve_external_id(xid).await
    }

    async fn assign_external_id(
        &self,
        id: RecordId,
        model: &str,
        xid: &ExternalId,
    ) -> Result<bool, RemoteCallError> {
        if self.inner.resolve_external_id(xid).await?.is_some() {
            return Ok(false);
        }
        self.record(Mutation::AssignExternalId {
            model: model.to_string(),
            id,
            external_id: xid.clone(),
        });
        Ok(true)
    }
}
