//! Mutations the importer issues against the platform

use serde::Serialize;

use super::client::{RecordId, RecordValues};
use super::external_id::ExternalId;

/// A single mutating call, used for dry-run reporting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Mutation {
    /// Create a new record
    Create {
        /// Model name (e.g. "product.template")
        model: String,
        values: RecordValues,
    },
    /// Update existing records
    Write {
        model: String,
        ids: Vec<RecordId>,
        values: RecordValues,
    },
    /// Register an external id for a record
    AssignExternalId {
        model: String,
        id: RecordId,
        external_id: ExternalId,
    },
}

impl Mutation {
    pub fn create(model: impl Into<String>, values: RecordValues) -> Self {
        Self::Create {
            model: model.into(),
            values,
        }
    }

    pub fn write(model: impl Into<String>, ids: &[RecordId], values: RecordValues) -> Self {
        Self::Write {
            model: model.into(),
            ids: ids.to_vec(),
            values,
        }
    }

    /// One-line description for logs
    pub fn describe(&self) -> String {
        match self {
            Self::Create { model, values } => format!(
                "CREATE {} with {}",
                model,
                serde_json::Value::Object(values.clone())
            ),
            Self::Write { model, ids, values } => {
                let fields: Vec<&str> = values.keys().map(|k| k.as_str()).collect();
                format!("UPDATE {} {:?} fields [{}]", model, ids, fields.join(", "))
            }
            Self::AssignExternalId {
                model,
                id,
                external_id,
            } => format!("LINK {} ({}) to external id {}", model, id, external_id),
        }
    }
}
