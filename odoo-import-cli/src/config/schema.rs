//! Versioned description of the target fields the importer writes
//!
//! Checked twice before any row is read: statically against the selected
//! profile, then against the live system with one `fields_get` per model.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::api::{RecordClient, RemoteCallError};
use crate::import::types::ImportProfile;

pub const SUPPORTED_VERSION: u32 = 1;

const BUILTIN_SCHEMA: &str = include_str!("schema.toml");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schema {
    pub version: u32,
    #[serde(default)]
    pub models: BTreeMap<String, ModelSchema>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ModelSchema {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSpec {
    /// Platform field type as reported by `fields_get`
    #[serde(rename = "type")]
    pub field_type: String,
    /// May be absent from the live system
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SchemaError {
    Parse(String),
    UnsupportedVersion(u32),
    UndeclaredModel(String),
    UndeclaredField {
        model: String,
        field: String,
    },
    /// A required field does not exist on the live system
    MissingField {
        model: String,
        field: String,
    },
    TypeMismatch {
        model: String,
        field: String,
        declared: String,
        actual: String,
    },
    Remote(RemoteCallError),
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Parse(message) => write!(f, "invalid schema: {}", message),
            SchemaError::UnsupportedVersion(v) => write!(
                f,
                "schema version {} is not supported (expected {})",
                v, SUPPORTED_VERSION
            ),
            SchemaError::UndeclaredModel(model) => {
                write!(f, "model '{}' is not declared in the schema", model)
            }
            SchemaError::UndeclaredField { model, field } => {
                write!(f, "field '{}.{}' is not declared in the schema", model, field)
            }
            SchemaError::MissingField { model, field } => {
                write!(f, "required field '{}.{}' does not exist on the server", model, field)
            }
            SchemaError::TypeMismatch {
                model,
                field,
                declared,
                actual,
            } => write!(
                f,
                "field '{}.{}' is declared as {} but the server reports {}",
                model, field, declared, actual
            ),
            SchemaError::Remote(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SchemaError {}

impl From<RemoteCallError> for SchemaError {
    fn from(e: RemoteCallError) -> Self {
        SchemaError::Remote(e)
    }
}

/// Result of checking one model against the live system
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaReport {
    pub model: String,
    /// Optional fields the server does not have; never sent
    pub unavailable: Vec<String>,
}

impl Schema {
    /// Schema compiled into the binary
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_toml(BUILTIN_SCHEMA)
    }

    pub fn from_toml(text: &str) -> Result<Self, SchemaError> {
        let schema: Schema = toml::from_str(text).map_err(|e| SchemaError::Parse(e.to_string()))?;
        if schema.version != SUPPORTED_VERSION {
            return Err(SchemaError::UnsupportedVersion(schema.version));
        }
        Ok(schema)
    }

    /// Every field the profile writes must be declared for its model
    pub fn check_profile(&self, profile: &ImportProfile) -> Result<(), SchemaError> {
        let model = self
            .models
            .get(&profile.model)
            .ok_or_else(|| SchemaError::UndeclaredModel(profile.model.clone()))?;

        for field in profile.target_fields() {
            if !model.fields.contains_key(field) {
                return Err(SchemaError::UndeclaredField {
                    model: profile.model.clone(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Compare the profile's fields with what the server reports
    pub async fn validate<C: RecordClient + ?Sized>(
        &self,
        client: &C,
        profile: &ImportProfile,
    ) -> Result<SchemaReport, SchemaError> {
        self.check_profile(profile)?;
        let declared = &self.models[&profile.model].fields;
        let live = client.fields_get(&profile.model).await?;

        let mut report = SchemaReport {
            model: profile.model.clone(),
            unavailable: Vec::new(),
        };

        for field in profile.target_fields() {
            let spec = &declared[field];
            match live.get(field) {
                Some(info) if info.field_type != spec.field_type => {
                    return Err(SchemaError::TypeMismatch {
                        model: profile.model.clone(),
                        field: field.to_string(),
                        declared: spec.field_type.clone(),
                        actual: info.field_type.clone(),
                    });
                }
                Some(_) => {}
                None if spec.optional => {
                    log::warn!(
                        "Field {}.{} does not exist on the server and will not be written",
                        profile.model,
                        field
                    );
                    report.unavailable.push(field.to_string());
                }
                None => {
                    return Err(SchemaError::MissingField {
                        model: profile.model.clone(),
                        field: field.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}
