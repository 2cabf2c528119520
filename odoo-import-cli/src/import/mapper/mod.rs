//! Field mapper: rows to mapped records
//!
//! Interprets an [`ImportProfile`] against each row. Mapping is pure: no
//! remote calls happen here, related records stay as names until the
//! upsert engine resolves them.

mod apply;
mod multi;

use std::collections::BTreeMap;

use regex::Regex;

use crate::api::ExternalId;
use crate::import::reader::Row;
use crate::import::types::{
    ExternalIdRule, FieldMapping, ImportProfile, MappedRecord, RelationCommand, RelationField,
    RelationMapping, Value,
};

pub use apply::apply_transform;
pub use multi::{CompiledSubstitution, collect_values};

/// A profile that cannot be used for mapping
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileError {
    InvalidPattern { pattern: String, message: String },
    /// A natural key names a field the profile never writes
    UnknownKeyField { field: String },
}

impl std::fmt::Display for ProfileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileError::InvalidPattern { pattern, message } => {
                write!(f, "invalid substitution pattern '{}': {}", pattern, message)
            }
            ProfileError::UnknownKeyField { field } => {
                write!(f, "natural key field '{}' is not mapped by the profile", field)
            }
        }
    }
}

impl std::error::Error for ProfileError {}

/// Why a row was not sent to the upsert engine
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Mandatory columns that were missing or blank
    MissingField(Vec<String>),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingField(columns) => {
                write!(f, "missing required field(s): {}", columns.join(", "))
            }
        }
    }
}

/// Result of mapping one row
#[derive(Debug, Clone, PartialEq)]
pub enum MapOutcome {
    Mapped(MappedRecord),
    Skip(SkipReason),
}

/// Maps rows according to one profile
pub struct FieldMapper {
    profile: ImportProfile,
    substitutions: Vec<CompiledSubstitution>,
}

impl FieldMapper {
    pub fn new(profile: ImportProfile) -> Result<Self, ProfileError> {
        let substitutions = profile
            .substitutions
            .iter()
            .map(|s| {
                Regex::new(&s.pattern)
                    .map(|pattern| CompiledSubstitution {
                        pattern,
                        replacement: s.replacement.clone(),
                    })
                    .map_err(|e| ProfileError::InvalidPattern {
                        pattern: s.pattern.clone(),
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let targets = profile.target_fields();
        if let Some(field) = profile
            .natural_keys
            .iter()
            .flatten()
            .find(|f| !targets.contains(&f.as_str()))
        {
            return Err(ProfileError::UnknownKeyField {
                field: field.clone(),
            });
        }

        for mapping in &profile.fields {
            log::debug!("{} <- {}", mapping.target_field, mapping.transform.describe());
        }

        Ok(Self {
            profile,
            substitutions,
        })
    }

    pub fn profile(&self) -> &ImportProfile {
        &self.profile
    }

    /// Columns the profile reads that the file's header does not have
    pub fn missing_columns(&self, headers: &[String]) -> Vec<&str> {
        let read = self
            .profile
            .required
            .iter()
            .map(String::as_str)
            .chain(self.profile.fields.iter().filter_map(|m| m.transform.column()));

        let mut missing: Vec<&str> = Vec::new();
        for column in read {
            if !headers.iter().any(|h| h == column) && !missing.contains(&column) {
                missing.push(column);
            }
        }
        missing
    }

    /// Map one row, or say why it must be skipped
    ///
    /// Blank cells leave their target field out of the record rather than
    /// clearing it on the remote side.
    pub fn map(&self, row: &Row) -> MapOutcome {
        let missing: Vec<String> = self
            .profile
            .required
            .iter()
            .filter(|column| row.is_blank(column))
            .cloned()
            .collect();
        if !missing.is_empty() {
            return MapOutcome::Skip(SkipReason::MissingField(missing));
        }

        let display_name = row
            .text(&self.profile.display_column)
            .unwrap_or_else(|| format!("row {}", row.ordinal));

        let mut record = MappedRecord::new(&self.profile.model, display_name);
        record.natural_keys = self.profile.natural_keys.clone();
        record.external_id = self.external_id(row);
        record.fields = map_fields(&self.profile.fields, row);

        for relation in &self.profile.relations {
            if let Some((field, command, deferred)) = self.map_relation(relation, row) {
                match record
                    .relations
                    .iter_mut()
                    .find(|r| r.field == field && r.deferred == deferred)
                {
                    Some(existing) => existing.commands.push(command),
                    None => record.relations.push(RelationField {
                        field: field.to_string(),
                        commands: vec![command],
                        deferred,
                    }),
                }
            }
        }

        MapOutcome::Mapped(record)
    }

    fn external_id(&self, row: &Row) -> Option<ExternalId> {
        match self.profile.external_id.as_ref()? {
            ExternalIdRule::Column { column, namespace } => {
                let raw = row.text(column)?;
                if raw.contains('.') {
                    match ExternalId::parse(&raw) {
                        Ok(xid) => Some(xid),
                        Err(e) => {
                            log::warn!("Row {}: ignoring external id '{}': {}", row.ordinal, raw, e);
                            None
                        }
                    }
                } else if let Some(namespace) = namespace {
                    Some(ExternalId::new(namespace, raw))
                } else {
                    log::warn!(
                        "Row {}: ignoring external id '{}' without a module prefix",
                        row.ordinal,
                        raw
                    );
                    None
                }
            }
            ExternalIdRule::Derived {
                namespace,
                prefix,
                from,
            } => from
                .iter()
                .find_map(|column| row.text(column))
                .map(|source| ExternalId::derived(namespace, prefix, &source)),
        }
    }

    fn map_relation<'r>(
        &self,
        relation: &'r RelationMapping,
        row: &Row,
    ) -> Option<(&'r str, RelationCommand, bool)> {
        match relation {
            RelationMapping::ReplaceAll {
                field,
                column,
                lookup,
                separator,
            } => {
                let names = collect_values(row, column, separator, &self.substitutions);
                (!names.is_empty()).then(|| {
                    (
                        field.as_str(),
                        RelationCommand::ReplaceAll {
                            lookup: lookup.clone(),
                            names,
                        },
                        false,
                    )
                })
            }
            RelationMapping::CreateAndAppend {
                field,
                when_present,
                values,
            } => (!row.is_blank(when_present)).then(|| {
                (
                    field.as_str(),
                    RelationCommand::CreateAndAppend {
                        values: map_fields(values, row),
                    },
                    false,
                )
            }),
            RelationMapping::Link {
                field,
                column,
                lookup,
                deferred,
            } => row.text(column).map(|name| {
                (
                    field.as_str(),
                    RelationCommand::Link {
                        lookup: lookup.clone(),
                        name,
                    },
                    *deferred,
                )
            }),
        }
    }
}

fn map_fields(mappings: &[FieldMapping], row: &Row) -> BTreeMap<String, Value> {
    mappings
        .iter()
        .map(|m| (m.target_field.clone(), apply_transform(&m.transform, row)))
        .filter(|(_, value)| !value.is_null())
        .collect()
}
