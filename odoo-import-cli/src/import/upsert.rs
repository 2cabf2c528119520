//! Upsert engine
//!
//! Resolution order for every record: external id, then natural keys, then
//! create. Related records named in the row are resolved through the
//! run's [`LookupCache`] before any remote search.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use serde_json::json;

use crate::api::{Domain, Filter, RecordClient, RecordId, RecordValues, RemoteCallError};
use crate::import::cache::LookupCache;
use crate::import::types::{LookupTable, MappedRecord, RelationCommand, RelationField, Value};

/// Row-local failure; the run continues with the next row
#[derive(Debug, Clone, PartialEq)]
pub enum RowError {
    Remote(RemoteCallError),
    /// A required related record could not be found
    UnresolvedRelation {
        field: String,
        lookup: String,
        name: String,
    },
    /// A profile references a lookup that is not configured
    UnknownLookup(String),
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowError::Remote(e) => write!(f, "{}", e),
            RowError::UnresolvedRelation {
                field,
                lookup,
                name,
            } => write!(f, "required {} '{}' for {} not found", lookup, name, field),
            RowError::UnknownLookup(name) => write!(f, "lookup '{}' is not configured", name),
        }
    }
}

impl std::error::Error for RowError {}

impl From<RemoteCallError> for RowError {
    fn from(e: RemoteCallError) -> Self {
        RowError::Remote(e)
    }
}

/// An optional related record that could not be found; the relation is omitted
#[derive(Debug, Clone, PartialEq)]
pub struct RelationWarning {
    pub field: String,
    pub lookup: String,
    pub name: String,
}

impl std::fmt::Display for RelationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} '{}' not found, {} left out",
            self.lookup, self.name, self.field
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Created,
    Updated,
}

impl std::fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertAction::Created => write!(f, "Created"),
            UpsertAction::Updated => write!(f, "Updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOutcome {
    pub id: RecordId,
    pub action: UpsertAction,
    /// Relations to write once every row has been upserted
    pub deferred: Vec<RelationField>,
    pub warnings: Vec<RelationWarning>,
}

/// How an existing record was found
enum Match {
    ExternalId(RecordId),
    NaturalKey(RecordId),
}

pub struct UpsertEngine<'a, C: RecordClient + ?Sized> {
    client: &'a C,
    lookups: &'a LookupTable,
    cache: LookupCache,
    /// model -> fields absent from the live system, never sent
    unavailable: HashMap<String, HashSet<String>>,
}

impl<'a, C: RecordClient + ?Sized> UpsertEngine<'a, C> {
    pub fn new(client: &'a C, lookups: &'a LookupTable, cache: LookupCache) -> Self {
        Self {
            client,
            lookups,
            cache,
            unavailable: HashMap::new(),
        }
    }

    /// Fields to drop from every payload for the given model
    pub fn with_unavailable_fields(mut self, model: &str, fields: impl IntoIterator<Item = String>) -> Self {
        self.unavailable
            .entry(model.to_string())
            .or_default()
            .extend(fields);
        self
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Create or update the record, then stamp its external id
    pub async fn upsert(&mut self, mut record: MappedRecord) -> Result<UpsertOutcome, RowError> {
        let deferred = record.take_deferred();
        let mut warnings = Vec::new();

        let mut values = self.resolve_values(&record.fields, None, &mut warnings).await?;
        for relation in &record.relations {
            if let Some(commands) = self.relation_commands(relation, &mut warnings).await? {
                values.insert(relation.field.clone(), commands);
            }
        }
        self.drop_unavailable(&record.model, &mut values);

        let found = self.find_existing(&record, &values).await?;
        let (id, action) = match found {
            Some(Match::ExternalId(id)) | Some(Match::NaturalKey(id)) => {
                self.client.write(&record.model, &[id], &values).await?;
                (id, UpsertAction::Updated)
            }
            None => {
                let id = self.client.create(&record.model, &values).await?;
                (id, UpsertAction::Created)
            }
        };

        if !matches!(found, Some(Match::ExternalId(_))) {
            if let Some(xid) = &record.external_id {
                if !self.client.assign_external_id(id, &record.model, xid).await? {
                    debug!("External id {} already registered", xid);
                }
            }
        }

        Ok(UpsertOutcome {
            id,
            action,
            deferred,
            warnings,
        })
    }

    /// Second pass: write deferred relations of an upserted record
    pub async fn link_deferred(
        &mut self,
        model: &str,
        id: RecordId,
        relations: &[RelationField],
    ) -> Result<Vec<RelationWarning>, RowError> {
        let mut warnings = Vec::new();
        let mut values = RecordValues::new();
        for relation in relations {
            if let Some(commands) = self.relation_commands(relation, &mut warnings).await? {
                values.insert(relation.field.clone(), commands);
            }
        }
        self.drop_unavailable(model, &mut values);

        if !values.is_empty() {
            self.client.write(model, &[id], &values).await?;
            debug!("Linked {} ({}) fields {:?}", model, id, values.keys().collect::<Vec<_>>());
        }
        Ok(warnings)
    }

    /// Id of the record `name` refers to through `lookup`
    ///
    /// Cache first, then each search strategy in order, then create when the
    /// lookup allows it.
    pub async fn resolve(&mut self, lookup: &str, name: &str) -> Result<Option<RecordId>, RowError> {
        if let Some(id) = self.cache.get(lookup, name) {
            return Ok(Some(id));
        }

        let spec = self
            .lookups
            .get(lookup)
            .ok_or_else(|| RowError::UnknownLookup(lookup.to_string()))?;

        for strategy in &spec.strategies {
            let domain = Domain::from(Filter::new(&strategy.field, strategy.operator, name));
            let ids = self.client.search(&spec.model, &domain, Some(1)).await?;
            if let Some(id) = ids.first() {
                self.cache.insert(lookup, name, *id);
                return Ok(Some(*id));
            }
        }

        if !spec.create_missing {
            return Ok(None);
        }

        let mut values: RecordValues = spec
            .create_values
            .iter()
            .filter_map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
            .collect();
        values.insert("name".to_string(), json!(name));
        let id = self.client.create(&spec.model, &values).await?;
        debug!("Created {} '{}' (ID: {})", spec.model, name, id);
        self.cache.insert(lookup, name, id);
        Ok(Some(id))
    }

    /// JSON payload for scalar fields with lookups resolved to ids
    async fn resolve_values(
        &mut self,
        fields: &BTreeMap<String, Value>,
        parent: Option<&str>,
        warnings: &mut Vec<RelationWarning>,
    ) -> Result<RecordValues, RowError> {
        let mut values = RecordValues::new();
        for (field, value) in fields {
            let json = match value {
                Value::Lookup(lookup) => {
                    let label = match parent {
                        Some(parent) => format!("{}.{}", parent, field),
                        None => field.clone(),
                    };
                    match self.resolve(&lookup.lookup, &lookup.name).await? {
                        Some(id) => json!(id),
                        None if lookup.required => {
                            return Err(RowError::UnresolvedRelation {
                                field: label,
                                lookup: lookup.lookup.clone(),
                                name: lookup.name.clone(),
                            });
                        }
                        None => {
                            warnings.push(RelationWarning {
                                field: label,
                                lookup: lookup.lookup.clone(),
                                name: lookup.name.clone(),
                            });
                            continue;
                        }
                    }
                }
                other => match other.to_json() {
                    Some(json) => json,
                    None => continue,
                },
            };
            values.insert(field.clone(), json);
        }
        Ok(values)
    }

    /// Platform command list for one relation field, `None` when nothing resolved
    async fn relation_commands(
        &mut self,
        relation: &RelationField,
        warnings: &mut Vec<RelationWarning>,
    ) -> Result<Option<serde_json::Value>, RowError> {
        let mut commands = Vec::new();

        for command in &relation.commands {
            match command {
                RelationCommand::ReplaceAll { lookup, names } => {
                    let mut ids = Vec::new();
                    for name in names {
                        match self.resolve(lookup, name).await? {
                            Some(id) if !ids.contains(&id) => ids.push(id),
                            Some(_) => {}
                            None => {
                                warnings.push(RelationWarning {
                                    field: relation.field.clone(),
                                    lookup: lookup.clone(),
                                    name: name.clone(),
                                });
                            }
                        }
                    }
                    if !ids.is_empty() {
                        commands.push(json!([6, 0, ids]));
                    }
                }
                RelationCommand::CreateAndAppend { values } => {
                    let child = self
                        .resolve_values(values, Some(relation.field.as_str()), warnings)
                        .await?;
                    commands.push(json!([0, 0, child]));
                }
                RelationCommand::Link { lookup, name } => match self.resolve(lookup, name).await? {
                    Some(id) => commands.push(json!([4, id, 0])),
                    None => {
                        warnings.push(RelationWarning {
                            field: relation.field.clone(),
                            lookup: lookup.clone(),
                            name: name.clone(),
                        });
                    }
                },
            }
        }

        Ok((!commands.is_empty()).then(|| serde_json::Value::Array(commands)))
    }

    async fn find_existing(
        &self,
        record: &MappedRecord,
        values: &RecordValues,
    ) -> Result<Option<Match>, RowError> {
        if let Some(xid) = &record.external_id {
            if let Some(id) = self.client.resolve_external_id(xid).await? {
                debug!("{} matched by external id {} (ID: {})", record.display_name, xid, id);
                return Ok(Some(Match::ExternalId(id)));
            }
        }

        // Only the first key the row fully provides is searched; a miss on it
        // means a new record, never a match on a weaker key.
        let Some(domain) = record
            .natural_keys
            .iter()
            .find_map(|key| key_domain(key, values))
        else {
            return Ok(None);
        };

        let ids = self.client.search(&record.model, &domain, Some(1)).await?;
        Ok(ids.first().map(|id| {
            debug!("{} matched by {} (ID: {})", record.display_name, domain, id);
            Match::NaturalKey(*id)
        }))
    }

    fn drop_unavailable(&self, model: &str, values: &mut RecordValues) {
        if let Some(fields) = self.unavailable.get(model) {
            values.retain(|field, _| !fields.contains(field));
        }
    }
}

/// Equality domain over `key`, `None` unless every field has a value
fn key_domain(key: &[String], values: &RecordValues) -> Option<Domain> {
    if key.is_empty() {
        return None;
    }
    key.iter()
        .map(|field| {
            values
                .get(field)
                .filter(|v| !v.is_null() && *v != &serde_json::Value::Bool(false))
                .map(|v| Filter::eq(field.as_str(), v.clone()))
        })
        .collect::<Option<Vec<Filter>>>()
        .map(|filters| filters.into_iter().collect())
}
