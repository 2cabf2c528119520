//! Mapped records ready for the upsert engine

use std::collections::BTreeMap;

use crate::api::ExternalId;

use super::Value;

/// Change to a one2many/many2many field
#[derive(Debug, Clone, PartialEq)]
pub enum RelationCommand {
    /// Replace the whole set with the named records (`[6, 0, ids]`)
    ReplaceAll { lookup: String, names: Vec<String> },
    /// Create a new child line and attach it (`[0, 0, values]`)
    ///
    /// Not idempotent: every run appends another line.
    CreateAndAppend { values: BTreeMap<String, Value> },
    /// Attach one existing record found by name (`[4, id, 0]`)
    Link { lookup: String, name: String },
}

/// Commands for one relation field
#[derive(Debug, Clone, PartialEq)]
pub struct RelationField {
    pub field: String,
    pub commands: Vec<RelationCommand>,
    /// Written in a second pass once every row has been upserted
    pub deferred: bool,
}

/// A row translated into the target schema
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    /// Target model (e.g. "product.template")
    pub model: String,
    /// Human-readable name for log lines
    pub display_name: String,
    pub external_id: Option<ExternalId>,
    /// Alternatives of field sets identifying an existing record, tried in order
    pub natural_keys: Vec<Vec<String>>,
    pub fields: BTreeMap<String, Value>,
    pub relations: Vec<RelationField>,
}

impl MappedRecord {
    pub fn new(model: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            display_name: display_name.into(),
            external_id: None,
            natural_keys: Vec::new(),
            fields: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    #[cfg(test)]
    pub fn relation(&self, field: &str) -> Option<&RelationField> {
        self.relations.iter().find(|r| r.field == field)
    }

    /// Remove and return the relations that must wait for the second pass
    pub fn take_deferred(&mut self) -> Vec<RelationField> {
        let (deferred, immediate) = std::mem::take(&mut self.relations)
            .into_iter()
            .partition(|r| r.deferred);
        self.relations = immediate;
        deferred
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_deferred() {
        let mut record = MappedRecord::new("stock.lot", "LOT-1");
        record.relations.push(RelationField {
            field: "x_assigned_part_ids".into(),
            commands: vec![RelationCommand::Link {
                lookup: "lot".into(),
                name: "LOT-2".into(),
            }],
            deferred: true,
        });
        record.relations.push(RelationField {
            field: "route_ids".into(),
            commands: vec![],
            deferred: false,
        });

        let deferred = record.take_deferred();
        assert_eq!(deferred.len(), 1);
        assert_eq!(deferred[0].field, "x_assigned_part_ids");
        assert_eq!(record.relations.len(), 1);
        assert!(record.relation("route_ids").is_some());
    }
}
