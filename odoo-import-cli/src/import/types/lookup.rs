//! Lookup definitions for resolving related records by name
//!
//! A lookup tells the upsert engine how to turn a name found in a
//! spreadsheet cell ("Acme Industrial", "Receive in 2 steps") into the id
//! of an existing record, and whether to create the record when no match
//! is found.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::Operator;

use super::Value;

/// How to find (and optionally create) a related record by name
///
/// For example, to resolve a vendor by name and create it when missing:
/// - `model`: "res.partner"
/// - `strategies`: `[name =]`
/// - `create_missing`: true, with `is_company = true`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupSpec {
    /// Model searched for matches
    pub model: String,
    /// Searches tried in order; the first one with a hit wins
    pub strategies: Vec<SearchStrategy>,
    /// Create a record named after the value when nothing matches
    #[serde(default)]
    pub create_missing: bool,
    /// Extra values for created records
    #[serde(default)]
    pub create_values: BTreeMap<String, Value>,
}

impl LookupSpec {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            strategies: Vec::new(),
            create_missing: false,
            create_values: BTreeMap::new(),
        }
    }

    pub fn search(mut self, field: impl Into<String>, operator: Operator) -> Self {
        self.strategies.push(SearchStrategy {
            field: field.into(),
            operator,
        });
        self
    }

    pub fn create_with(mut self, values: &[(&str, Value)]) -> Self {
        self.create_missing = true;
        self.create_values = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self
    }
}

/// One `field operator value` search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStrategy {
    /// Field compared against the name; may be a dotted path (`product_tmpl_id.name`)
    pub field: String,
    #[serde(default = "default_operator")]
    pub operator: Operator,
}

fn default_operator() -> Operator {
    Operator::Eq
}

/// Named lookups available to profiles
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable {
    specs: BTreeMap<String, LookupSpec>,
}

impl LookupTable {
    /// Lookups used by the built-in profiles
    pub fn builtin() -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            "partner".to_string(),
            LookupSpec::new("res.partner")
                .search("name", Operator::Eq)
                .create_with(&[("is_company", Value::Bool(true))]),
        );
        specs.insert(
            "route".to_string(),
            LookupSpec::new("stock.route").search("name", Operator::ILike),
        );
        specs.insert(
            "category".to_string(),
            LookupSpec::new("product.category").search("name", Operator::Eq),
        );
        specs.insert(
            "uom".to_string(),
            LookupSpec::new("uom.uom").search("name", Operator::Eq),
        );
        specs.insert(
            "product".to_string(),
            LookupSpec::new("product.product")
                .search("name", Operator::Eq)
                .search("default_code", Operator::Eq)
                .search("product_tmpl_id.name", Operator::Eq),
        );
        specs.insert(
            "lot".to_string(),
            LookupSpec::new("stock.lot").search("name", Operator::Eq),
        );
        Self { specs }
    }

    pub fn get(&self, name: &str) -> Option<&LookupSpec> {
        self.specs.get(name)
    }

    /// Add or replace lookups from `other`
    pub fn merge(&mut self, other: LookupTable) {
        self.specs.extend(other.specs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_product_strategies_in_order() {
        let table = LookupTable::builtin();
        let product = table.get("product").unwrap();
        let fields: Vec<&str> = product.strategies.iter().map(|s| s.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "default_code", "product_tmpl_id.name"]);
        assert!(!product.create_missing);

        let partner = table.get("partner").unwrap();
        assert!(partner.create_missing);
        assert_eq!(partner.create_values.get("is_company"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_merge_overrides_from_toml() {
        let custom: LookupTable = toml::from_str(
            r#"
            [route]
            model = "stock.location.route"
            strategies = [{ field = "name" }]

            [tag]
            model = "product.tag"
            strategies = [{ field = "name", operator = "ilike" }]
            create_missing = true
            "#,
        )
        .unwrap();

        let mut table = LookupTable::builtin();
        table.merge(custom);

        let route = table.get("route").unwrap();
        assert_eq!(route.model, "stock.location.route");
        assert_eq!(route.strategies[0].operator, Operator::Eq);
        assert!(table.get("tag").unwrap().create_missing);
        assert!(table.get("partner").is_some());
    }
}
