//! Import profiles: table-driven descriptions of how rows become records

use serde::{Deserialize, Serialize};

use super::Value;

/// Everything needed to map rows of one input layout onto one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProfile {
    /// Unique name used on the command line
    pub name: String,
    /// Target model (e.g. "product.template")
    pub model: String,
    #[serde(default)]
    pub description: String,
    /// Index of the header row (0 = first row)
    #[serde(default)]
    pub header_row: usize,
    /// Worksheet to read; first sheet when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    /// Columns that must be non-blank, otherwise the row is skipped
    #[serde(default)]
    pub required: Vec<String>,
    /// Column naming the record in log lines
    pub display_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<ExternalIdRule>,
    /// Target field sets identifying an existing record, tried in order
    #[serde(default)]
    pub natural_keys: Vec<Vec<String>>,
    /// Regex rewrites applied to every multi-valued item before dedup
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
    #[serde(default)]
    pub fields: Vec<FieldMapping>,
    #[serde(default)]
    pub relations: Vec<RelationMapping>,
}

impl ImportProfile {
    /// Every target field written by this profile, relations included
    pub fn target_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = self
            .fields
            .iter()
            .map(|f| f.target_field.as_str())
            .collect();
        fields.extend(self.relations.iter().map(|r| r.target_field()));
        fields
    }

    /// Names of lookups referenced anywhere in the profile
    pub fn lookups(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        let nested = self.relations.iter().flat_map(|r| match r {
            RelationMapping::CreateAndAppend { values, .. } => values.iter().collect(),
            _ => Vec::new(),
        });
        for mapping in self.fields.iter().chain(nested) {
            if let Transform::Lookup { lookup, .. } = &mapping.transform {
                names.push(lookup);
            }
        }
        for relation in &self.relations {
            match relation {
                RelationMapping::ReplaceAll { lookup, .. } | RelationMapping::Link { lookup, .. } => {
                    names.push(lookup)
                }
                RelationMapping::CreateAndAppend { .. } => {}
            }
        }
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// Mapping for a single target field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMapping {
    pub target_field: String,
    pub transform: Transform,
}

impl FieldMapping {
    pub fn new(target_field: impl Into<String>, transform: Transform) -> Self {
        Self {
            target_field: target_field.into(),
            transform,
        }
    }
}

/// How a target value is produced from a row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transform {
    /// Trimmed text of a column; blank gives null
    Copy { column: String },
    /// Fixed value
    Constant { value: Value },
    /// Decimal number; blank or unparsable gives `default`
    Number {
        column: String,
        #[serde(default)]
        default: f64,
    },
    /// Whole number; blank or unparsable gives `default`
    Integer {
        column: String,
        #[serde(default)]
        default: i64,
    },
    /// Flag from TRUE/FALSE style text; blank or unrecognized gives `default`
    Boolean {
        column: String,
        #[serde(default)]
        default: bool,
    },
    /// Label to internal code table
    ValueMap {
        column: String,
        mappings: Vec<ValueMapEntry>,
        #[serde(default)]
        fallback: Fallback,
    },
    /// Related record found by name through a named lookup
    Lookup {
        column: String,
        lookup: String,
        #[serde(default)]
        required: bool,
    },
}

impl Transform {
    pub fn copy(column: impl Into<String>) -> Self {
        Transform::Copy {
            column: column.into(),
        }
    }

    pub fn number(column: impl Into<String>) -> Self {
        Transform::Number {
            column: column.into(),
            default: 0.0,
        }
    }

    pub fn lookup(column: impl Into<String>, lookup: impl Into<String>, required: bool) -> Self {
        Transform::Lookup {
            column: column.into(),
            lookup: lookup.into(),
            required,
        }
    }

    /// Build a value map from `(label, code)` pairs
    pub fn value_map(column: impl Into<String>, pairs: &[(&str, &str)], fallback: Fallback) -> Self {
        Transform::ValueMap {
            column: column.into(),
            mappings: pairs
                .iter()
                .map(|(from, to)| ValueMapEntry {
                    from: from.to_string(),
                    to: Value::from(*to),
                })
                .collect(),
            fallback,
        }
    }

    /// Source column read by this transform
    pub fn column(&self) -> Option<&str> {
        match self {
            Transform::Constant { .. } => None,
            Transform::Copy { column }
            | Transform::Number { column, .. }
            | Transform::Integer { column, .. }
            | Transform::Boolean { column, .. }
            | Transform::ValueMap { column, .. }
            | Transform::Lookup { column, .. } => Some(column),
        }
    }

    /// Get a human-readable description of this transform
    pub fn describe(&self) -> String {
        match self {
            Transform::Copy { column } => format!("copy({})", column),
            Transform::Constant { value } => format!("constant({})", value),
            Transform::Number { column, default } => format!("number({}, default {})", column, default),
            Transform::Integer { column, default } => {
                format!("integer({}, default {})", column, default)
            }
            Transform::Boolean { column, default } => {
                format!("boolean({}, default {})", column, default)
            }
            Transform::ValueMap {
                column,
                mappings,
                fallback,
            } => format!("map({}) [{} entries, {}]", column, mappings.len(), fallback),
            Transform::Lookup {
                column, lookup, ..
            } => format!("lookup({} via {})", column, lookup),
        }
    }
}

/// One `label -> code` entry of a value map; labels match case-insensitively
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMapEntry {
    pub from: String,
    pub to: Value,
}

/// What a value map produces for an unknown label
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Fallback {
    /// Use a documented default code
    Default { value: Value },
    /// Keep the source text unchanged
    PassThrough,
    /// Leave the field empty
    #[default]
    Null,
}

impl std::fmt::Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::Default { value } => write!(f, "default({})", value),
            Fallback::PassThrough => write!(f, "passthrough"),
            Fallback::Null => write!(f, "null"),
        }
    }
}

fn default_separator() -> String {
    ",".to_string()
}

/// How a relation field is filled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RelationMapping {
    /// Every column named `column`, split on `separator`, substituted and
    /// deduplicated, replaces the field's whole set
    ReplaceAll {
        field: String,
        column: String,
        lookup: String,
        #[serde(default = "default_separator")]
        separator: String,
    },
    /// A new child line built from `values`, only when `when_present` is non-blank
    CreateAndAppend {
        field: String,
        when_present: String,
        values: Vec<FieldMapping>,
    },
    /// One related record by name added to the set
    Link {
        field: String,
        column: String,
        lookup: String,
        #[serde(default)]
        deferred: bool,
    },
}

impl RelationMapping {
    pub fn target_field(&self) -> &str {
        match self {
            RelationMapping::ReplaceAll { field, .. }
            | RelationMapping::CreateAndAppend { field, .. }
            | RelationMapping::Link { field, .. } => field,
        }
    }
}

/// Where the external id of a record comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExternalIdRule {
    /// A column holding `namespace.name`; values without a dot are placed
    /// under `namespace` when one is given and ignored otherwise
    Column {
        column: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        namespace: Option<String>,
    },
    /// `namespace.<prefix><sanitized first non-blank column of from>`
    Derived {
        namespace: String,
        #[serde(default)]
        prefix: String,
        from: Vec<String>,
    },
}

/// Regex rewrite for multi-valued items (e.g. strip a company prefix)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_from_toml() {
        let profile: ImportProfile = toml::from_str(
            r#"
            name = "vendors"
            model = "res.partner"
            display_column = "Vendor"
            required = ["Vendor"]
            natural_keys = [["name"]]

            [external_id]
            type = "derived"
            namespace = "import_script"
            prefix = "vendor_"
            from = ["Vendor"]

            [[fields]]
            target_field = "name"
            transform = { type = "copy", column = "Vendor" }

            [[fields]]
            target_field = "is_company"
            transform = { type = "constant", value = true }

            [[fields]]
            target_field = "company_type"
            [fields.transform]
            type = "value_map"
            column = "Kind"
            mappings = [{ from = "Company", to = "company" }, { from = "Person", to = "person" }]
            fallback = { type = "default", value = "company" }

            [[relations]]
            type = "replace_all"
            field = "category_id"
            column = "Tags"
            lookup = "partner_tag"
            "#,
        )
        .unwrap();

        assert_eq!(profile.header_row, 0);
        assert_eq!(profile.target_fields(), vec!["name", "is_company", "company_type", "category_id"]);
        assert_eq!(profile.lookups(), vec!["partner_tag"]);
        assert!(matches!(
            &profile.relations[0],
            RelationMapping::ReplaceAll { separator, .. } if separator == ","
        ));
        assert_eq!(
            profile.fields[2].transform.describe(),
            "map(Kind) [2 entries, default(company)]"
        );
    }

    #[test]
    fn test_transform_column() {
        assert_eq!(Transform::number("Cost").column(), Some("Cost"));
        assert_eq!(
            Transform::Constant {
                value: Value::Bool(true)
            }
            .column(),
            None
        );
    }
}
