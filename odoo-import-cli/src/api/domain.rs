//! Search domains
//!
//! Odoo filters records with a "domain": a list of `[field, operator, value]`
//! triples that are implicitly AND-ed together.

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_json::Value;

/// Comparison operator of a single domain term
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    /// Case-insensitive substring match
    #[serde(rename = "ilike")]
    ILike,
    #[serde(rename = "in")]
    In,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::ILike => "ilike",
            Operator::In => "in",
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `[field, operator, value]` term
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub operator: Operator,
    pub value: Value,
}

impl Filter {
    pub fn new(field: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    #[cfg(test)]
    pub fn ilike(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::ILike, value)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(3))?;
        seq.serialize_element(&self.field)?;
        seq.serialize_element(self.operator.as_str())?;
        seq.serialize_element(&self.value)?;
        seq.end()
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

/// Conjunction of filters; the empty domain matches every record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Domain {
    filters: Vec<Filter>,
}

impl Domain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Domain matching all records of a model
    pub fn all() -> Self {
        Self::default()
    }

    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    #[cfg(test)]
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Array(Vec::new()))
    }
}

impl From<Filter> for Domain {
    fn from(filter: Filter) -> Self {
        Domain::new().with(filter)
    }
}

impl FromIterator<Filter> for Domain {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Domain {
            filters: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.filters.serialize(serializer)
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.filters.iter().map(|t| t.to_string()).collect();
        write!(f, "[{}]", parts.join(" AND "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_serializes_as_triples() {
        let domain = Domain::new()
            .with(Filter::eq("module", "import_script"))
            .with(Filter::ilike("name", "steps"));

        assert_eq!(
            domain.to_json(),
            json!([["module", "=", "import_script"], ["name", "ilike", "steps"]])
        );
    }

    #[test]
    fn test_empty_domain_is_empty_list() {
        assert_eq!(Domain::all().to_json(), json!([]));
    }

    #[test]
    fn test_display() {
        let domain: Domain = Filter::eq("default_code", "W-1").into();
        assert_eq!(domain.to_string(), "[default_code = \"W-1\"]");
    }
}
