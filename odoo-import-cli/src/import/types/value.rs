//! Typed field values of a mapped record

use serde::{Deserialize, Serialize};

/// Reference to a related record by name, resolved by the upsert engine
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LookupRef {
    /// Name of the lookup that knows how to find the record
    pub lookup: String,
    /// Value to search for
    pub name: String,
    /// Whether the row must be skipped when the record cannot be found
    pub required: bool,
}

/// A value destined for a target field
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Related record looked up by name
    #[serde(skip)]
    Lookup(LookupRef),
    /// Empty; written as `false`, which the platform treats as unset
    #[default]
    Null,
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[cfg(test)]
    pub fn as_lookup(&self) -> Option<&LookupRef> {
        match self {
            Value::Lookup(lookup) => Some(lookup),
            _ => None,
        }
    }

    /// JSON form for API calls; `None` for unresolved lookups
    pub fn to_json(&self) -> Option<serde_json::Value> {
        match self {
            Value::Null => Some(serde_json::Value::Bool(false)),
            Value::Bool(b) => Some(serde_json::Value::Bool(*b)),
            Value::Int(i) => Some(serde_json::json!(*i)),
            Value::Float(f) => Some(serde_json::json!(*f)),
            Value::String(s) => Some(serde_json::Value::String(s.clone())),
            Value::Lookup(_) => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "(null)"),
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Lookup(l) => write!(f, "{}({})", l.lookup, l.name),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_is_sent_as_false() {
        assert_eq!(Value::Null.to_json(), Some(json!(false)));
    }

    #[test]
    fn test_lookup_has_no_json_form() {
        let value = Value::Lookup(LookupRef {
            lookup: "partner".into(),
            name: "Acme".into(),
            required: false,
        });
        assert_eq!(value.to_json(), None);
        assert_eq!(value.to_string(), "partner(Acme)");
    }

    #[test]
    fn test_untagged_deserialize() {
        #[derive(Deserialize)]
        struct Holder {
            value: Value,
        }
        let h: Holder = toml::from_str(r#"value = "product""#).unwrap();
        assert_eq!(h.value, Value::String("product".into()));
        let h: Holder = toml::from_str("value = 3").unwrap();
        assert_eq!(h.value, Value::Int(3));
        let h: Holder = toml::from_str("value = true").unwrap();
        assert_eq!(h.value, Value::Bool(true));
    }
}
