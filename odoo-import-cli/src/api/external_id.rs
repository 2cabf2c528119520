//! External identifiers (`module.name` keys in `ir.model.data`)

use serde::{Deserialize, Serialize};

/// Registry model that maps external ids to record ids
pub const REGISTRY_MODEL: &str = "ir.model.data";

/// A stable `(namespace, name)` key pointing at exactly one record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExternalId {
    pub namespace: String,
    pub name: String,
}

/// Error parsing an external id string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalIdError {
    /// No `.` separating namespace and name
    MissingSeparator(String),
    /// Namespace or name is empty
    EmptyPart(String),
}

impl std::fmt::Display for ExternalIdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalIdError::MissingSeparator(raw) => {
                write!(f, "external id '{}' has no 'namespace.' prefix", raw)
            }
            ExternalIdError::EmptyPart(raw) => {
                write!(f, "external id '{}' has an empty namespace or name", raw)
            }
        }
    }
}

impl std::error::Error for ExternalIdError {}

impl ExternalId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Parse `namespace.name`; only the first dot separates, so names may contain dots
    pub fn parse(raw: &str) -> Result<Self, ExternalIdError> {
        let raw = raw.trim();
        let (namespace, name) = raw
            .split_once('.')
            .ok_or_else(|| ExternalIdError::MissingSeparator(raw.to_string()))?;

        if namespace.is_empty() || name.is_empty() {
            return Err(ExternalIdError::EmptyPart(raw.to_string()));
        }

        Ok(Self::new(namespace, name))
    }

    /// Build an id whose name is `prefix` + a sanitized form of `source`
    ///
    /// Every non-alphanumeric character becomes `_` and the result is lowercased,
    /// so `"W-100 Blue"` under prefix `prod_` gives `prod_w_100_blue`.
    pub fn derived(namespace: impl Into<String>, prefix: &str, source: &str) -> Self {
        let sanitized: String = source
            .trim()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '_' })
            .collect::<String>()
            .to_lowercase();
        Self::new(namespace, format!("{}{}", prefix, sanitized))
    }
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl std::str::FromStr for ExternalId {
    type Err = ExternalIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExternalId::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let xid = ExternalId::parse("__import__.product_widget").unwrap();
        assert_eq!(xid.namespace, "__import__");
        assert_eq!(xid.name, "product_widget");
        assert_eq!(xid.to_string(), "__import__.product_widget");
    }

    #[test]
    fn test_parse_keeps_later_dots_in_name() {
        let xid = ExternalId::parse("stock.lot.a1").unwrap();
        assert_eq!(xid.namespace, "stock");
        assert_eq!(xid.name, "lot.a1");
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            ExternalId::parse("widget"),
            Err(ExternalIdError::MissingSeparator(_))
        ));
        assert!(matches!(
            ExternalId::parse(".widget"),
            Err(ExternalIdError::EmptyPart(_))
        ));
    }

    #[test]
    fn test_derived() {
        let xid = ExternalId::derived("import_script", "prod_", "W-100 Blue");
        assert_eq!(xid.to_string(), "import_script.prod_w_100_blue");
    }
}
