//! Configuration
//!
//! Read from `<config dir>/odoo-import/config.toml` (or `--config`), then
//! overridden by `ODOO_*` environment variables and finally by command-line
//! flags.

pub mod credentials;
pub mod schema;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::import::types::{ImportProfile, LookupTable};

pub use credentials::{ConnectionOverrides, resolve_credentials};
pub use schema::SchemaReport;
use schema::Schema;

const APP_DIR: &str = "odoo-import";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub connection: ConnectionConfig,
    /// Additional or replacement lookups, merged over the built-in ones
    pub lookups: LookupTable,
    /// Custom profiles; a custom profile shadows a built-in one of the same name
    pub profiles: Vec<ImportProfile>,
    pub schema: SchemaConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Replaces the built-in schema when set
    pub path: Option<PathBuf>,
}

impl Config {
    /// `~/.config/odoo-import/config.toml` on Linux
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the configuration
    ///
    /// An explicit path must exist; the default path is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => {
                    log::debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Override connection settings from `ODOO_URL`, `ODOO_DB`, `ODOO_USER`, `ODOO_PASSWORD`
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let conn = &mut self.connection;
        for (key, slot) in [
            ("ODOO_URL", &mut conn.url),
            ("ODOO_DB", &mut conn.database),
            ("ODOO_USER", &mut conn.username),
            ("ODOO_PASSWORD", &mut conn.password),
        ] {
            if let Some(value) = var(key).filter(|v| !v.trim().is_empty()) {
                *slot = Some(value);
            }
        }
    }

    /// Built-in lookups with the configured ones merged over them
    pub fn lookup_table(&self) -> LookupTable {
        let mut table = LookupTable::builtin();
        table.merge(self.lookups.clone());
        table
    }

    /// The configured schema file, or the built-in schema
    pub fn schema(&self) -> Result<Schema> {
        match &self.schema.path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read schema file: {}", path.display()))?;
                Schema::from_toml(&text)
                    .with_context(|| format!("Invalid schema file: {}", path.display()))
            }
            None => Schema::builtin().context("Built-in schema is invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            [connection]
            url = "http://odoo.internal:8069"
            database = "prod"
            username = "importer@example.com"

            [lookups.partner]
            model = "res.partner"
            strategies = [{ field = "ref" }, { field = "name" }]

            [[profiles]]
            name = "vendors"
            model = "res.partner"
            display_column = "Vendor"
            fields = [{ target_field = "name", transform = { type = "copy", column = "Vendor" } }]
            "#,
        )
        .unwrap();

        assert_eq!(config.connection.database.as_deref(), Some("prod"));
        assert_eq!(config.connection.password, None);
        assert_eq!(config.profiles[0].name, "vendors");

        let table = config.lookup_table();
        assert_eq!(table.get("partner").unwrap().strategies.len(), 2);
        assert!(table.get("route").is_some());
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::from_toml("[connection]\ndatabase = \"file-db\"\nusername = \"file-user\"").unwrap();
        let env: HashMap<&str, &str> = HashMap::from([("ODOO_DB", "env-db"), ("ODOO_PASSWORD", "secret"), ("ODOO_USER", "")]);
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.connection.database.as_deref(), Some("env-db"));
        assert_eq!(config.connection.username.as_deref(), Some("file-user"));
        assert_eq!(config.connection.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/odoo-import.toml"))).is_err());
    }

    #[test]
    fn test_schema_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.toml");
        std::fs::write(&path, "version = 7").unwrap();

        let config = Config {
            schema: SchemaConfig { path: Some(path) },
            ..Config::default()
        };
        let err = config.schema().unwrap_err();
        assert!(err.to_string().contains("Invalid schema file"));
        assert!(Config::default().schema().is_ok());
    }
}
