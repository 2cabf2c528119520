//! Connection credentials from config, environment, flags and prompt

use anyhow::{Result, bail};
use is_terminal::IsTerminal;

use crate::api::Credentials;

use super::ConnectionConfig;

pub const DEFAULT_URL: &str = "http://localhost:8069";

/// Connection values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConnectionOverrides {
    pub url: Option<String>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Merge flags over configuration; prompt for the password when it is
/// still missing and stdin is a terminal
pub fn resolve_credentials(config: &ConnectionConfig, overrides: &ConnectionOverrides) -> Result<Credentials> {
    merge_credentials(config, overrides, || {
        if !std::io::stdin().is_terminal() {
            return Ok(None);
        }
        Ok(Some(rpassword::prompt_password("Odoo password: ")?))
    })
}

fn merge_credentials(
    config: &ConnectionConfig,
    overrides: &ConnectionOverrides,
    prompt: impl FnOnce() -> Result<Option<String>>,
) -> Result<Credentials> {
    let pick = |flag: &Option<String>, file: &Option<String>| flag.clone().or_else(|| file.clone());

    let url = pick(&overrides.url, &config.url).unwrap_or_else(|| DEFAULT_URL.to_string());
    let Some(database) = pick(&overrides.database, &config.database) else {
        bail!("No database given. Use --db, ODOO_DB or [connection] database in the config file");
    };
    let Some(username) = pick(&overrides.username, &config.username) else {
        bail!("No username given. Use --user, ODOO_USER or [connection] username in the config file");
    };
    let password = match pick(&overrides.password, &config.password) {
        Some(password) => password,
        None => match prompt()? {
            Some(password) => password,
            None => bail!("No password given. Use --password or ODOO_PASSWORD"),
        },
    };

    Ok(Credentials {
        url: url.trim_end_matches('/').to_string(),
        database,
        username,
        password,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_config() -> ConnectionConfig {
        ConnectionConfig {
            url: Some("http://odoo.internal:8069/".into()),
            database: Some("prod".into()),
            username: Some("importer".into()),
            password: None,
        }
    }

    #[test]
    fn test_flags_win_over_config() {
        let overrides = ConnectionOverrides {
            database: Some("staging".into()),
            password: Some("secret".into()),
            ..Default::default()
        };
        let creds = merge_credentials(&file_config(), &overrides, || panic!("no prompt expected")).unwrap();

        assert_eq!(creds.url, "http://odoo.internal:8069");
        assert_eq!(creds.database, "staging");
        assert_eq!(creds.username, "importer");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_prompt_for_missing_password() {
        let creds = merge_credentials(&file_config(), &ConnectionOverrides::default(), || {
            Ok(Some("typed".into()))
        })
        .unwrap();
        assert_eq!(creds.password, "typed");
    }

    #[test]
    fn test_missing_values_are_errors() {
        let err = merge_credentials(&ConnectionConfig::default(), &ConnectionOverrides::default(), || Ok(None))
            .unwrap_err();
        assert!(err.to_string().contains("No database"));

        let err = merge_credentials(&file_config(), &ConnectionOverrides::default(), || Ok(None)).unwrap_err();
        assert!(err.to_string().contains("No password"));
    }

    #[test]
    fn test_default_url() {
        let mut config = file_config();
        config.url = None;
        config.password = Some("pw".into());
        let creds = merge_credentials(&config, &ConnectionOverrides::default(), || Ok(None)).unwrap();
        assert_eq!(creds.url, DEFAULT_URL);
    }
}
