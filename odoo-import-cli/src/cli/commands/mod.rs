pub mod convert;
pub mod fields;
pub mod import;
pub mod inspect;
pub mod status;

use anyhow::Result;
use clap::Args;
use colored::*;

use crate::api::OdooClient;
use crate::config::{Config, ConnectionOverrides, resolve_credentials};

pub use convert::ConvertCommands;
pub use fields::FieldsCommands;
pub use import::ImportCommands;
pub use inspect::InspectCommands;
pub use status::StatusCommands;

/// Server connection flags; each overrides config file and environment
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Server url, e.g. http://localhost:8069
    #[arg(long)]
    pub url: Option<String>,

    /// Database name
    #[arg(long)]
    pub db: Option<String>,

    /// Login
    #[arg(long)]
    pub user: Option<String>,

    /// Password (prompted when missing and running in a terminal)
    #[arg(long)]
    pub password: Option<String>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            url: self.url.clone(),
            database: self.db.clone(),
            username: self.user.clone(),
            password: self.password.clone(),
        }
    }
}

/// Resolve credentials and authenticate
pub async fn connect(config: &Config, args: &ConnectionArgs) -> Result<OdooClient> {
    let credentials = resolve_credentials(&config.connection, &args.overrides())?;
    println!(
        "Connecting to {} (database {})",
        credentials.url.cyan(),
        credentials.database.bright_green().bold()
    );
    Ok(OdooClient::connect(&credentials).await?)
}
