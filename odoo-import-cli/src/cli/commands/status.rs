//! Status command: record counts and module install state

use anyhow::Result;
use clap::Args;
use colored::*;

use super::{ConnectionArgs, connect};
use crate::api::{Domain, Filter, RecordClient, RemoteCallError};
use crate::config::Config;

const MODULE_MODEL: &str = "ir.module.module";

#[derive(Args, Debug)]
pub struct StatusCommands {
    /// Models to count; repeatable
    #[arg(short, long, default_values_t = ["product.template".to_string(), "stock.lot".to_string()])]
    pub model: Vec<String>,

    /// Modules whose install state to show; repeatable
    #[arg(long)]
    pub module: Vec<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn handle_status_command(args: StatusCommands, config: &Config) -> Result<()> {
    let client = connect(config, &args.connection).await?;

    for model in &args.model {
        match client.search_count(model, &Domain::all()).await {
            Ok(count) => println!("{:<24} {}", model.bright_blue(), count.to_string().bold()),
            Err(e) => println!("{:<24} {}", model.bright_blue(), e.to_string().red()),
        }
    }

    for module in &args.module {
        match module_state(&client, module).await? {
            Some(state) if state == "installed" => {
                println!("Module '{}': {}", module, state.bright_green())
            }
            Some(state) => println!("Module '{}': {}", module, state.yellow()),
            None => println!("Module '{}': {}", module, "not found in app list".red()),
        }
    }
    Ok(())
}

/// `state` of a module by technical name, `None` when unknown to the server
pub async fn module_state<C: RecordClient + ?Sized>(
    client: &C,
    name: &str,
) -> Result<Option<String>, RemoteCallError> {
    let ids = client
        .search(MODULE_MODEL, &Domain::from(Filter::eq("name", name)), Some(1))
        .await?;
    if ids.is_empty() {
        return Ok(None);
    }
    let rows = client.read(MODULE_MODEL, &ids, &["state"]).await?;
    Ok(rows
        .first()
        .and_then(|row| row.get("state"))
        .and_then(|v| v.as_str())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryClient;
    use serde_json::json;

    #[tokio::test]
    async fn test_module_state() {
        let client = MemoryClient::new();
        client.insert(MODULE_MODEL, json!({"name": "stock", "state": "installed"}));
        client.insert(MODULE_MODEL, json!({"name": "mrp", "state": "uninstalled"}));

        assert_eq!(module_state(&client, "stock").await.unwrap().as_deref(), Some("installed"));
        assert_eq!(module_state(&client, "mrp").await.unwrap().as_deref(), Some("uninstalled"));
        assert_eq!(module_state(&client, "falcon").await.unwrap(), None);
    }
}
