//! Fields command: model introspection

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use super::{ConnectionArgs, connect};
use crate::api::{FieldInfo, RecordClient};
use crate::config::Config;

#[derive(Args, Debug)]
pub struct FieldsCommands {
    /// Model name, e.g. product.template
    #[arg(short, long)]
    pub model: String,

    /// Only fields whose name or label contains this text
    #[arg(long)]
    pub filter: Option<String>,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}

pub async fn handle_fields_command(args: FieldsCommands, config: &Config) -> Result<()> {
    let client = connect(config, &args.connection).await?;
    let fields = client
        .fields_get(&args.model)
        .await
        .with_context(|| format!("Failed to list fields of {}", args.model))?;

    let shown = filter_fields(&fields, args.filter.as_deref());
    println!(
        "{} ({} of {} fields)",
        args.model.bright_blue().bold(),
        shown.len(),
        fields.len()
    );
    for (name, info) in shown {
        let relation = info
            .relation
            .as_deref()
            .map(|r| format!(" -> {}", r))
            .unwrap_or_default();
        let flags = match (info.required, info.readonly) {
            (true, true) => " [required, readonly]",
            (true, false) => " [required]",
            (false, true) => " [readonly]",
            (false, false) => "",
        };
        println!(
            "  {:<32} {:<12}{} {}{}",
            name.green(),
            info.field_type,
            relation.cyan(),
            info.string.dimmed(),
            flags.yellow()
        );
    }
    Ok(())
}

/// Case-insensitive match on field name or label
fn filter_fields<'a>(
    fields: &'a BTreeMap<String, FieldInfo>,
    filter: Option<&str>,
) -> Vec<(&'a String, &'a FieldInfo)> {
    let needle = filter.map(str::to_lowercase);
    fields
        .iter()
        .filter(|(name, info)| match &needle {
            Some(needle) => {
                name.to_lowercase().contains(needle) || info.string.to_lowercase().contains(needle)
            }
            None => true,
        })
        .collect()
}
