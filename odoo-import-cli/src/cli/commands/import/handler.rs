//! Import command handler

use anyhow::{Context, Result, anyhow, bail};
use colored::*;

use super::ImportCommands;
use crate::api::{DryRunClient, RecordClient};
use crate::cli::commands::connect;
use crate::config::{Config, SchemaReport};
use crate::import::reader::{RowSource, open_rows};
use crate::import::types::{ImportProfile, LookupTable};
use crate::import::{FieldMapper, ImportRun, LookupCache, UpsertEngine, profiles};

pub async fn handle_import_command(args: ImportCommands, config: &Config) -> Result<()> {
    let profile = select_profile(&args, config)?;
    let lookups = config.lookup_table();
    for name in profile.lookups() {
        if lookups.get(name).is_none() {
            bail!("Profile '{}' uses unknown lookup '{}'", profile.name, name);
        }
    }

    let schema = config.schema()?;
    schema
        .check_profile(&profile)
        .with_context(|| format!("Profile '{}' does not match the schema", profile.name))?;
    let mapper = FieldMapper::new(profile.clone())
        .with_context(|| format!("Invalid profile '{}'", profile.name))?;

    println!(
        "Importing {} into {} with profile {}",
        args.file.display().to_string().cyan(),
        profile.model.bright_green(),
        profile.name.bold()
    );
    if args.dry_run {
        println!("{}", "Dry run: nothing will be written".yellow().bold());
    }

    let mut run = ImportRun::new();

    let rows = match open_rows(&args.file, profile.sheet.as_deref(), profile.header_row) {
        Ok(rows) => rows,
        Err(e) => {
            run.abort(&e);
            return Err(e.into());
        }
    };
    log::debug!("Columns: {}", rows.headers().join(", "));
    for column in mapper.missing_columns(rows.headers()) {
        log::warn!("Column '{}' not found in {}", column, args.file.display());
    }

    run.begin_connecting();
    let client = match connect(config, &args.connection).await {
        Ok(client) => client,
        Err(e) => {
            run.abort(&e);
            return Err(e);
        }
    };

    let report = match schema.validate(&client, &profile).await {
        Ok(report) => report,
        Err(e) => {
            run.abort(&e);
            return Err(anyhow!(e).context("Schema validation failed"));
        }
    };

    if args.dry_run {
        let client = DryRunClient::new(client);
        execute(&mut run, &client, &lookups, &mapper, &report, rows).await?;
        println!(
            "{} {} change(s) not sent",
            "[DRY RUN]".yellow(),
            client.suppressed().len()
        );
    } else {
        execute(&mut run, &client, &lookups, &mapper, &report, rows).await?;
    }

    print_summary(&run);
    Ok(())
}

/// Resolve the profile and apply the sheet/header overrides
fn select_profile(args: &ImportCommands, config: &Config) -> Result<ImportProfile> {
    let mut profile = profiles::find(&args.profile, &config.profiles).ok_or_else(|| {
        let mut names: Vec<String> = profiles::builtin().into_iter().map(|p| p.name).collect();
        names.extend(config.profiles.iter().map(|p| p.name.clone()));
        names.sort();
        names.dedup();
        anyhow!("Unknown profile '{}'. Available: {}", args.profile, names.join(", "))
    })?;

    if let Some(sheet) = &args.sheet {
        profile.sheet = Some(sheet.clone());
    }
    if let Some(header_row) = args.header_row {
        profile.header_row = header_row;
    }
    Ok(profile)
}

async fn execute<C: RecordClient>(
    run: &mut ImportRun,
    client: &C,
    lookups: &LookupTable,
    mapper: &FieldMapper,
    report: &SchemaReport,
    rows: RowSource,
) -> Result<()> {
    let mut engine = UpsertEngine::new(client, lookups, LookupCache::new())
        .with_unavailable_fields(&report.model, report.unavailable.iter().cloned());

    run.run(&mut engine, mapper, rows)
        .await
        .context("Import stopped while reading the file")?;

    log::debug!(
        "Lookup cache: {} entries, {} hits",
        engine.cache().entry_count(),
        engine.cache().hits()
    );
    Ok(())
}

fn print_summary(run: &ImportRun) {
    let summary = run.summary();
    println!();
    println!("{} ({})", "Import finished".bright_green().bold(), run.state());
    println!("  Processed: {}", summary.processed);
    println!("  Created:   {}", summary.created.to_string().green());
    println!("  Updated:   {}", summary.updated.to_string().cyan());

    let skipped = summary.skipped.to_string();
    println!(
        "  Skipped:   {}",
        if summary.skipped > 0 { skipped.yellow() } else { skipped.normal() }
    );
    let failed = summary.failed.to_string();
    println!(
        "  Failed:    {}",
        if summary.failed > 0 { failed.red().bold() } else { failed.normal() }
    );
    if summary.warnings > 0 {
        println!("  Warnings:  {}", summary.warnings.to_string().yellow());
    }
    if summary.linked > 0 || summary.link_failures > 0 {
        println!(
            "  Linked:    {} ({} failed)",
            summary.linked, summary.link_failures
        );
    }
    println!("  Elapsed:   {}ms", run.elapsed().num_milliseconds());
}
