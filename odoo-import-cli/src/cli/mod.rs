//! Command-line interface

pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::{ConvertCommands, FieldsCommands, ImportCommands, InspectCommands, StatusCommands};

#[derive(Parser)]
#[command(name = "odoo-import")]
#[command(about = "Import spreadsheets into Odoo with idempotent upserts", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file (defaults to <config dir>/odoo-import/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a CSV file or worksheet with a profile
    Import(ImportCommands),
    /// Show the first rows of every sheet in a workbook
    Inspect(InspectCommands),
    /// Turn a bill-of-materials workbook into an importable file
    Convert(ConvertCommands),
    /// List the fields of a model on the server
    Fields(FieldsCommands),
    /// Record counts and module state on the server
    Status(StatusCommands),
}
