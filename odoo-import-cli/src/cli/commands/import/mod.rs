mod handler;

use std::path::PathBuf;

use clap::Args;

use super::ConnectionArgs;

pub use handler::handle_import_command;

#[derive(Args, Debug)]
pub struct ImportCommands {
    /// Import profile (products, templates, lots or a configured one)
    #[arg(short, long)]
    pub profile: String,

    /// CSV file or workbook to read
    #[arg(short, long)]
    pub file: PathBuf,

    /// Worksheet to read instead of the profile's
    #[arg(long)]
    pub sheet: Option<String>,

    /// Index of the header row (0 = first row) instead of the profile's
    #[arg(long)]
    pub header_row: Option<usize>,

    /// Resolve and log every change without writing anything
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,
}
