//! Convert command: bill of materials to an importable file

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::Args;
use colored::*;

use crate::convert::{self, ConvertFormat, SheetSpec};

#[derive(Args, Debug)]
pub struct ConvertCommands {
    /// Bill-of-materials workbook
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output file
    #[arg(short, long)]
    pub out: PathBuf,

    /// Sheet to read as NAME or NAME:HEADER_ROW; repeatable
    #[arg(long)]
    pub sheet: Vec<SheetSpec>,

    /// Output layout
    #[arg(long, value_enum, default_value_t = ConvertFormat::ProductsCsv)]
    pub format: ConvertFormat,
}

pub async fn handle_convert_command(args: ConvertCommands) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("File does not exist: {}", args.file.display());
    }

    let sheets = if args.sheet.is_empty() {
        SheetSpec::bom_defaults()
    } else {
        args.sheet
    };

    let start = Instant::now();
    let written = convert::convert(&args.file, &args.out, &sheets, args.format)?;

    println!(
        "Wrote {} product(s) to {} in {:.2}ms",
        written.to_string().bright_green().bold(),
        args.out.display().to_string().cyan(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    Ok(())
}
