//! Inspect command: locate the header row of each sheet

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::*;

use crate::import::reader::{self, Cell, SheetPreview};

#[derive(Args, Debug)]
pub struct InspectCommands {
    /// Workbook or CSV file
    #[arg(short, long)]
    pub file: PathBuf,

    /// Rows to show per sheet
    #[arg(short, long, default_value_t = 5)]
    pub rows: usize,
}

pub async fn handle_inspect_command(args: InspectCommands) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("File does not exist: {}", args.file.display());
    }

    let previews = if reader::is_csv(&args.file) {
        vec![csv_preview(&args)?]
    } else {
        reader::list_sheets(&args.file, args.rows)
            .with_context(|| format!("Failed to read workbook: {}", args.file.display()))?
    };

    for preview in &previews {
        println!("{}", format!("Sheet: {}", preview.name).bright_blue().bold());
        if preview.rows.is_empty() {
            println!("  {}", "(empty)".dimmed());
        }
        for (offset, cells) in preview.rows.iter().enumerate() {
            println!(
                "  {} {}",
                format!("Row {}:", preview.first_row + offset).dimmed(),
                format_cells(cells)
            );
        }
        println!();
    }
    Ok(())
}

fn csv_preview(args: &InspectCommands) -> Result<SheetPreview> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&args.file)
        .with_context(|| format!("Failed to open CSV file: {}", args.file.display()))?;

    let mut rows = Vec::new();
    for record in reader.records().take(args.rows) {
        let record = record.context("Failed to read CSV record")?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    let name = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(SheetPreview {
        name,
        first_row: 0,
        rows,
    })
}

/// Cells as a debug-style list, blanks shown as `None`
fn format_cells(cells: &[Cell]) -> String {
    let parts: Vec<String> = cells
        .iter()
        .map(|cell| match cell.as_text() {
            Some(text) => format!("{:?}", text),
            None => "None".to_string(),
        })
        .collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_format_cells() {
        let cells = vec![Cell::Text("Product Name".into()), Cell::Empty, Cell::Number(2.0)];
        assert_eq!(format_cells(&cells), r#"["Product Name", None, "2"]"#);
    }

    #[test]
    fn test_csv_preview() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Bill of materials").unwrap();
        writeln!(file, "Name,Cost").unwrap();
        writeln!(file, "Widget,12.5").unwrap();

        let args = InspectCommands {
            file: file.path().to_path_buf(),
            rows: 2,
        };
        let preview = csv_preview(&args).unwrap();
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[1], vec![Cell::Text("Name".into()), Cell::Text("Cost".into())]);
    }
}
