//! Bill-of-materials conversion
//!
//! Turns a bill-of-materials workbook into files the importer (or the
//! platform's own import screen) accepts: the `products` CSV layout or a
//! product template workbook.

pub mod products_csv;
pub mod template_xlsx;

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::import::reader::{self, ReadError, Row};

static SHEET_SPEC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<name>.+?)(?::(?P<row>\d+))?$").expect("valid sheet spec regex"));

/// Columns holding the product name, in order of preference
pub const NAME_COLUMNS: &[&str] = &["Product Name", "Cable Name"];
/// Columns holding the unit cost, in order of preference
pub const COST_COLUMNS: &[&str] = &["Cost", "Price"];

/// Worksheet to convert with the index of its header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSpec {
    pub name: String,
    pub header_row: usize,
}

impl SheetSpec {
    pub fn new(name: impl Into<String>, header_row: usize) -> Self {
        Self {
            name: name.into(),
            header_row,
        }
    }

    /// Parse `NAME` or `NAME:ROW`
    pub fn parse(raw: &str) -> Result<Self> {
        let caps = SHEET_SPEC
            .captures(raw.trim())
            .ok_or_else(|| anyhow!("Invalid sheet '{}', expected NAME or NAME:ROW", raw))?;
        let header_row = match caps.name("row") {
            Some(row) => row
                .as_str()
                .parse()
                .with_context(|| format!("Invalid header row in '{}'", raw))?,
            None => 0,
        };
        Ok(Self::new(&caps["name"], header_row))
    }

    /// Sheets of the standard bill-of-materials workbook
    pub fn bom_defaults() -> Vec<Self> {
        vec![Self::new("Three Window_Covert", 1), Self::new("Cables", 0)]
    }
}

impl std::str::FromStr for SheetSpec {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Output layout of a conversion
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertFormat {
    /// CSV for the `products` import profile
    ProductsCsv,
    /// Product template workbook with extra source columns kept
    TemplateXlsx,
}

/// Data rows of the requested sheets, in order; missing sheets are skipped with a warning
pub fn load_sheets(path: &Path, specs: &[SheetSpec]) -> Result<Vec<Row>> {
    let mut rows = Vec::new();
    for spec in specs {
        let source = match reader::open_rows(path, Some(&spec.name), spec.header_row) {
            Ok(source) => source,
            Err(ReadError::MissingSheet { sheet, .. }) => {
                log::warn!("Sheet '{}' not found, skipping", sheet);
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let sheet_rows = source.collect::<Result<Vec<_>, _>>()?;
        log::info!("Read {} row(s) from sheet '{}'", sheet_rows.len(), spec.name);
        rows.extend(sheet_rows);
    }
    Ok(rows)
}

/// First non-blank text among `columns`
pub fn first_text(row: &Row, columns: &[&str]) -> Option<String> {
    columns.iter().find_map(|column| row.text(column))
}

/// Convert `input` into `output`; returns the number of items written
pub fn convert(input: &Path, output: &Path, specs: &[SheetSpec], format: ConvertFormat) -> Result<usize> {
    let loaded = load_sheets(input, specs)?;
    let rows: Vec<&Row> = loaded.iter().collect();

    let written = match format {
        ConvertFormat::ProductsCsv => products_csv::write_products_csv(&rows, output)?,
        ConvertFormat::TemplateXlsx => template_xlsx::write_template_xlsx(&rows, output)?,
    };
    log::info!("Wrote {} item(s) to {}", written, output.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sheet_spec_parse() {
        assert_eq!(SheetSpec::parse("Cables").unwrap(), SheetSpec::new("Cables", 0));
        assert_eq!(
            SheetSpec::parse("Three Window_Covert:1").unwrap(),
            SheetSpec::new("Three Window_Covert", 1)
        );
        // a colon not followed by digits belongs to the name
        assert_eq!(
            SheetSpec::parse("Parts: v2").unwrap(),
            SheetSpec::new("Parts: v2", 0)
        );
        assert!(SheetSpec::parse("").is_err());
    }

    #[test]
    fn test_first_text() {
        let row = Row::from_pairs(1, &[("Product Name", ""), ("Cable Name", "CAT6 2m")]);
        assert_eq!(first_text(&row, NAME_COLUMNS).as_deref(), Some("CAT6 2m"));
        assert_eq!(first_text(&row, COST_COLUMNS), None);
    }
}
