//! Bill of materials to the `products` CSV layout

use std::path::Path;

use anyhow::{Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use regex::Regex;

use crate::import::mapper::{CompiledSubstitution, collect_values};
use crate::import::reader::Row;

use super::{COST_COLUMNS, NAME_COLUMNS, first_text};

pub const HEADERS: [&str; 12] = [
    "Name",
    "Can be Purchased",
    "Product Type",
    "Tracking",
    "Cost",
    "Internal Reference",
    "Vendor / Name",
    "Vendor / Product Code",
    "Vendor / Product Name",
    "Vendor / Minimum Quantity",
    "Vendor / Delivery Lead Time",
    "Routes",
];

/// Source columns copied as-is, in output order after `Cost`
const COPIED: [&str; 6] = [
    "Reference",
    "Vendor",
    "Vendor Product Code",
    "Vendor Product Name",
    "Quantity",
    "Lead Time",
];

fn route_prefix() -> Result<CompiledSubstitution> {
    Ok(CompiledSubstitution {
        pattern: Regex::new(r"^Arc34:\s*")?,
        replacement: String::new(),
    })
}

/// One output record, or `None` when the row has no product name
pub fn product_line(row: &Row, route_subs: &[CompiledSubstitution]) -> Option<Vec<String>> {
    let name = first_text(row, NAME_COLUMNS)?;

    let mut line = vec![
        name,
        "TRUE".to_string(),
        "Storable Product".to_string(),
        "No Tracking".to_string(),
        first_text(row, COST_COLUMNS).unwrap_or_else(|| "0".to_string()),
    ];
    line.extend(COPIED.iter().map(|column| row.text(column).unwrap_or_default()));
    line.push(collect_values(row, "Routes", "", route_subs).join(","));

    Some(line)
}

/// Write every named row to `path`; returns the number of products written
pub fn write_products_csv(rows: &[&Row], path: &Path) -> Result<usize> {
    let subs = [route_prefix()?];

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record(HEADERS)?;

    let mut written = 0;
    for row in rows {
        match product_line(row, &subs) {
            Some(line) => {
                writer.write_record(&line)?;
                written += 1;
            }
            None => log::debug!("Row {}: no product name, skipped", row.ordinal),
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;
    log::info!("CSV file exported to: {}", path.display());
    Ok(written)
}
