//! Bill of materials to a product template workbook

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::import::reader::{Cell, Row};

use super::{COST_COLUMNS, NAME_COLUMNS, first_text};

pub const SHEET_NAME: &str = "Produits - MP";

/// Leading columns, in order
mod cols {
    pub const NAME: &str = "Nom du produit";
    pub const UNIT: &str = "Unité";
    pub const PRICE: &str = "Prix";
    pub const CATEGORY: &str = "Catégorie";
}

pub const STANDARD_HEADERS: [&str; 4] = [cols::NAME, cols::UNIT, cols::PRICE, cols::CATEGORY];

const DEFAULT_UNIT: &str = "Units";
const DEFAULT_CATEGORY: &str = "Raw Materials";

/// Output columns: the standard ones, then every other source header sorted
pub fn template_headers(rows: &[&Row]) -> Vec<String> {
    let extras: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.cells().iter().map(|(header, _)| header.as_str()))
        .filter(|header| !STANDARD_HEADERS.contains(header))
        .collect();

    STANDARD_HEADERS
        .iter()
        .copied()
        .chain(extras)
        .map(str::to_string)
        .collect()
}

fn price(row: &Row) -> f64 {
    COST_COLUMNS
        .iter()
        .filter_map(|column| row.get(column))
        .find_map(|cell| match cell {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
            _ => None,
        })
        .unwrap_or(0.0)
}

fn write_cell(ws: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<()> {
    match cell {
        Cell::Empty => {}
        Cell::Text(s) => {
            ws.write_string(row, col, s)?;
        }
        Cell::Number(n) => {
            ws.write_number(row, col, *n)?;
        }
        Cell::Bool(b) => {
            ws.write_boolean(row, col, *b)?;
        }
    }
    Ok(())
}

/// Write every named row to `path`; returns the number of products written
pub fn write_template_xlsx(rows: &[&Row], path: &Path) -> Result<usize> {
    let named: Vec<(&Row, String)> = rows
        .iter()
        .filter_map(|row| first_text(row, NAME_COLUMNS).map(|name| (*row, name)))
        .collect();
    let source_rows: Vec<&Row> = named.iter().map(|(row, _)| *row).collect();
    let headers = template_headers(&source_rows);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, name) in headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, name)?;
    }

    for (row_idx, (row, name)) in named.iter().enumerate() {
        let out_row = (row_idx + 1) as u32;
        worksheet.write_string(out_row, 0, name)?;
        worksheet.write_string(out_row, 1, DEFAULT_UNIT)?;
        worksheet.write_number(out_row, 2, price(row))?;
        worksheet.write_string(out_row, 3, DEFAULT_CATEGORY)?;

        for (col, header) in headers.iter().enumerate().skip(STANDARD_HEADERS.len()) {
            if let Some(cell) = row.get(header) {
                write_cell(worksheet, out_row, col as u16, cell)?;
            }
        }
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save Excel file: {}", path.display()))?;
    Ok(named.len())
}
