//! Spreadsheet reader
//!
//! Opens a workbook (xlsx, xlsm, xls, ods) or a CSV file, takes the header
//! row at a configurable offset and yields the data rows below it lazily.
//! Entirely empty rows are skipped. The sequence can be consumed once.

mod csv_rows;
mod row;
mod sheet_rows;

use std::path::{Path, PathBuf};

pub use csv_rows::CsvRows;
pub use row::{Cell, Row, header_name};
pub use sheet_rows::{SheetPreview, SheetRows, list_sheets};

/// Fatal failure to open or parse the input file
#[derive(Debug)]
pub enum ReadError {
    /// File could not be opened or decoded
    Open { path: PathBuf, message: String },
    /// Requested worksheet does not exist
    MissingSheet { path: PathBuf, sheet: String },
    /// File has fewer rows than the header offset requires
    MissingHeader { path: PathBuf, header_row: usize },
    /// A record after the header could not be decoded
    Record { path: PathBuf, line: u64, message: String },
}

impl std::fmt::Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Open { path, message } => {
                write!(f, "could not read {}: {}", path.display(), message)
            }
            ReadError::MissingSheet { path, sheet } => {
                write!(f, "sheet '{}' not found in {}", sheet, path.display())
            }
            ReadError::MissingHeader { path, header_row } => write!(
                f,
                "{} has no header at row index {}",
                path.display(),
                header_row
            ),
            ReadError::Record {
                path,
                line,
                message,
            } => write!(f, "{} line {}: {}", path.display(), line, message),
        }
    }
}

impl std::error::Error for ReadError {}

/// Lazily produced data rows of one sheet or CSV file
pub enum RowSource {
    Csv(CsvRows),
    Sheet(SheetRows),
}

impl RowSource {
    /// Column names from the header row
    pub fn headers(&self) -> &[String] {
        match self {
            RowSource::Csv(rows) => rows.headers(),
            RowSource::Sheet(rows) => rows.headers(),
        }
    }
}

impl Iterator for RowSource {
    type Item = Result<Row, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            RowSource::Csv(rows) => rows.next(),
            RowSource::Sheet(rows) => rows.next().map(Ok),
        }
    }
}

/// Open `path` and position after the header row at index `header_row`
///
/// `sheet` selects a worksheet by name and is ignored for CSV input; when
/// omitted the first worksheet is used.
pub fn open_rows(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<RowSource, ReadError> {
    if is_csv(path) {
        CsvRows::open(path, header_row).map(RowSource::Csv)
    } else {
        SheetRows::open(path, sheet, header_row).map(RowSource::Sheet)
    }
}

pub fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
}
