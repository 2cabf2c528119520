//! Workbook input (xlsx, xlsm, xlsb, xls, ods)

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use super::ReadError;
use super::row::{Cell, Row, header_name};

/// Rows of one worksheet below its header row
///
/// The workbook is parsed when opened; rows are converted one at a time.
pub struct SheetRows {
    headers: Vec<String>,
    range: Range<Data>,
    /// Relative index of the next row to yield
    next_row: usize,
    ordinal: usize,
}

/// First rows of a worksheet, for inspection
#[derive(Debug, Clone)]
pub struct SheetPreview {
    pub name: String,
    /// Absolute index of the first row in `rows`
    pub first_row: usize,
    pub rows: Vec<Vec<Cell>>,
}

pub(crate) fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) => Cell::from_text(s),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => Cell::Text(dt.to_string()),
        Data::DateTimeIso(s) => Cell::Text(s.clone()),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn load_range(path: &Path, sheet: Option<&str>) -> Result<Range<Data>, ReadError> {
    let open_err = |message: String| ReadError::Open {
        path: path.to_path_buf(),
        message,
    };

    let mut workbook = open_workbook_auto(path).map_err(|e| open_err(e.to_string()))?;
    let names = workbook.sheet_names();

    let sheet_name = match sheet {
        Some(wanted) => names
            .iter()
            .find(|n| n.as_str() == wanted)
            .cloned()
            .ok_or_else(|| ReadError::MissingSheet {
                path: path.to_path_buf(),
                sheet: wanted.to_string(),
            })?,
        None => names
            .first()
            .cloned()
            .ok_or_else(|| open_err("workbook has no sheets".to_string()))?,
    };

    workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| open_err(format!("sheet '{}': {}", sheet_name, e)))
}

impl SheetRows {
    pub fn open(path: &Path, sheet: Option<&str>, header_row: usize) -> Result<Self, ReadError> {
        let range = load_range(path, sheet)?;
        Self::from_range(range, header_row).ok_or_else(|| ReadError::MissingHeader {
            path: path.to_path_buf(),
            header_row,
        })
    }

    /// `header_row` is absolute; calamine ranges start at the first used cell,
    /// so a header row above the range is blank and every column gets `col_N`
    fn from_range(range: Range<Data>, header_row: usize) -> Option<Self> {
        let (start_row, start_col) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));
        let (height, width) = range.get_size();

        let relative_header = match header_row.checked_sub(start_row) {
            Some(relative) if relative < height => Some(relative),
            Some(_) => return None,
            None if height == 0 => return None,
            None => None,
        };

        let headers = (0..width)
            .map(|col| {
                let raw = relative_header
                    .and_then(|row| range.get((row, col)))
                    .map(cell_from_data)
                    .and_then(|c| c.as_text());
                header_name(raw, start_col + col)
            })
            .collect();

        let (next_row, ordinal) = match relative_header {
            Some(relative) => (relative + 1, 0),
            None => (0, start_row - header_row - 1),
        };

        Some(Self {
            headers,
            range,
            next_row,
            ordinal,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for SheetRows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        let (height, _) = self.range.get_size();
        while self.next_row < height {
            let index = self.next_row;
            self.next_row += 1;
            self.ordinal += 1;

            let cells = self
                .headers
                .iter()
                .enumerate()
                .map(|(col, header)| {
                    let cell = self
                        .range
                        .get((index, col))
                        .map_or(Cell::Empty, cell_from_data);
                    (header.clone(), cell)
                })
                .collect();

            let row = Row::new(self.ordinal, cells);
            if !row.is_empty() {
                return Some(row);
            }
        }
        None
    }
}

/// Names of all worksheets with their first `max_rows` rows
pub fn list_sheets(path: &Path, max_rows: usize) -> Result<Vec<SheetPreview>, ReadError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| ReadError::Open {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut previews = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(|e| ReadError::Open {
            path: path.to_path_buf(),
            message: format!("sheet '{}': {}", name, e),
        })?;
        let first_row = range.start().map_or(0, |(r, _)| r as usize);
        let rows = range
            .rows()
            .take(max_rows)
            .map(|r| r.iter().map(cell_from_data).collect())
            .collect();
        previews.push(SheetPreview {
            name,
            first_row,
            rows,
        });
    }
    Ok(previews)
}
