//! CSV input

use std::fs::File;
use std::path::{Path, PathBuf};

use super::ReadError;
use super::row::{Cell, Row, header_name};

/// Streaming CSV rows; records are decoded one at a time
pub struct CsvRows {
    path: PathBuf,
    headers: Vec<String>,
    records: csv::StringRecordsIntoIter<File>,
    ordinal: usize,
    failed: bool,
}

impl CsvRows {
    pub fn open(path: &Path, header_row: usize) -> Result<Self, ReadError> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|e| ReadError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        let mut records = reader.into_records();
        let mut header = None;
        for index in 0..=header_row {
            match records.next() {
                Some(Ok(record)) if index == header_row => header = Some(record),
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    return Err(ReadError::Open {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    });
                }
                None => break,
            }
        }

        let header = header.ok_or_else(|| ReadError::MissingHeader {
            path: path.to_path_buf(),
            header_row,
        })?;

        let headers = header
            .iter()
            .enumerate()
            .map(|(i, h)| header_name(Some(h.trim_start_matches('\u{feff}').to_string()), i))
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            headers,
            records,
            ordinal: 0,
            failed: false,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }
}

impl Iterator for CsvRows {
    type Item = Result<Row, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(e) => {
                    self.failed = true;
                    let line = e.position().map_or(0, |p| p.line());
                    return Some(Err(ReadError::Record {
                        path: self.path.clone(),
                        line,
                        message: e.to_string(),
                    }));
                }
            };

            let cells: Vec<(String, Cell)> = self
                .headers
                .iter()
                .enumerate()
                .map(|(i, header)| {
                    let cell = record.get(i).map_or(Cell::Empty, Cell::from_text);
                    (header.clone(), cell)
                })
                .collect();

            self.ordinal += 1;
            let row = Row::new(self.ordinal, cells);
            if row.is_empty() {
                continue;
            }
            return Some(Ok(row));
        }
    }
}
