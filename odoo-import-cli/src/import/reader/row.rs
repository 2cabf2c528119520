//! Raw spreadsheet rows

/// Raw cell value as read from the source file
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl Cell {
    /// Build a cell from text, treating whitespace-only text as empty
    pub fn from_text(text: &str) -> Self {
        if text.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(text.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Trimmed text form; `None` for empty cells
    ///
    /// Whole numbers print without a fractional part (`3.0` becomes `"3"`).
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
            Cell::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.as_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

/// One data row: ordered `(header, cell)` pairs
///
/// Headers may repeat; [`Row::get`] returns the first match and
/// [`Row::get_all`] every match in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// 1-based position among data rows, used in log lines
    pub ordinal: usize,
    cells: Vec<(String, Cell)>,
}

impl Row {
    pub fn new(ordinal: usize, cells: Vec<(String, Cell)>) -> Self {
        Self { ordinal, cells }
    }

    /// Build a row from `(header, text)` pairs
    pub fn from_pairs(ordinal: usize, pairs: &[(&str, &str)]) -> Self {
        Self::new(
            ordinal,
            pairs
                .iter()
                .map(|(h, v)| (h.to_string(), Cell::from_text(v)))
                .collect(),
        )
    }

    pub fn get(&self, column: &str) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|(header, _)| header == column)
            .map(|(_, cell)| cell)
    }

    pub fn get_all<'a>(&'a self, column: &'a str) -> impl Iterator<Item = &'a Cell> + 'a {
        self.cells
            .iter()
            .filter(move |(header, _)| header == column)
            .map(|(_, cell)| cell)
    }

    /// Trimmed text of the first cell under `column`, `None` when missing or blank
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(|c| c.as_text())
    }

    /// True when the column is missing or blank
    pub fn is_blank(&self, column: &str) -> bool {
        self.get(column).is_none_or(|c| c.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|(_, c)| c.is_empty())
    }

    pub fn cells(&self) -> &[(String, Cell)] {
        &self.cells
    }
}

/// Name for a header cell, falling back to `col_<index>` when blank
pub fn header_name(raw: Option<String>, index: usize) -> String {
    match raw {
        Some(text) if !text.trim().is_empty() => text.trim().to_string(),
        _ => format!("col_{}", index),
    }
}
