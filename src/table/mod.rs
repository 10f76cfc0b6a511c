// src/table/mod.rs
//! Explicit in-memory table: ordered named columns over rows of untyped
//! cells, with the small relational subset the extraction pipeline needs
//! (rename, drop rows, forward-fill).

use chrono::{NaiveDateTime, NaiveTime};

static EMPTY_CELL: RawCell = RawCell::Empty;

/// An untyped value as read from a spreadsheet cell. Ephemeral; exists only
/// during parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl RawCell {
    pub fn is_empty(&self) -> bool {
        matches!(self, RawCell::Empty)
    }

    /// Display text for text-typed fields. Whole numbers render without a
    /// fractional part, matching how the source sheets show them.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(s) => Some(s.clone()),
            RawCell::Number(n) => Some(format_number(*n)),
            RawCell::Bool(b) => Some(b.to_string()),
            RawCell::Date(dt) => Some(if dt.time() == NaiveTime::MIN {
                dt.date().format("%Y-%m-%d").to_string()
            } else {
                dt.format("%Y-%m-%d %H:%M:%S").to_string()
            }),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Ordered named columns, each an ordered sequence of cells. Every row keeps
/// its original sheet row index so cell metadata (hyperlink targets) stays
/// addressable after rows are dropped.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<RawCell>>,
    source_rows: Vec<usize>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
            source_rows: Vec::new(),
        }
    }

    /// Append a row, padding or truncating to the column count.
    pub fn push_row(&mut self, source_row: usize, mut cells: Vec<RawCell>) {
        cells.resize(self.columns.len(), RawCell::Empty);
        self.rows.push(cells);
        self.source_rows.push(source_row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn rename_column(&mut self, index: usize, name: &str) {
        if let Some(column) = self.columns.get_mut(index) {
            *column = name.to_string();
        }
    }

    /// Original sheet row index for a table row.
    pub fn source_row(&self, row: usize) -> usize {
        self.source_rows[row]
    }

    /// Cell at (row, column name); `Empty` when the column does not exist.
    pub fn cell(&self, row: usize, column: &str) -> &RawCell {
        match self.column_index(column) {
            Some(idx) => self.rows.get(row).and_then(|r| r.get(idx)).unwrap_or(&EMPTY_CELL),
            None => &EMPTY_CELL,
        }
    }

    /// Propagate the last non-empty value in `column` downward into empty
    /// cells beneath it (merged-cell-style values spanning several rows).
    pub fn forward_fill(&mut self, column: &str) {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        let mut last: Option<RawCell> = None;
        for row in &mut self.rows {
            if row[idx].is_empty() {
                if let Some(value) = &last {
                    row[idx] = value.clone();
                }
            } else {
                last = Some(row[idx].clone());
            }
        }
    }

    /// Remove rows that are empty across every column.
    pub fn drop_blank_rows(&mut self) {
        let keep: Vec<bool> = self
            .rows
            .iter()
            .map(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();
        self.retain_rows(&keep);
    }

    /// Remove rows whose cell in `column` is empty.
    pub fn drop_rows_where_null(&mut self, column: &str) {
        let Some(idx) = self.column_index(column) else {
            return;
        };
        let keep: Vec<bool> = self.rows.iter().map(|row| !row[idx].is_empty()).collect();
        self.retain_rows(&keep);
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        let mut i = 0;
        self.rows.retain(|_| {
            let k = keep[i];
            i += 1;
            k
        });
        let mut j = 0;
        self.source_rows.retain(|_| {
            let k = keep[j];
            j += 1;
            k
        });
    }
}
