// src/workbook/mod.rs
//! Sheet abstraction over one xlsx workbook: an untyped value grid plus a
//! hyperlink capability. Link targets live in cell metadata, not in the
//! computed value grid, so they are extracted separately from the container.

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::table::RawCell;

pub mod hyperlinks;

/// First worksheet of an input workbook. All file handles are released
/// before `open` returns; the sheet itself is plain owned data.
#[derive(Debug)]
pub struct Sheet {
    pub name: String,
    origin: (u32, u32),
    grid: Vec<Vec<RawCell>>,
    links: HashMap<(u32, u32), String>,
}

impl Sheet {
    pub fn open(path: &Path) -> Result<Sheet> {
        let mut workbook: Xlsx<_> = open_workbook(path)
            .with_context(|| format!("opening workbook {}", path.display()))?;
        let name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("workbook {} has no sheets", path.display()))?;
        let range = workbook
            .worksheet_range(&name)
            .with_context(|| format!("reading sheet `{}` of {}", name, path.display()))?;
        let origin = range.start().unwrap_or((0, 0));
        let grid: Vec<Vec<RawCell>> = range
            .rows()
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();
        let links = hyperlinks::sheet_hyperlinks(path)
            .with_context(|| format!("extracting hyperlinks from {}", path.display()))?;
        debug!(
            sheet = %name,
            rows = grid.len(),
            links = links.len(),
            "loaded worksheet"
        );
        Ok(Sheet {
            name,
            origin,
            grid,
            links,
        })
    }

    /// Assemble a sheet from already-materialized parts. Grid coordinates in
    /// `links` are absolute, like the refs stored in the worksheet XML.
    pub fn from_grid(
        name: impl Into<String>,
        origin: (u32, u32),
        grid: Vec<Vec<RawCell>>,
        links: HashMap<(u32, u32), String>,
    ) -> Sheet {
        Sheet {
            name: name.into(),
            origin,
            grid,
            links,
        }
    }

    pub fn rows(&self) -> &[Vec<RawCell>] {
        &self.grid
    }

    /// Absolute zero-based sheet row for a grid row index.
    pub fn absolute_row(&self, grid_row: usize) -> usize {
        self.origin.0 as usize + grid_row
    }

    /// Embedded link target for the cell at grid coordinates, if any.
    pub fn hyperlink(&self, grid_row: usize, grid_col: usize) -> Option<&str> {
        let key = (
            self.origin.0 + grid_row as u32,
            self.origin.1 + grid_col as u32,
        );
        self.links.get(&key).map(String::as_str)
    }

    /// Plain value of the cell at grid coordinates.
    pub fn cell(&self, grid_row: usize, grid_col: usize) -> &RawCell {
        static EMPTY: RawCell = RawCell::Empty;
        self.grid
            .get(grid_row)
            .and_then(|row| row.get(grid_col))
            .unwrap_or(&EMPTY)
    }
}

fn cell_from_data(data: &Data) -> RawCell {
    match data {
        Data::Empty | Data::Error(_) => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Int(i) => RawCell::Number(*i as f64),
        Data::Float(f) => RawCell::Number(*f),
        Data::Bool(b) => RawCell::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => RawCell::Date(naive),
            None => RawCell::Empty,
        },
        Data::DateTimeIso(s) => match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
            Ok(naive) => RawCell::Date(naive),
            Err(_) => RawCell::Text(s.clone()),
        },
        Data::DurationIso(s) => RawCell::Text(s.clone()),
    }
}
