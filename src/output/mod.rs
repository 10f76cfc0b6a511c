// src/output/mod.rs
//! Dataset payloads, index documents, and JSON writing.
//!
//! Every written file is pretty-printed JSON with a trailing newline so that
//! regenerated outputs diff cleanly against committed ones.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::info;

use crate::parse::Record;

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(20\d{2})").unwrap());

/// First four-digit year found in `text`, e.g. the coverage year of a period
/// label or a source filename.
pub fn extract_year(text: &str) -> Option<i32> {
    YEAR.find(text).and_then(|m| m.as_str().parse().ok())
}

/// Distinct non-null institutions across the records.
pub fn institution_count(records: &[Record]) -> usize {
    records
        .iter()
        .filter_map(|r| r.get("institution").and_then(|v| v.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

/// Serialize `payload` to `path`, creating parent directories as needed.
pub fn write_json<T: Serialize>(path: &Path, payload: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let mut bytes = serde_json::to_vec_pretty(payload)?;
    bytes.push(b'\n');
    fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ProgrammesPayload {
    pub generated_at: String,
    pub period: &'static str,
    pub record_count: usize,
    pub institution_count: usize,
    pub source_url: &'static str,
    pub source_file: String,
    pub records: Vec<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct PermitsPayload {
    pub year: i32,
    pub generated_at: String,
    /// Absent for years whose upload has since been taken down.
    pub source_url: Option<&'static str>,
    pub record_count: usize,
    pub records: Vec<Record>,
}

#[derive(Debug, Serialize)]
pub struct ProgrammeIndexEntry {
    pub category: &'static str,
    /// Path of the dataset file relative to the index.
    pub path: String,
    pub period: &'static str,
    pub record_count: usize,
    pub institution_count: usize,
    pub source_url: &'static str,
    pub source_file: String,
    pub generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ProgrammesIndex {
    pub generated_at: String,
    pub datasets: Vec<ProgrammeIndexEntry>,
}

#[derive(Debug, Serialize)]
pub struct PermitIndexEntry {
    pub year: i32,
    pub records_file: String,
    pub record_count: usize,
}

#[derive(Debug, Serialize)]
pub struct PermitsIndex {
    pub generated_at: String,
    /// Newest year first.
    pub years: Vec<PermitIndexEntry>,
}

/// Coverage year descending, then category and path for a stable order when
/// two releases cover the same year.
pub fn sort_programme_index(entries: &mut [ProgrammeIndexEntry]) {
    entries.sort_by(|a, b| {
        let ya = extract_year(a.period).unwrap_or(0);
        let yb = extract_year(b.period).unwrap_or(0);
        yb.cmp(&ya)
            .then_with(|| a.category.cmp(b.category))
            .then_with(|| a.path.cmp(&b.path))
    });
}
