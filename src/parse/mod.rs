// src/parse/mod.rs
//! Workbook parser: orchestrates header resolution and record assembly over
//! every data row of one input file.
//!
//! Failure policy is two-tier. Cell-level coercion failures always become
//! null locally and are never raised. Structural failures (no header row, a
//! required column unresolvable) abort the file with a typed error and are
//! never retried; the caller decides whether remaining files continue.

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::schema::DatasetSchema;
use crate::table::{RawCell, Table};
use crate::text;
use crate::workbook::Sheet;

pub mod header;
pub mod record;

pub use header::{find_header_row, resolve_columns, ResolvedColumn};
pub use record::{build_record, Record, RowContext, Value};

use crate::schema::IdentityRule;

/// A failure that makes the whole file unparseable, as opposed to a per-cell
/// coercion fallback.
#[derive(Debug, Error)]
pub enum StructuralError {
    #[error("unable to locate the header row in {file}")]
    HeaderNotFound { file: String },
    #[error("unable to resolve a column for `{field}` in {file}")]
    MissingColumn { file: String, field: &'static str },
}

/// One workbook's extraction outcome. Immutable once returned.
#[derive(Debug)]
pub struct ParseResult {
    /// Source year or period tag, supplied by the caller.
    pub source: String,
    pub sheet_name: String,
    /// 1-based sheet row of the detected header, as a spreadsheet UI shows it.
    pub header_row: usize,
    /// Raw labels of the columns considered for extraction, in sheet order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

/// Open one workbook and extract its records.
#[tracing::instrument(level = "info", skip(schema, source_tag), fields(path = %path.display()))]
pub fn parse_workbook(path: &Path, schema: &DatasetSchema, source_tag: &str) -> Result<ParseResult> {
    let sheet = Sheet::open(path)?;
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_sheet(&sheet, schema, &file, source_tag)
}

/// Extract records from an already-loaded sheet.
pub fn parse_sheet(
    sheet: &Sheet,
    schema: &DatasetSchema,
    file: &str,
    source_tag: &str,
) -> Result<ParseResult> {
    let rows = sheet.rows();
    let header_idx = find_header_row(rows, &schema.header_rule).ok_or(
        StructuralError::HeaderNotFound {
            file: file.to_string(),
        },
    )?;
    let resolved = resolve_columns(&rows[header_idx], schema);

    // Active column set: when two raw labels map to the same field, the
    // later column silently wins. Tolerated ambiguity, not validated.
    let mut winners: HashMap<&'static str, usize> = HashMap::new();
    for (position, column) in resolved.iter().enumerate() {
        if let Some(field) = column.field {
            winners.insert(field, position);
        }
    }

    let link_columns: Vec<(&'static str, usize)> = schema
        .link_rules
        .iter()
        .filter_map(|(field, matcher)| {
            resolved
                .iter()
                .find(|c| matcher.matches(&text::normalize_header_label(&c.raw_label)))
                .map(|c| (*field, c.sheet_col))
        })
        .collect();

    let mut table = Table::new(resolved.iter().map(|c| c.raw_label.clone()).collect());
    for (grid_row, row) in rows.iter().enumerate().skip(header_idx + 1) {
        let cells = resolved
            .iter()
            .map(|c| row.get(c.sheet_col).cloned().unwrap_or(RawCell::Empty))
            .collect();
        table.push_row(grid_row, cells);
    }
    for (field, position) in &winners {
        table.rename_column(*position, field);
    }

    for field in schema.required {
        if !table.has_column(field) {
            return Err(StructuralError::MissingColumn {
                file: file.to_string(),
                field,
            }
            .into());
        }
    }

    table.drop_blank_rows();
    for field in schema.forward_fill {
        table.forward_fill(field);
    }
    for field in schema.drop_if_null {
        table.drop_rows_where_null(field);
    }

    let ctx = RowContext {
        sheet,
        link_columns: &link_columns,
        fallback_column_present: schema
            .comment_fallback
            .as_ref()
            .map(|f| winners.contains_key(f.target))
            .unwrap_or(false),
    };

    let mut records = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let record = build_record(&table, row, schema, &ctx);
        if identity_ok(&record, &schema.identity) {
            records.push(record);
        }
    }

    info!(
        dataset = schema.name,
        file,
        records = records.len(),
        "extracted records"
    );

    Ok(ParseResult {
        source: source_tag.to_string(),
        sheet_name: sheet.name.clone(),
        header_row: sheet.absolute_row(header_idx) + 1,
        columns: resolved.into_iter().map(|c| c.raw_label).collect(),
        records,
    })
}

fn identity_ok(record: &Record, rule: &IdentityRule) -> bool {
    match rule {
        IdentityRule::NonBlank(field) => record.get(field).is_some_and(|v| !v.is_null()),
        IdentityRule::AnyNonBlank(fields) => fields
            .iter()
            .any(|field| record.get(field).is_some_and(|v| !v.is_null())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{permits, programmes};
    use std::collections::HashMap;

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    fn programmes_sheet() -> Sheet {
        let grid = vec![
            vec![text("Programet e Akredituara 2023-2024")],
            vec![RawCell::Empty],
            vec![
                text("Institucioni i Arsimit të Lartë"),
                text("Nr"),
                text("Programi i studimit"),
                text("Study program"),
                text("Kampusi"),
                text("Niveli"),
                text("ECTS"),
                text("Kuota"),
                text("I akredituar deri më"),
            ],
            vec![
                text("Universiteti i Prishtinës"),
                RawCell::Number(1.0),
                text("Matematika"),
                text("Mathematics"),
                text("Prishtinë"),
                text("BA"),
                RawCell::Number(180.0),
                RawCell::Number(60.0),
                text("30/09/2026"),
            ],
            // institution blank: forward-filled from the row above
            vec![
                RawCell::Empty,
                RawCell::Number(2.0),
                text("Fizika"),
                RawCell::Empty,
                text("Prishtinë"),
                text("MA"),
                RawCell::Number(120.0),
                text("jo"),
                text("30/09/2025"),
            ],
            // both programme names blank: dropped
            vec![
                RawCell::Empty,
                RawCell::Number(3.0),
                RawCell::Empty,
                RawCell::Empty,
                text("Prishtinë"),
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
            ],
            // fully blank row: not counted
            vec![RawCell::Empty; 9],
        ];
        Sheet::from_grid("Tabela 1", (0, 0), grid, HashMap::new())
    }

    #[test]
    fn programmes_sheet_extracts_ordered_complete_records() -> Result<()> {
        let result = parse_sheet(
            &programmes_sheet(),
            &programmes::SCHEMA,
            "programmes.xlsx",
            "2023-2024",
        )?;

        assert_eq!(result.header_row, 3);
        assert_eq!(result.records.len(), 2);

        let first = &result.records[0];
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec![
                "institution",
                "program_number",
                "programme_sq",
                "programme_en",
                "campus",
                "level",
                "ects",
                "quota",
                "accredited_until"
            ]
        );
        assert_eq!(
            first.get("institution").unwrap().as_str(),
            Some("Universiteti i Prishtinës")
        );
        assert_eq!(first.get("ects"), Some(&Value::Int(180)));
        assert_eq!(
            first.get("accredited_until").unwrap().as_str(),
            Some("2026-09-30")
        );

        let second = &result.records[1];
        // forward-filled institution
        assert_eq!(
            second.get("institution").unwrap().as_str(),
            Some("Universiteti i Prishtinës")
        );
        // missing English name is null, not a dropped record
        assert_eq!(second.get("programme_en"), Some(&Value::Null));
        // non-numeric quota swallowed as null
        assert_eq!(second.get("quota"), Some(&Value::Null));
        Ok(())
    }

    #[test]
    fn missing_required_column_is_a_typed_structural_error() {
        let grid = vec![vec![
            text("Institucioni i Arsimit të Lartë"),
            text("Programi i studimit"),
        ]];
        let sheet = Sheet::from_grid("Tabela 1", (0, 0), grid, HashMap::new());
        let err = parse_sheet(&sheet, &programmes::SCHEMA, "broken.xlsx", "2023-2024")
            .unwrap_err();
        match err.downcast_ref::<StructuralError>() {
            Some(StructuralError::MissingColumn { field, .. }) => {
                assert_eq!(*field, "program_number");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn header_not_found_is_fatal_for_the_file() {
        let sheet = Sheet::from_grid(
            "Tabela 1",
            (0, 0),
            vec![vec![text("asgjë e dobishme")]],
            HashMap::new(),
        );
        let err = parse_sheet(&sheet, &permits::SCHEMA, "empty.xlsx", "2020").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StructuralError>(),
            Some(StructuralError::HeaderNotFound { .. })
        ));
    }

    fn permits_sheet() -> Sheet {
        // destination column absent: the comment column feeds the fallback
        let grid = vec![
            vec![text("Lista e lejeve të lëshuara")],
            vec![
                text("#"),
                text("Data e lëshimit të lejes"),
                text("Lagjia"),
                text("Sipërfaqja totale ndërtimore m²"),
                text("Pagesa totale e lejes së lëshuar"),
                text("Koment"),
                text("Dokumenti në PDF i lejës së lëshuar"),
            ],
            vec![
                RawCell::Number(1.0),
                text("05/03/2024"),
                text("dardania — e re"),
                text("1.234,50"),
                text("2 500,00 €"),
                text("shtepi banimi"),
                text("Leja 07-351/123"),
            ],
            // blank permit number: dropped
            vec![
                RawCell::Empty,
                text("06/03/2024"),
                text("Ulpiana"),
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
            ],
            vec![
                RawCell::Number(2.0),
                text("07/03/2024"),
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
                RawCell::Empty,
                text("https://example.org/fallback.pdf"),
            ],
        ];
        let mut links = HashMap::new();
        // permit 1's document column carries an embedded link (row 2, col 6)
        links.insert((2, 6), "https://example.org/leja-123.pdf".to_string());
        Sheet::from_grid("Lista", (0, 0), grid, links)
    }

    #[test]
    fn permits_sheet_coerces_links_fees_and_fallbacks() -> Result<()> {
        let result = parse_sheet(&permits_sheet(), &permits::SCHEMA, "permits-2024.xlsx", "2024")?;

        assert_eq!(result.records.len(), 2);
        let first = &result.records[0];
        assert_eq!(first.len(), 16);
        assert_eq!(first.get("permit_number").unwrap().as_str(), Some("1"));
        assert_eq!(
            first.get("issuance_date").unwrap().as_str(),
            Some("2024-03-05")
        );
        assert_eq!(
            first.get("neighbourhood").unwrap().as_str(),
            Some("Dardania - e Re")
        );
        assert_eq!(
            first.get("total_floor_area_m2"),
            Some(&Value::Float(1234.5))
        );
        assert_eq!(first.get("total_fee_eur"), Some(&Value::Float(2500.0)));
        // destination derived from the comment column
        assert_eq!(
            first.get("destination").unwrap().as_str(),
            Some("Shtepi Banimi")
        );
        assert_eq!(
            first.get("document_url").unwrap().as_str(),
            Some("https://example.org/leja-123.pdf")
        );

        // plain text URL in the link column is used when no embedded link
        let second = &result.records[1];
        assert_eq!(
            second.get("document_url").unwrap().as_str(),
            Some("https://example.org/fallback.pdf")
        );
        assert_eq!(second.get("destination"), Some(&Value::Null));
        Ok(())
    }

    #[test]
    fn duplicate_alias_lets_the_later_column_win() -> Result<()> {
        let grid = vec![
            vec![
                text("#"),
                text("Data e lëshimit të lejes"),
                text("Lagjia"),
                text("Lagja"),
            ],
            vec![
                RawCell::Number(1.0),
                text("01/02/2024"),
                text("e vjetra"),
                text("e reja"),
            ],
        ];
        let sheet = Sheet::from_grid("Lista", (0, 0), grid, HashMap::new());
        let result = parse_sheet(&sheet, &permits::SCHEMA, "permits.xlsx", "2024")?;
        assert_eq!(
            result.records[0].get("neighbourhood").unwrap().as_str(),
            Some("E Reja")
        );
        Ok(())
    }
}
