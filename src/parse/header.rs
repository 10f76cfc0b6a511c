// src/parse/header.rs
//! Header-row location and column resolution.

use crate::schema::{DatasetSchema, HeaderRule};
use crate::table::RawCell;
use crate::text;

/// One header cell resolved against the dataset schema. `field` is `None`
/// for recognized-but-unmapped columns, which are carried as metadata and
/// ignored during extraction.
#[derive(Debug, Clone)]
pub struct ResolvedColumn {
    pub sheet_col: usize,
    pub raw_label: String,
    pub field: Option<&'static str>,
}

/// Scan rows top-to-bottom for the first row satisfying the marker rule.
/// Deterministic: the same grid always yields the same index.
pub fn find_header_row(rows: &[Vec<RawCell>], rule: &HeaderRule) -> Option<usize> {
    rows.iter().position(|row| match rule {
        HeaderRule::FirstCellContains(marker) => row
            .first()
            .and_then(RawCell::as_text)
            .map(|t| text::normalize_header_label(&t).contains(marker))
            .unwrap_or(false),
        HeaderRule::AnyCellStartsWith(marker) => row.iter().any(|cell| {
            cell.as_text()
                .map(|t| text::normalize_header_label(&t).starts_with(marker))
                .unwrap_or(false)
        }),
    })
}

/// Resolve each header cell to a canonical field.
///
/// Column 0 may be overridden by the schema regardless of its label. Cells
/// without a textual label are skipped (the column is dropped from
/// extraction, not an error). Everything else goes through normalized alias
/// lookup and the prefix rules.
pub fn resolve_columns(header_cells: &[RawCell], schema: &DatasetSchema) -> Vec<ResolvedColumn> {
    let mut resolved = Vec::with_capacity(header_cells.len());
    for (sheet_col, cell) in header_cells.iter().enumerate() {
        let label = match cell {
            RawCell::Text(s) => text::clean(s),
            _ => None,
        };
        if sheet_col == 0 {
            if let Some(field) = schema.first_column_field {
                resolved.push(ResolvedColumn {
                    sheet_col,
                    raw_label: label.unwrap_or_else(|| "#".to_string()),
                    field: Some(field),
                });
                continue;
            }
        }
        let Some(raw_label) = label else {
            continue;
        };
        let field = schema.resolve_label(&text::normalize_header_label(&raw_label));
        resolved.push(ResolvedColumn {
            sheet_col,
            raw_label,
            field,
        });
    }
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{permits, programmes};

    fn text(s: &str) -> RawCell {
        RawCell::Text(s.to_string())
    }

    #[test]
    fn first_cell_marker_finds_the_programmes_header() {
        let rows = vec![
            vec![text("Tabela e programeve 2023-2024")],
            vec![RawCell::Empty],
            vec![text("Institucioni i Arsimit të Lartë"), text("Nr")],
            vec![text("Universiteti i Prishtinës")],
        ];
        assert_eq!(
            find_header_row(&rows, &programmes::SCHEMA.header_rule),
            Some(2)
        );
        // repeated scans return the same index
        assert_eq!(
            find_header_row(&rows, &programmes::SCHEMA.header_rule),
            Some(2)
        );
    }

    #[test]
    fn any_cell_marker_finds_the_permits_header() {
        let rows = vec![
            vec![text("Komuna e Prishtinës")],
            vec![
                text("#"),
                text("Data e lëshimit të lejes"),
                text("Pronari"),
            ],
        ];
        assert_eq!(find_header_row(&rows, &permits::SCHEMA.header_rule), Some(1));
    }

    #[test]
    fn no_marker_means_no_header() {
        let rows = vec![vec![text("vetëm shënime")], vec![RawCell::Empty]];
        assert_eq!(find_header_row(&rows, &permits::SCHEMA.header_rule), None);
        assert_eq!(find_header_row(&rows, &programmes::SCHEMA.header_rule), None);
    }

    #[test]
    fn first_column_override_ignores_the_label() {
        let header = vec![text("#"), text("Lagjia")];
        let resolved = resolve_columns(&header, &permits::SCHEMA);
        assert_eq!(resolved[0].field, Some("permit_number"));
        assert_eq!(resolved[1].field, Some("neighbourhood"));
    }

    #[test]
    fn unlabelled_columns_are_dropped() {
        let header = vec![text("#"), RawCell::Empty, text("Lagjia"), RawCell::Number(3.0)];
        let resolved = resolve_columns(&header, &permits::SCHEMA);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[1].sheet_col, 2);
    }

    #[test]
    fn unknown_labels_stay_as_unmapped_metadata() {
        let header = vec![text("#"), text("Kolona misterioze")];
        let resolved = resolve_columns(&header, &permits::SCHEMA);
        assert_eq!(resolved[1].field, None);
        assert_eq!(resolved[1].raw_label, "Kolona misterioze");
    }

    #[test]
    fn programmes_header_resolves_without_override() {
        let header = vec![
            text("Institucioni i Arsimit të Lartë"),
            text("Nr"),
            text("Programi i studimit"),
        ];
        let resolved = resolve_columns(&header, &programmes::SCHEMA);
        assert_eq!(resolved[0].field, Some("institution"));
        assert_eq!(resolved[1].field, Some("program_number"));
        assert_eq!(resolved[2].field, Some("programme_sq"));
    }
}
